//! HTTP middleware stack.
//!
//! - [`cors`]: per-function CORS policies.
//! - [`trace`]: per-request span carrying an `x-trace-id`.

pub mod cors;
pub mod trace;
