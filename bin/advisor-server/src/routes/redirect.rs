//! `/out` external link redirect.
//!
//! Only destinations in [`DESTINATIONS`] are reachable; the query value is a
//! lookup key and never ends up in the `Location` header.

use std::sync::Arc;

use axum::Router;
use axum::extract::Query;
use axum::response::Redirect;
use axum::routing::get;
use serde::Deserialize;
use tracing::debug;
use utoipa::{IntoParams, OpenApi};

use crate::state::AppState;

const DESTINATIONS: &[(&str, &str)] = &[(
    "linkedin",
    "https://www.linkedin.com/in/larry-salinas-mba-56394934",
)];

#[derive(OpenApi)]
#[openapi(paths(out))]
pub struct RedirectApi;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OutQuery {
    /// Destination key, e.g. `linkedin`.
    to: Option<String>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/out", get(out))
}

#[utoipa::path(
    get,
    path = "/out",
    tag = "redirect",
    params(OutQuery),
    responses(
        (status = 307, description = "Redirect to the allowlisted destination, or to `/`"),
    )
)]
pub async fn out(Query(query): Query<OutQuery>) -> Redirect {
    match query.to.as_deref().and_then(destination) {
        Some(url) => Redirect::temporary(url),
        None => {
            debug!(to = ?query.to, "unknown redirect target");
            Redirect::temporary("/")
        }
    }
}

fn destination(key: &str) -> Option<&'static str> {
    DESTINATIONS.iter().find(|(k, _)| *k == key).map(|(_, url)| *url)
}
