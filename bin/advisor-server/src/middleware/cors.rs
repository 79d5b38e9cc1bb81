use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::Config;

const X_CLIENT_INFO: HeaderName = HeaderName::from_static("x-client-info");
const APIKEY: HeaderName = HeaderName::from_static("apikey");

/// Headers the browser SDK attaches to every function call.
const SDK_HEADERS: [HeaderName; 4] = [
    HeaderName::from_static("x-supabase-client-platform"),
    HeaderName::from_static("x-supabase-client-platform-version"),
    HeaderName::from_static("x-supabase-client-runtime"),
    HeaderName::from_static("x-supabase-client-runtime-version"),
];

/// Chat is called from any origin.
pub fn chat_cors() -> CorsLayer {
    let mut headers = vec![header::AUTHORIZATION, X_CLIENT_INFO, APIKEY, header::CONTENT_TYPE];
    headers.extend(SDK_HEADERS);

    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(headers)
        .allow_methods([Method::POST, Method::OPTIONS])
}

/// Inquiries are only accepted from the site's own origins.
///
/// A request from any other origin gets no `Access-Control-Allow-Origin`
/// header at all. `Vary: Origin` is always set.
pub fn inquiry_cors(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .inquiry_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%origin, error = %e, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([header::AUTHORIZATION, X_CLIENT_INFO, APIKEY, header::CONTENT_TYPE])
        .allow_methods([Method::POST, Method::OPTIONS])
}
