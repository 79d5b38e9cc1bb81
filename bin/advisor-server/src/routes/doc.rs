use utoipa::OpenApi;

use crate::routes::{chat, health, inquiry, redirect};

#[derive(OpenApi)]
#[openapi(info(
    title = "advisor-server",
    description = "Chat relay and inquiry mailer for the advisory site",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(chat::ChatApi::openapi());
    root.merge(inquiry::InquiryApi::openapi());
    root.merge(health::HealthApi::openapi());
    root.merge(redirect::RedirectApi::openapi());
    root
}
