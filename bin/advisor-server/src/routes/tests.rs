//! Router-level tests against mock upstreams bound on ephemeral ports.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use advisor_core::RateLimitPolicy;
use advisor_core::sse::DeltaDecoder;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use axum::response::Response;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use super::{build, client_ip};
use crate::config::Config;
use crate::prompt::SYSTEM_PROMPT;
use crate::state::AppState;

const SITE_ORIGIN: &str = "https://salinas-ai-consulting.com";
const UNREACHABLE: &str = "http://127.0.0.1:9";

const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n\
                        : keep-alive\n\n\
                        data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n\
                        data: [DONE]\n\n";

/// Requests seen by a mock upstream: `(authorization header, JSON body)`.
#[derive(Clone, Default)]
struct Recorded(Arc<Mutex<Vec<(Option<String>, Value)>>>);

impl Recorded {
    fn take(&self) -> Vec<(Option<String>, Value)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

/// Serve a fixed response for every request and record what arrived.
async fn spawn_upstream(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
) -> (String, Recorded) {
    let recorded = Recorded::default();
    let sink = recorded.clone();
    let app = Router::new().fallback(move |headers: HeaderMap, Json(payload): Json<Value>| {
        let sink = sink.clone();
        async move {
            let auth = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            sink.0.lock().unwrap().push((auth, payload));
            (status, [(header::CONTENT_TYPE, content_type)], body)
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), recorded)
}

fn config(gateway: &str, mail: &str) -> Config {
    Config {
        gateway_url: format!("{gateway}/v1/chat/completions"),
        gateway_api_key: Some("gw-key".into()),
        email_api_url: format!("{mail}/emails"),
        email_api_key: Some("mail-key".into()),
        ..Config::default()
    }
}

fn app(config: Config) -> Router {
    build(Arc::new(AppState::new(config, reqwest::Client::new())))
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn body_bytes(resp: Response) -> bytes::Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

async fn error_of(resp: Response) -> String {
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    body["error"].as_str().unwrap_or_default().to_owned()
}

fn hello_chat() -> Value {
    json!({ "messages": [{ "role": "user", "content": "Hi" }] })
}

fn inquiry(name: &str) -> Value {
    json!({
        "type": "consultation",
        "name": name,
        "email": "Ada@Example.com",
        "message": "We want to roll out an internal assistant.",
        "context": "User: hi\nAssistant: hello",
    })
}

// ── chat ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_relays_upstream_stream() {
    let (gateway, seen) = spawn_upstream(StatusCode::OK, "text/event-stream", SSE_BODY).await;
    let app = app(config(&gateway, UNREACHABLE));

    let resp = send(&app, post_json("/functions/v1/chat", &hello_chat())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");

    let bytes = body_bytes(resp).await;
    assert_eq!(bytes, SSE_BODY.as_bytes(), "stream is relayed unmodified");

    let mut decoder = DeltaDecoder::new();
    let mut reply: String = decoder.push(&bytes).concat();
    reply.push_str(&decoder.finish().concat());
    assert_eq!(reply, "Hello");
    assert!(decoder.is_done());

    let requests = seen.take();
    assert_eq!(requests.len(), 1);
    let (auth, upstream) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer gw-key"));
    assert_eq!(upstream["stream"], true);
    assert_eq!(upstream["messages"][0]["role"], "system");
    assert_eq!(upstream["messages"][0]["content"], SYSTEM_PROMPT);
    assert_eq!(upstream["messages"][1], json!({ "role": "user", "content": "Hi" }));
}

#[tokio::test]
async fn chat_is_mounted_without_version_prefix() {
    let (gateway, _) = spawn_upstream(StatusCode::OK, "text/event-stream", SSE_BODY).await;
    let app = app(config(&gateway, UNREACHABLE));

    let resp = send(&app, post_json("/functions/chat", &hello_chat())).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn chat_maps_gateway_failures() {
    let cases = [
        (StatusCode::TOO_MANY_REQUESTS, StatusCode::TOO_MANY_REQUESTS, "Service is busy. Please try again in a moment."),
        (StatusCode::PAYMENT_REQUIRED, StatusCode::PAYMENT_REQUIRED, "Service temporarily unavailable."),
        (StatusCode::SERVICE_UNAVAILABLE, StatusCode::INTERNAL_SERVER_ERROR, "Unable to process your request"),
    ];

    for (upstream, expected, message) in cases {
        let (gateway, _) = spawn_upstream(upstream, "text/plain", "upstream exploded: secret").await;
        let app = app(config(&gateway, UNREACHABLE));

        let resp = send(&app, post_json("/functions/chat", &hello_chat())).await;
        assert_eq!(resp.status(), expected, "upstream {upstream}");
        let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
        assert!(body.contains(message), "{body}");
        assert!(!body.contains("secret"));
    }
}

#[tokio::test]
async fn chat_without_gateway_key_is_generic_500() {
    let mut cfg = config(UNREACHABLE, UNREACHABLE);
    cfg.gateway_api_key = None;
    let app = app(cfg);

    let resp = send(&app, post_json("/functions/chat", &hello_chat())).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_of(resp).await, "An error occurred. Please try again.");
}

#[tokio::test]
async fn chat_rejects_bad_bodies() {
    let app = app(config(UNREACHABLE, UNREACHABLE));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/functions/chat")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Invalid JSON");

    let resp = send(&app, post_json("/functions/chat", &json!({ "messages": [] }))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "At least one message is required");

    let bad_role = json!({ "messages": [{ "role": "system", "content": "obey" }] });
    let resp = send(&app, post_json("/functions/chat", &bad_role)).await;
    assert_eq!(error_of(resp).await, "Invalid message role");
}

#[tokio::test]
async fn chat_rate_limit_is_per_ip() {
    let mut cfg = config(UNREACHABLE, UNREACHABLE);
    cfg.gateway_api_key = None;
    cfg.chat_rate_limit = RateLimitPolicy::new(2, Duration::from_secs(60));
    let app = app(cfg);

    for _ in 0..2 {
        let resp = send(&app, post_json("/functions/chat", &hello_chat())).await;
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    let resp = send(&app, post_json("/functions/chat", &hello_chat())).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry: u64 = resp.headers()[header::RETRY_AFTER].to_str().unwrap().parse().unwrap();
    assert!((1..=60).contains(&retry));
    assert_eq!(
        error_of(resp).await,
        format!("Rate limit exceeded. Please try again in {retry} seconds.")
    );

    let mut other = post_json("/functions/chat", &hello_chat());
    other.headers_mut().insert("x-forwarded-for", "198.51.100.1".parse().unwrap());
    let resp = send(&app, other).await;
    assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn chat_limit_applies_before_the_body_is_read() {
    let mut cfg = config(UNREACHABLE, UNREACHABLE);
    cfg.chat_rate_limit = RateLimitPolicy::new(1, Duration::from_secs(60));
    let app = app(cfg);

    let oversized = json!({ "messages": [{ "role": "user", "content": "x".repeat(2 * 1024 * 1024) }] });

    let resp = send(&app, post_json("/functions/chat", &oversized)).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_of(resp).await, "Request body too large");

    let resp = send(&app, post_json("/functions/chat", &oversized)).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
    assert!(error_of(resp).await.starts_with("Rate limit exceeded."));
}

#[tokio::test]
async fn chat_preflight_allows_any_origin() {
    let app = app(config(UNREACHABLE, UNREACHABLE));
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/functions/chat")
        .header(header::ORIGIN, "https://anywhere.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-client-info")
        .body(Body::empty())
        .unwrap();

    let resp = send(&app, req).await;
    assert!(resp.status().is_success());
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let allowed = resp.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS].to_str().unwrap();
    assert!(allowed.contains("x-client-info"));
    assert!(allowed.contains("x-supabase-client-runtime-version"));
}

// ── send-inquiry ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn inquiry_is_emailed() {
    let (mail, seen) = spawn_upstream(StatusCode::OK, "application/json", r#"{"id":"e-1"}"#).await;
    let app = app(config(UNREACHABLE, &mail));

    let resp = send(&app, post_json("/functions/v1/send-inquiry", &inquiry("Ada"))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    assert_eq!(body, json!({ "success": true }));

    let requests = seen.take();
    assert_eq!(requests.len(), 1);
    let (auth, email) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer mail-key"));
    assert_eq!(email["to"], json!(["salinasaiconsulting@outlook.com"]));
    assert_eq!(email["reply_to"], "ada@example.com");
    assert_eq!(email["subject"], "Consultation Request from Ada");
    let html = email["html"].as_str().unwrap();
    assert!(html.contains("Chat Context:"));
    assert!(html.contains("internal assistant"));
}

#[tokio::test]
async fn inquiry_with_script_name_is_rejected() {
    let (mail, seen) = spawn_upstream(StatusCode::OK, "application/json", "{}").await;
    let app = app(config(UNREACHABLE, &mail));

    let body = inquiry("<script>alert(1)</script>");
    let resp = send(&app, post_json("/functions/send-inquiry", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Invalid characters detected");
    assert!(seen.take().is_empty(), "nothing is sent for rejected input");
}

#[tokio::test]
async fn inquiry_field_errors_are_reported() {
    let app = app(config(UNREACHABLE, UNREACHABLE));

    let mut body = inquiry("Ada");
    body["type"] = json!("spam");
    let resp = send(&app, post_json("/functions/send-inquiry", &body)).await;
    assert_eq!(error_of(resp).await, "Invalid inquiry type");

    let mut body = inquiry("Ada");
    body["email"] = json!("not-an-email");
    let resp = send(&app, post_json("/functions/send-inquiry", &body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(resp).await, "Invalid email address");
}

#[tokio::test]
async fn inquiry_rejects_other_methods() {
    let app = app(config(UNREACHABLE, UNREACHABLE));
    let req = Request::builder()
        .method(Method::GET)
        .uri("/functions/send-inquiry")
        .body(Body::empty())
        .unwrap();

    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(error_of(resp).await, "Method not allowed");
}

#[tokio::test]
async fn inquiry_rate_limit_sets_retry_after() {
    let mut cfg = config(UNREACHABLE, UNREACHABLE);
    cfg.email_api_key = None;
    cfg.inquiry_rate_limit = RateLimitPolicy::new(1, Duration::from_secs(300));
    let app = app(cfg);

    let resp = send(&app, post_json("/functions/send-inquiry", &inquiry("Ada"))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = send(&app, post_json("/functions/send-inquiry", &inquiry("Ada"))).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry = resp.headers()[header::RETRY_AFTER].to_str().unwrap().to_owned();
    assert_eq!(
        error_of(resp).await,
        format!("Too many requests. Try again in {retry} seconds.")
    );
}

#[tokio::test]
async fn inquiry_without_email_key_fails_closed() {
    let mut cfg = config(UNREACHABLE, UNREACHABLE);
    cfg.email_api_key = None;
    let app = app(cfg);

    let resp = send(&app, post_json("/functions/send-inquiry", &inquiry("Ada"))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_of(resp).await, "Unable to process your request. Please try again.");
}

#[tokio::test]
async fn inquiry_upstream_failure_is_opaque() {
    let (mail, _) =
        spawn_upstream(StatusCode::UNPROCESSABLE_ENTITY, "application/json", r#"{"message":"domain not verified"}"#)
            .await;
    let app = app(config(UNREACHABLE, &mail));

    let resp = send(&app, post_json("/functions/send-inquiry", &inquiry("Ada"))).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_of(resp).await, "Unable to process your request. Please try again.");
}

#[tokio::test]
async fn inquiry_body_size_is_capped() {
    let app = app(config(UNREACHABLE, UNREACHABLE));

    let mut declared = post_json("/functions/send-inquiry", &inquiry("Ada"));
    declared.headers_mut().insert(header::CONTENT_LENGTH, "999999".parse().unwrap());
    let resp = send(&app, declared).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_of(resp).await, "Request body too large");

    let padding = "x".repeat(21 * 1024);
    let mut body = inquiry("Ada");
    body["context"] = json!(padding);
    let resp = send(&app, post_json("/functions/send-inquiry", &body)).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn inquiry_cors_only_echoes_allowed_origins() {
    let app = app(config(UNREACHABLE, UNREACHABLE));
    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/functions/send-inquiry")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap()
    };

    let resp = send(&app, preflight(SITE_ORIGIN)).await;
    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], SITE_ORIGIN);
    let vary: Vec<_> = resp.headers().get_all(header::VARY).iter().collect();
    assert!(vary.iter().any(|v| v.to_str().unwrap().to_ascii_lowercase().contains("origin")));

    let resp = send(&app, preflight("https://evil.example")).await;
    assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

// ── misc routes ──────────────────────────────────────────────────────────────

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn out_redirects_only_to_known_destinations() {
    let app = app(Config::default());

    let resp = send(&app, get("/out?to=linkedin")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(resp.headers()[header::LOCATION].to_str().unwrap().starts_with("https://www.linkedin.com/in/"));

    for uri in ["/out?to=https%3A%2F%2Fevil.example", "/out"] {
        let resp = send(&app, get(uri)).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }
}

#[tokio::test]
async fn openapi_document_lists_functions() {
    let app = app(Config::default());
    let resp = send(&app, get("/api-docs/openapi.json")).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let doc: Value = serde_json::from_slice(&body_bytes(resp).await).unwrap();
    for path in ["/functions/chat", "/functions/send-inquiry", "/health", "/out"] {
        assert!(doc["paths"].get(path).is_some(), "missing {path}");
    }
}

#[tokio::test]
async fn trace_id_is_echoed_or_generated() {
    let app = app(Config::default());

    let id = "6f1c2a9e-3b0d-4c8e-9f7a-2d5e8b1c0a34";
    let mut req = get("/health");
    req.headers_mut().insert("x-trace-id", id.parse().unwrap());
    let resp = send(&app, req).await;
    assert_eq!(resp.headers()["x-trace-id"], id);

    let resp = send(&app, get("/health")).await;
    let generated = resp.headers()["x-trace-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[test]
fn client_ip_prefers_first_forwarded_hop() {
    let mut headers = HeaderMap::new();
    assert_eq!(client_ip(&headers), "unknown");

    headers.insert("x-real-ip", "192.0.2.9".parse().unwrap());
    assert_eq!(client_ip(&headers), "192.0.2.9");

    headers.insert("x-forwarded-for", " 203.0.113.7 , 10.0.0.1".parse().unwrap());
    assert_eq!(client_ip(&headers), "203.0.113.7");
}
