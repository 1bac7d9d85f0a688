use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Tag every request with a trace id and echo it back in the response so log
/// lines and client reports can be correlated.
pub async fn assign_trace_id(mut req: Request<Body>, next: Next) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(trace_id.clone());
    let mut res = next.run(req).await;
    res.headers_mut().insert(
        "X-Trace-Id",
        HeaderValue::from_str(&trace_id).unwrap_or(HeaderValue::from_static("invalid")),
    );
    res
}
