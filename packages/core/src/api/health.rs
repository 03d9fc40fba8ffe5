use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

pub const HEALTH_BODY: &str = "Order notifier is running";

/// Liveness probe. Always 200, whatever state the polling loop is in.
pub async fn health() -> impl IntoResponse {
    let mut response = Response::new(Body::from(HEALTH_BODY));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
