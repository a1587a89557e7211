use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{Instrument, info, info_span};

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Reuses a non-blank `X-Request-Id` from the caller or mints `req-<nanos>`.
fn ensure_request_id(headers: &HeaderMap) -> HeaderValue {
    if let Some(v) = headers.get(&X_REQUEST_ID)
        && v.to_str().is_ok_and(|s| !s.trim().is_empty())
    {
        return v.clone();
    }
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    // Digits and a dash only, always a valid header value.
    HeaderValue::from_str(&format!("req-{nanos}")).unwrap_or(HeaderValue::from_static("req-0"))
}

/// Tags the request span and the response with a request id.
///
/// The body is passed through untouched so streamed responses keep flowing.
pub async fn request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = ensure_request_id(req.headers());
    req.headers_mut().insert(X_REQUEST_ID.clone(), id.clone());

    let span = info_span!(
        "http_request",
        request_id = %id.to_str().unwrap_or_default(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let mut res = next.run(req).await;
        info!(status = res.status().as_u16(), "response ready");
        res.headers_mut().insert(X_REQUEST_ID.clone(), id);
        res
    }
    .instrument(span)
    .await
}
