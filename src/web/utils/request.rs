use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, StatusCode},
    response::Response,
};
use bytes::Bytes;

use super::errors::bare_status;

/// 读取完整请求体；读取失败只影响当前请求，返回 500
pub async fn read_body(body: Body) -> Result<Bytes, Response> {
    to_bytes(body, usize::MAX).await.map_err(|e| {
        tracing::error!("[Request] Failed to read body: {}", e);
        bare_status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}
