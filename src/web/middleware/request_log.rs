use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

/// 报文日志中间件
///
/// 记录完整的请求体与响应体，`/ping` 不记录。仅在开启详细日志时挂载。
pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    if req.uri().path() == "/ping" {
        return next.run(req).await;
    }

    let method = req.method().clone();
    let uri = req.uri().clone();
    let (parts, body) = req.into_parts();
    let request_body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("[Request] Failed to buffer request body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let req = Request::from_parts(parts, Body::from(request_body.clone()));
    let response = next.run(req).await;

    let (parts, body) = response.into_parts();
    let response_body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("[Request] Failed to buffer response body: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "[Request] {} {} status={} request={} response={}",
        method,
        uri,
        parts.status.as_u16(),
        String::from_utf8_lossy(&request_body),
        String::from_utf8_lossy(&response_body)
    );

    Response::from_parts(parts, Body::from(response_body))
}
