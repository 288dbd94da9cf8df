use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::common::document::RequestDocument;
use crate::web::state::AppState;
use crate::web::utils::errors::{bare_status, Reply};
use crate::web::utils::request::{is_json, read_body};

/// 校验通过的 `/track-signup` 请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    pub distinct_id: String,
    pub origin_id: String,
}

impl SignupRequest {
    /// 缺少 `distinct_id` 时沿用既有接口的提示文案 "is_login_id is required"
    pub fn from_document(doc: &RequestDocument) -> Result<Self, Reply> {
        let distinct_id = doc
            .text("distinct_id")
            .ok_or_else(|| Reply::required("is_login_id"))?;
        let origin_id = doc
            .text("origin_id")
            .ok_or_else(|| Reply::required("origin_id"))?;

        Ok(Self {
            distinct_id,
            origin_id,
        })
    }
}

/// `POST /track-signup`
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let raw = match read_body(body).await {
        Ok(raw) => raw,
        Err(response) => return response,
    };

    if !is_json(&headers) {
        return bare_status(StatusCode::BAD_REQUEST);
    }

    let doc = RequestDocument::parse(&raw);
    let request = match SignupRequest::from_document(&doc) {
        Ok(request) => request,
        Err(reply) => return reply.into_response(),
    };

    match state
        .analytics
        .track_signup(&request.distinct_id, &request.origin_id)
        .await
    {
        Ok(()) => Reply::ok().into_response(),
        Err(e) => {
            tracing::warn!(
                "[Signup] {} -> {} failed: {}",
                request.origin_id,
                request.distinct_id,
                e
            );
            Reply::invalid(e.to_string()).into_response()
        }
    }
}
