use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::analytics::AnalyticsClient;
use crate::common::document::RequestDocument;
use crate::common::properties::{properties_from_json, Properties};
use crate::web::state::AppState;
use crate::web::utils::errors::{bare_status, Reply};
use crate::web::utils::request::{is_json, read_body};

/// `event_type` 支持的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Track,
    ProfileSet,
    ProfileSetOnce,
}

impl EventType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "track" => Some(Self::Track),
            "profile_set" => Some(Self::ProfileSet),
            "profile_set_once" => Some(Self::ProfileSetOnce),
            _ => None,
        }
    }
}

/// 校验通过的 `/track` 请求
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRequest {
    pub distinct_id: String,
    pub event_type: String,
    pub event_name: String,
    pub is_login_id: bool,
    pub properties: Properties,
}

/// 校验失败：业务错误走 200 + 错误码，格式错误走裸 400
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Invalid(Reply),
    Malformed,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::Invalid(reply) => reply.into_response(),
            Rejection::Malformed => bare_status(StatusCode::BAD_REQUEST),
        }
    }
}

impl TrackRequest {
    /// 按固定顺序检查必填字段，再展开 `properties`
    pub fn from_document(doc: &RequestDocument) -> Result<Self, Rejection> {
        let required = |field: &str| Rejection::Invalid(Reply::required(field));

        let distinct_id = doc
            .text("distinct_id")
            .ok_or_else(|| required("distinct_id"))?;
        let event_type = doc
            .text("event_type")
            .ok_or_else(|| required("event_type"))?;

        let event_name = doc.text("event_name");
        if event_type == "track" && event_name.is_none() {
            return Err(required("event_name"));
        }

        let is_login_id = doc
            .flag("is_login_id")
            .ok_or_else(|| required("is_login_id"))?;

        let raw_properties = doc.get("properties").ok_or(Rejection::Malformed)?;
        let properties = properties_from_json(raw_properties).map_err(|e| {
            tracing::debug!("[Track] Rejected properties: {}", e);
            Rejection::Malformed
        })?;

        Ok(Self {
            distinct_id,
            event_type,
            event_name: event_name.unwrap_or_default(),
            is_login_id,
            properties,
        })
    }
}

/// 按 `event_type` 调用对应的采集接口
pub async fn dispatch(client: &AnalyticsClient, request: TrackRequest) -> Reply {
    let TrackRequest {
        distinct_id,
        event_type,
        event_name,
        is_login_id,
        properties,
    } = request;

    let Some(kind) = EventType::parse(&event_type) else {
        return Reply::invalid("event type not exists");
    };

    let result = match kind {
        EventType::Track => {
            client
                .track(&distinct_id, &event_name, properties, is_login_id)
                .await
        }
        EventType::ProfileSet => {
            client
                .profile_set(&distinct_id, properties, is_login_id)
                .await
        }
        EventType::ProfileSetOnce => {
            client
                .profile_set_once(&distinct_id, properties, is_login_id)
                .await
        }
    };

    match result {
        Ok(()) => Reply::ok(),
        Err(e) => {
            tracing::warn!("[Track] {} for {} failed: {}", event_type, distinct_id, e);
            Reply::downstream(e.to_string())
        }
    }
}

/// `POST /track`
pub async fn track_handler(
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
    match TrackRequest::from_document(&doc) {
        Ok(request) => dispatch(&state.analytics, request).await.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}
