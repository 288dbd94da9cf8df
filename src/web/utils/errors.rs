use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

pub const CODE_OK: i64 = 0;
/// 上游采集客户端返回错误
pub const CODE_DOWNSTREAM: i64 = 61000001;
/// 请求字段缺失或取值非法
pub const CODE_INVALID: i64 = 61000002;

/// 统一响应包体：`{"err_code": <int>, "msg": <string>}`
///
/// 业务错误一律以 HTTP 200 返回，调用方通过 `err_code` 判断成功与否。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub err_code: i64,
    pub msg: String,
}

impl Reply {
    pub fn ok() -> Self {
        Self::new(CODE_OK, "")
    }

    pub fn pong() -> Self {
        Self::new(CODE_OK, "pong")
    }

    pub fn required(field: &str) -> Self {
        Self::new(CODE_INVALID, format!("{} is required", field))
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::new(CODE_INVALID, msg)
    }

    pub fn downstream(msg: impl Into<String>) -> Self {
        Self::new(CODE_DOWNSTREAM, msg)
    }

    fn new(err_code: i64, msg: impl Into<String>) -> Self {
        Self {
            err_code,
            msg: msg.into(),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// 无包体的传输层错误（请求格式错误等）
pub fn bare_status(status: StatusCode) -> Response {
    status.into_response()
}
