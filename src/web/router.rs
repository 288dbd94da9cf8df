use axum::{
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::web::{
    api::{ping::ping_handler, signup::signup_handler, track::track_handler},
    middleware::request_log::request_log_middleware,
    state::AppState,
    utils::errors::Reply,
};

/// 路由定义
pub fn build_router(state: Arc<AppState>, verbose_request_logging: bool) -> Router {
    let routes = Router::new()
        .route("/ping", get(ping_handler))
        .route("/track", post(track_handler))
        .route("/track-signup", post(signup_handler))
        .with_state(state);

    apply_middleware(routes, verbose_request_logging)
}

/// 挂载通用中间件：panic 恢复 + 访问日志（简要或完整报文二选一）
pub fn apply_middleware(router: Router, verbose_request_logging: bool) -> Router {
    let router = router.layer(CatchPanicLayer::custom(handle_panic));

    if verbose_request_logging {
        router.layer(middleware::from_fn(request_log_middleware))
    } else {
        router.layer(TraceLayer::new_for_http())
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!("[Recovery] Handler panicked: {}", details);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(Reply::downstream("internal server error")),
    )
        .into_response()
}
