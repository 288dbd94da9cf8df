use crate::web::utils::errors::Reply;

/// 存活探针，不依赖任何下游状态
pub async fn ping_handler() -> Reply {
    Reply::pong()
}
