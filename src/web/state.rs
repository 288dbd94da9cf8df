use crate::analytics::AnalyticsClient;

/// Web 应用全局状态
///
/// 职责：持有跨请求共享的采集客户端，通过 Arc 注入到 Axum 的 Handler 中。
#[derive(Clone)]
pub struct AppState {
    pub analytics: AnalyticsClient,
}

impl AppState {
    pub fn new(analytics: AnalyticsClient) -> Self {
        Self { analytics }
    }
}
