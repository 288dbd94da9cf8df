use crate::common::events::EventRecord;

/// 上报记录的投递通道
///
/// 实现方必须支持多个请求并发调用。
#[async_trait::async_trait]
pub trait Consumer: Send + Sync {
    async fn send(&self, record: EventRecord) -> anyhow::Result<()>;

    async fn flush(&self) -> anyhow::Result<()>;

    /// 停止后台任务并发送剩余记录
    async fn close(&self) -> anyhow::Result<()>;
}
