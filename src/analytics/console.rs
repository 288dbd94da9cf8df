use crate::common::events::EventRecord;

use super::consumer::Consumer;

/// 调试模式下的 Consumer：每条记录以单行 JSON 写入日志，不访问网络
#[derive(Debug, Default, Clone)]
pub struct ConsoleConsumer;

impl ConsoleConsumer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Consumer for ConsoleConsumer {
    async fn send(&self, record: EventRecord) -> anyhow::Result<()> {
        let line = serde_json::to_string(&record)?;
        tracing::info!("[Analytics] {}", line);
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
