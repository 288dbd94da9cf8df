//! 上游采集客户端
//!
//! `AnalyticsClient` 负责组装并校验上报记录，实际投递交给 `Consumer`：
//! 生产环境使用 `BatchConsumer` 批量发送，调试模式使用 `ConsoleConsumer` 输出日志。

pub mod batch;
pub mod client;
pub mod console;
pub mod consumer;
pub mod validate;

pub use batch::{BatchConsumer, BatchConsumerConfig};
pub use client::AnalyticsClient;
pub use console::ConsoleConsumer;
pub use consumer::Consumer;
