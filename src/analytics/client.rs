use anyhow::bail;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::common::events::{EventRecord, RecordType, SIGNUP_EVENT};
use crate::common::properties::Properties;
use crate::config::AnalyticsSettings;

use super::batch::{BatchConsumer, BatchConsumerConfig};
use super::console::ConsoleConsumer;
use super::consumer::Consumer;
use super::validate;

/// 采集客户端
///
/// 进程内只构造一次，通过 `AppState` 注入各 Handler；克隆开销仅为一次引用计数。
#[derive(Clone)]
pub struct AnalyticsClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    consumer: Box<dyn Consumer>,
    project: Option<String>,
    closed: AtomicBool,
}

impl AnalyticsClient {
    pub fn new(consumer: impl Consumer + 'static, project: Option<String>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                consumer: Box::new(consumer),
                project,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// 根据配置选择 Consumer：调试模式输出日志，否则批量发送到采集服务
    pub fn from_settings(settings: &AnalyticsSettings) -> anyhow::Result<Self> {
        if settings.debug {
            tracing::warn!("[Analytics] Debug mode: events are logged, not delivered");
            return Ok(Self::new(ConsoleConsumer::new(), settings.project.clone()));
        }

        let Some(server_url) = settings.server_url.clone() else {
            bail!("SA_SERVER_URL is required");
        };
        let consumer = BatchConsumer::new(BatchConsumerConfig {
            server_url,
            batch_size: settings.batch_size,
            flush_interval: Duration::from_millis(settings.flush_interval_ms),
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
        })?;
        Ok(Self::new(consumer, settings.project.clone()))
    }

    pub fn project(&self) -> Option<&str> {
        self.inner.project.as_deref()
    }

    pub async fn track(
        &self,
        distinct_id: &str,
        event: &str,
        properties: Properties,
        is_login_id: bool,
    ) -> anyhow::Result<()> {
        validate::check_distinct_id(distinct_id)?;
        validate::check_key(event)?;
        validate::check_properties(&properties)?;

        let record = EventRecord::new(
            RecordType::Track,
            distinct_id,
            Some(event),
            properties,
            is_login_id,
        );
        self.dispatch(record).await
    }

    pub async fn profile_set(
        &self,
        distinct_id: &str,
        properties: Properties,
        is_login_id: bool,
    ) -> anyhow::Result<()> {
        self.profile(RecordType::ProfileSet, distinct_id, properties, is_login_id).await
    }

    pub async fn profile_set_once(
        &self,
        distinct_id: &str,
        properties: Properties,
        is_login_id: bool,
    ) -> anyhow::Result<()> {
        self.profile(
            RecordType::ProfileSetOnce,
            distinct_id,
            properties,
            is_login_id,
        )
        .await
    }

    /// 将匿名 ID 与登录 ID 关联
    pub async fn track_signup(&self, distinct_id: &str, origin_id: &str) -> anyhow::Result<()> {
        validate::check_distinct_id(distinct_id)?;
        validate::check_original_id(origin_id)?;

        let record = EventRecord::new(
            RecordType::TrackSignup,
            distinct_id,
            Some(SIGNUP_EVENT),
            Properties::new(),
            false,
        )
        .with_original_id(origin_id);
        self.dispatch(record).await
    }

    pub async fn flush(&self) -> anyhow::Result<()> {
        self.inner.consumer.flush().await
    }

    /// 关闭客户端并发送缓冲区剩余记录；重复调用无副作用
    pub async fn close(&self) -> anyhow::Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.consumer.close().await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    async fn profile(
        &self,
        record_type: RecordType,
        distinct_id: &str,
        properties: Properties,
        is_login_id: bool,
    ) -> anyhow::Result<()> {
        validate::check_distinct_id(distinct_id)?;
        validate::check_properties(&properties)?;

        let record = EventRecord::new(record_type, distinct_id, None, properties, is_login_id);
        self.dispatch(record).await
    }

    async fn dispatch(&self, record: EventRecord) -> anyhow::Result<()> {
        if self.is_closed() {
            bail!("analytics client is closed");
        }
        let record = record.with_project(self.project());
        tracing::debug!(
            "[Analytics] Sending {} for {}",
            record.record_type.as_str(),
            record.distinct_id
        );
        self.inner.consumer.send(record).await
    }
}
