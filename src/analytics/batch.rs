use anyhow::{bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::common::events::EventRecord;

use super::consumer::Consumer;

/// BatchConsumer 运行参数
#[derive(Debug, Clone)]
pub struct BatchConsumerConfig {
    pub server_url: String,
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub request_timeout: Duration,
}

/// 批量投递的 Consumer
///
/// - 缓冲区满 `batch_size` 条时在调用方任务内立即发送
/// - 后台任务按 `flush_interval` 周期发送剩余记录
/// - 发送失败的批次直接丢弃，不做重试
pub struct BatchConsumer {
    inner: Arc<BatchInner>,
    shutdown: CancellationToken,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

struct BatchInner {
    http: Client,
    server_url: Url,
    batch_size: usize,
    buffer: Mutex<Vec<EventRecord>>,
}

impl BatchConsumer {
    /// 需要在 tokio 运行时内调用（会启动后台定时任务）
    pub fn new(config: BatchConsumerConfig) -> anyhow::Result<Self> {
        let server_url = Url::parse(&config.server_url)
            .with_context(|| format!("invalid collector url: {}", config.server_url))?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("HTTP client init failed")?;

        let inner = Arc::new(BatchInner {
            http,
            server_url,
            batch_size: config.batch_size.max(1),
            buffer: Mutex::new(Vec::with_capacity(config.batch_size)),
        });

        let shutdown = CancellationToken::new();
        let ticker = spawn_ticker(inner.clone(), shutdown.clone(), config.flush_interval);

        Ok(Self {
            inner,
            shutdown,
            ticker: Mutex::new(Some(ticker)),
        })
    }

    pub async fn buffered(&self) -> usize {
        self.inner.buffer.lock().await.len()
    }
}

fn spawn_ticker(
    inner: Arc<BatchInner>,
    shutdown: CancellationToken,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = inner.flush().await {
                        warn!("[Analytics] Periodic flush failed: {:#}", e);
                    }
                }
            }
        }
        debug!("[Analytics] Flush timer stopped");
    })
}

impl BatchInner {
    async fn push(&self, record: EventRecord) -> anyhow::Result<()> {
        let batch = {
            let mut buffer = self.buffer.lock().await;
            buffer.push(record);
            if buffer.len() < self.batch_size {
                return Ok(());
            }
            std::mem::take(&mut *buffer)
        };
        self.post(batch).await
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let batch = std::mem::take(&mut *self.buffer.lock().await);
        if batch.is_empty() {
            return Ok(());
        }
        self.post(batch).await
    }

    async fn post(&self, batch: Vec<EventRecord>) -> anyhow::Result<()> {
        let count = batch.len();
        let payload = serde_json::to_vec(&batch)?;
        let data_list = STANDARD.encode(payload);

        let response = self
            .http
            .post(self.server_url.clone())
            .form(&[("data_list", data_list.as_str()), ("gzip", "0")])
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("send to collector failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            bail!("collector responded with status {}", status.as_u16());
        }

        debug!("[Analytics] Delivered {} records", count);
        Ok(())
    }
}

#[async_trait::async_trait]
impl Consumer for BatchConsumer {
    async fn send(&self, record: EventRecord) -> anyhow::Result<()> {
        self.inner.push(record).await
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.inner.flush().await
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.shutdown.cancel();
        if let Some(handle) = self.ticker.lock().await.take() {
            if let Err(e) = handle.await {
                warn!("[Analytics] Flush timer join error: {}", e);
            }
        }
        self.inner.flush().await
    }
}
