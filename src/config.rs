use anyhow::{bail, Context};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 应用配置总结构
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub analytics: AnalyticsSettings,
}

/// 服务相关配置（监听地址、端口、停机等待时间）
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// 收到停机信号后等待在途请求完成的最长时间（单位：秒）
    pub shutdown_timeout_secs: u64,
    /// 为 true 时记录完整的请求/响应报文，否则只输出简要的访问日志
    #[serde(default)]
    pub verbose_request_logging: bool,
}

/// 上游采集服务配置
///
/// 调试模式下不需要 `server_url` / `project`，事件改为输出到日志。
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    #[serde(default)]
    pub debug: bool,
    pub server_url: Option<String>,
    pub project: Option<String>,
    /// 缓冲区达到该条数时立即发送
    pub batch_size: usize,
    /// 后台定时发送间隔（单位：毫秒）
    pub flush_interval_ms: u64,
    /// 单次上报请求超时（单位：毫秒）
    pub request_timeout_ms: u64,
}

/// 兼容旧部署方式的环境变量：`DEBUG`、`SA_SERVER_URL`、`SA_PROJECT`
#[derive(Debug, Default, Clone)]
pub struct LegacyEnv {
    pub debug: bool,
    pub server_url: Option<String>,
    pub project: Option<String>,
}

impl LegacyEnv {
    pub fn from_process() -> Self {
        Self {
            debug: std::env::var_os("DEBUG").is_some(),
            server_url: std::env::var("SA_SERVER_URL").ok(),
            project: std::env::var("SA_PROJECT").ok(),
        }
    }
}

impl Settings {
    /// 加载配置：默认值、可选配置文件、环境变量覆盖
    pub fn new() -> anyhow::Result<Self> {
        Self::load(None, &LegacyEnv::from_process())
    }

    /// `config_file` 为空时读取工作目录下可选的 `sensor-pipe.*`
    pub fn load(config_file: Option<&Path>, legacy: &LegacyEnv) -> anyhow::Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("sensor-pipe").required(false),
        };

        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 80)?
            .set_default("server.shutdown_timeout_secs", 5)?
            .set_default("server.verbose_request_logging", false)?
            .set_default("analytics.debug", false)?
            .set_default::<&str, Option<String>>("analytics.server_url", None)?
            .set_default::<&str, Option<String>>("analytics.project", None)?
            .set_default("analytics.batch_size", 10)?
            .set_default("analytics.flush_interval_ms", 10_000)?
            .set_default("analytics.request_timeout_ms", 10_000)?
            .add_source(file)
            .add_source(Environment::with_prefix("SENSOR_PIPE").separator("__"))
            .set_override_option("analytics.server_url", legacy.server_url.clone())?
            .set_override_option("analytics.project", legacy.project.clone())?;

        if legacy.debug {
            builder = builder.set_override("analytics.debug", true)?;
        }

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 非调试模式下采集地址和项目名必须存在
    pub fn validate(&self) -> anyhow::Result<()> {
        let analytics = &self.analytics;
        if analytics.batch_size == 0 {
            bail!("analytics.batch_size must be at least 1");
        }
        if analytics.debug {
            return Ok(());
        }

        let Some(server_url) = analytics.server_url.as_deref() else {
            bail!("SA_SERVER_URL is required");
        };
        url::Url::parse(server_url)
            .with_context(|| format!("SA_SERVER_URL is not a valid url: {}", server_url))?;

        if analytics.project.is_none() {
            bail!("SA_PROJECT is required");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout_secs)
    }
}
