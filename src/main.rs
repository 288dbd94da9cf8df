use std::sync::Arc;
use tracing::info;

use sensor_pipe::analytics::AnalyticsClient;
use sensor_pipe::config::Settings;
use sensor_pipe::web::{
    server::{run_until_shutdown, shutdown_signal},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sensor_pipe=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("[Startup] sensor-pipe initializing...");

    // 配置缺失时直接退出，不进入服务状态
    let settings = Settings::new()?;
    info!(
        "[Config] Binding at {}, debug={}, verbose_request_logging={}",
        settings.bind_addr(),
        settings.analytics.debug,
        settings.server.verbose_request_logging
    );

    let analytics = AnalyticsClient::from_settings(&settings.analytics)?;
    let state = Arc::new(AppState::new(analytics));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    info!("[Startup] Service ready at http://{}", settings.bind_addr());

    run_until_shutdown(
        listener,
        state,
        settings.server.verbose_request_logging,
        shutdown_signal(),
        settings.shutdown_timeout(),
    )
    .await?;

    info!("[Shutdown] Server exiting");
    Ok(())
}
