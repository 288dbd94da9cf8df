use axum::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::web::{router::build_router, state::AppState};

/// 服务运行到收到停机信号为止，随后排空在途请求并关闭采集客户端
///
/// 生命周期：listening -> draining（最多等待 `drain_timeout`）-> stopped。
pub async fn run_until_shutdown<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    verbose_request_logging: bool,
    shutdown: F,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state.clone(), verbose_request_logging);
    let served = serve_with_shutdown(listener, app, shutdown, drain_timeout).await;

    info!("[Shutdown] Closing analytics client");
    if let Err(e) = state.analytics.close().await {
        error!("[Shutdown] Analytics client close failed: {:#}", e);
    }

    served
}

/// 在 `shutdown` 完成后停止接收新连接，并限时等待在途请求结束
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    drain_timeout: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let draining = CancellationToken::new();
    let graceful = draining.clone();

    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { graceful.cancelled().await })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            // 未收到停机信号服务就退出了
            return Ok(joined??);
        }
        _ = shutdown => {}
    }

    info!(
        "[Shutdown] Draining in-flight requests (timeout {:?})",
        drain_timeout
    );
    draining.cancel();

    let drained = tokio::time::timeout(drain_timeout, &mut server).await;
    match drained {
        Ok(joined) => joined??,
        Err(_) => {
            warn!("[Shutdown] Drain timed out, dropping remaining connections");
            server.abort();
        }
    }

    Ok(())
}

/// 等待 Ctrl+C、SIGTERM 或 SIGABRT
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[Shutdown] Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = unix_signal(SignalKind::terminate(), "SIGTERM");
    #[cfg(unix)]
    let abort = unix_signal(SignalKind::from_raw(libc::SIGABRT), "SIGABRT");

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();
    #[cfg(not(unix))]
    let abort = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = abort => {}
    }
    info!("[Shutdown] Signal received");
}

/// 注册失败时只记录日志，等待其余信号
#[cfg(unix)]
async fn unix_signal(kind: SignalKind, name: &str) {
    match signal(kind) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("[Shutdown] Failed to listen for {}: {}", name, e);
            std::future::pending::<()>().await;
        }
    }
}
