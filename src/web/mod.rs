//! Web 服务器模块
//!
//! 把网关挂到 axum 上：`/api/translate` 与 `/healthz` 由本地处理，其余请求走代理。

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use handlers::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tower_http::trace::TraceLayer;

/// 服务器启动错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("无法绑定地址 {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("服务器运行错误: {0}")]
    Serve(#[from] std::io::Error),
}

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// 启动 Web 服务器，Ctrl-C 时优雅退出
    pub async fn start(&self) -> Result<(), ServerError> {
        let address = self.config.listen_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        tracing::info!(
            "边缘翻译代理已启动: http://{} -> {}",
            address,
            self.config.origin_url
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("服务器已停止");
        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_routes()
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("无法监听退出信号: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在关闭");
}
