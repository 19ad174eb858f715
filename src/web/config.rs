//! Web 服务器配置
//!
//! 使用类型安全的环境变量系统进行配置管理

use std::path::PathBuf;
use std::time::Duration;

use crate::env::{EnvError, EnvResult, EnvVar};

/// 源站请求默认超时（秒）
const DEFAULT_ORIGIN_TIMEOUT_SECS: u64 = 30;

/// Web 服务器配置
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// 绑定地址
    pub bind_addr: String,
    /// 端口
    pub port: u16,
    /// 源站地址
    pub origin_url: String,
    /// 源站请求超时
    pub origin_timeout: Duration,
    /// 翻译配置文件（可选）
    pub config_path: Option<PathBuf>,
}

impl WebConfig {
    /// 从环境变量创建配置
    pub fn from_env() -> EnvResult<Self> {
        use crate::env::web;

        Ok(Self {
            bind_addr: web::BindAddress::get()?,
            port: web::Port::get()?,
            origin_url: web::OriginUrl::get()?,
            origin_timeout: Duration::from_secs(DEFAULT_ORIGIN_TIMEOUT_SECS),
            config_path: None,
        })
    }

    /// 验证配置
    pub fn validate(&self) -> EnvResult<()> {
        use crate::env::web;

        if self.bind_addr.trim().is_empty() {
            return Err(EnvError {
                variable: web::BindAddress::NAME.to_string(),
                message: "Bind address cannot be empty".to_string(),
            });
        }

        if self.port == 0 {
            return Err(EnvError {
                variable: web::Port::NAME.to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        web::OriginUrl::parse(&self.origin_url)?;

        if let Some(ref path) = self.config_path {
            if !path.is_file() {
                tracing::warn!("配置文件不存在: {}", path.display());
            }
        }

        Ok(())
    }

    /// 获取完整的监听地址
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::from_env().unwrap_or_else(|e| {
            tracing::warn!("Failed to load web config from environment: {}. Using defaults.", e);
            Self {
                bind_addr: "127.0.0.1".to_string(),
                port: 7080,
                origin_url: "http://127.0.0.1:4321".to_string(),
                origin_timeout: Duration::from_secs(DEFAULT_ORIGIN_TIMEOUT_SECS),
                config_path: None,
            }
        })
    }
}
