//! ImagineKube API Server
//!
//! 基于 informer 缓存提供多租户资源查询、企业空间管理、应用商店与
//! 网络拓扑接口。使用 kube-rs 与 Kubernetes API 交互，axum 提供 HTTP 服务。

pub mod config;
pub mod crd;
pub mod informers;
pub mod kapis;
pub mod metrics;
pub mod models;
pub mod resources;
pub mod server;
pub mod utils;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// 初始化日志，设置了 `RUST_LOG` 时优先使用环境变量
pub fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("无效的日志级别 {}: {}", level, e))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow!("初始化日志失败: {}", e))
}
