//! ImagineKube API Server 入口

use anyhow::Result;
use clap::Parser;
use imaginekube_apiserver::config::{ConfigManager, DEFAULT_CONFIGURATION_PATH};
use imaginekube_apiserver::server::{ApiServer, ServerOptions};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// ImagineKube API Server
#[derive(Parser, Debug)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
struct Cli {
    /// 配置文件所在目录
    #[arg(long, default_value = DEFAULT_CONFIGURATION_PATH)]
    config_dir: PathBuf,

    /// 监听地址
    #[arg(long, default_value = "0.0.0.0:9090")]
    bind: String,

    /// kubeconfig 路径，覆盖配置文件
    #[arg(long)]
    kubeconfig: Option<String>,

    /// Kubernetes API Server 地址，覆盖 kubeconfig
    #[arg(long)]
    master: Option<String>,

    /// 日志级别
    #[arg(long, default_value = "info")]
    log_level: String,

    /// 等待 informer 缓存同步的最长时间
    #[arg(long, default_value = "60s", value_parser = humantime::parse_duration)]
    cache_sync_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    imaginekube_apiserver::init_tracing(&cli.log_level)?;

    let config_paths = vec![cli.config_dir.clone(), PathBuf::from(".")];
    let mut config = ConfigManager::new(config_paths.clone()).load()?;

    let kubernetes = config.kubernetes_options.get_or_insert_with(Default::default);
    if let Some(kubeconfig) = cli.kubeconfig {
        kubernetes.kube_config = kubeconfig;
    }
    if let Some(master) = cli.master {
        kubernetes.master = master;
    }

    info!("启动 ImagineKube API Server {}", env!("CARGO_PKG_VERSION"));
    let options = ServerOptions {
        bind_address: cli.bind,
        config_paths,
        cache_sync_timeout: cli.cache_sync_timeout,
    };
    ApiServer::new(config, options).await?.run().await
}
