//! API Server 启动流程
//!
//! 连接集群、注册 informer、等待缓存同步后对外提供 HTTP 服务，
//! 运行期间监听配置文件并刷新 `/configz` 返回的数据。

use crate::config::{Config, ConfigManager, KubernetesOptions};
use crate::informers::{self, InformerFactory};
use crate::kapis::{self, AppState};
use crate::utils::format_duration;
use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use notify::RecommendedWatcher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// 启动参数
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// 监听地址
    pub bind_address: String,
    /// 配置文件搜索目录
    pub config_paths: Vec<PathBuf>,
    /// 等待 informer 缓存同步的最长时间
    pub cache_sync_timeout: Duration,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9090".to_string(),
            config_paths: vec![PathBuf::from(crate::config::DEFAULT_CONFIGURATION_PATH)],
            cache_sync_timeout: Duration::from_secs(60),
        }
    }
}

/// ImagineKube API Server
pub struct ApiServer {
    options: ServerOptions,
    config_manager: ConfigManager,
    state: AppState,
    weave_scope_host: Option<String>,
}

impl ApiServer {
    /// 连接集群并构建全部组件
    pub async fn new(config: Config, options: ServerOptions) -> Result<Self> {
        let kubernetes = config.kubernetes_options.clone().unwrap_or_default();
        let client = kube_client(&kubernetes).await?;
        let mut factory = InformerFactory::new(client.clone());
        match informers::served_resources(client).await {
            Ok(served) => factory = factory.with_served_resources(served),
            Err(e) => warn!("获取集群资源列表失败，为全部资源类型启动监听: {}", e),
        }
        let informers = Arc::new(factory);
        Self::with_informers(informers, config, options)
    }

    pub(crate) fn with_informers(
        informers: Arc<InformerFactory>,
        config: Config,
        options: ServerOptions,
    ) -> Result<Self> {
        let weave_scope_host = config.weave_scope_host().map(str::to_string);
        let state = AppState::new(informers, config).context("注册 API 指标失败")?;
        info!("已注册 {} 种资源的 informer", state.informers.len());

        Ok(Self {
            config_manager: ConfigManager::new(options.config_paths.clone()),
            options,
            state,
            weave_scope_host,
        })
    }

    /// 启动 informer 并提供 HTTP 服务，收到退出信号后优雅停止
    pub async fn run(self) -> Result<()> {
        self.state.informers.start();

        let started = Instant::now();
        let unsynced = self
            .state
            .informers
            .wait_for_cache_sync(self.options.cache_sync_timeout)
            .await;
        if unsynced.is_empty() {
            info!("informer 缓存同步完成，耗时 {}", format_duration(started.elapsed()));
        } else {
            warn!(
                "{} 种资源的缓存尚未同步，同步完成前 /readyz 返回 503",
                unsynced.len()
            );
        }

        let _watcher = self.spawn_config_reload();

        let router = kapis::router(self.state.clone(), self.weave_scope_host.as_deref());
        let listener = TcpListener::bind(&self.options.bind_address)
            .await
            .with_context(|| format!("监听 {} 失败", self.options.bind_address))?;
        info!("ImagineKube API Server 监听 {}", self.options.bind_address);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP 服务异常退出")?;

        info!("ImagineKube API Server 已停止");
        Ok(())
    }

    /// 配置文件变更后替换共享配置，返回的监听器需要保持存活
    fn spawn_config_reload(&self) -> Option<RecommendedWatcher> {
        match self.config_manager.watch() {
            Ok((watcher, mut updates)) => {
                let config = self.state.config.clone();
                tokio::spawn(async move {
                    while let Some(next) = updates.recv().await {
                        *config.write().await = next;
                        info!("配置已重新加载");
                    }
                });
                Some(watcher)
            }
            Err(e) => {
                debug!("不监听配置文件: {}", e);
                None
            }
        }
    }
}

/// 按 kubeconfig 或集群内配置创建客户端，`master` 非空时覆盖地址
async fn kube_client(options: &KubernetesOptions) -> Result<Client> {
    let mut config = if options.kube_config.is_empty() {
        kube::Config::infer().await.context("推断 Kubernetes 连接配置失败")?
    } else {
        let kubeconfig = Kubeconfig::read_from(&options.kube_config)
            .with_context(|| format!("读取 kubeconfig {} 失败", options.kube_config))?;
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("解析 kubeconfig 失败")?
    };

    if !options.master.is_empty() {
        config.cluster_url = options
            .master
            .parse()
            .with_context(|| format!("无效的 API Server 地址: {}", options.master))?;
    }
    debug!("Kubernetes API Server 地址: {}", config.cluster_url);

    Client::try_from(config).context("创建 Kubernetes 客户端失败")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("监听 Ctrl+C 失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("监听 SIGTERM 失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("收到退出信号，正在停止服务...");
}
