//! 配置管理模块
//!
//! 聚合 API Server 访问各外部服务所需的配置，按 默认值 → 配置文件 → 环境变量
//! 的顺序分层加载，并支持监听配置文件实现热重载。

mod options;

pub use options::*;

use ::config::{Case, Config as RawConfig, Environment, File};
use imaginekube_common::constants::CONFIG_MAP_DATA_KEY;
use imaginekube_common::{Error, Result};
use k8s_openapi::api::core::v1::ConfigMap;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 默认配置文件名（不含扩展名）
pub const DEFAULT_CONFIGURATION_NAME: &str = "imaginekube";
/// 默认配置目录
pub const DEFAULT_CONFIGURATION_PATH: &str = "/etc/imaginekube";
/// 环境变量前缀，层级之间以 `__` 分隔，如 `IMAGINEKUBE__MONITORING__ENDPOINT`
pub const ENV_PREFIX: &str = "IMAGINEKUBE";

const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// API Server 访问外部服务所需的全部配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "devops", default, skip_serializing_if = "Option::is_none")]
    pub devops_options: Option<DevopsOptions>,
    #[serde(rename = "sonarqube", alias = "sonarQube", default, skip_serializing_if = "Option::is_none")]
    pub sonarqube_options: Option<SonarQubeOptions>,
    #[serde(rename = "kubernetes", default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_options: Option<KubernetesOptions>,
    #[serde(rename = "servicemesh", default, skip_serializing_if = "Option::is_none")]
    pub servicemesh_options: Option<ServiceMeshOptions>,
    #[serde(rename = "network", default, skip_serializing_if = "Option::is_none")]
    pub network_options: Option<NetworkOptions>,
    #[serde(rename = "ldap", default, skip_serializing_if = "Option::is_none")]
    pub ldap_options: Option<LdapOptions>,
    #[serde(rename = "cache", default, skip_serializing_if = "Option::is_none")]
    pub cache_options: Option<CacheOptions>,
    #[serde(rename = "s3", default, skip_serializing_if = "Option::is_none")]
    pub s3_options: Option<S3Options>,
    #[serde(rename = "openpitrix", default, skip_serializing_if = "Option::is_none")]
    pub openpitrix_options: Option<OpenPitrixOptions>,
    #[serde(rename = "monitoring", default, skip_serializing_if = "Option::is_none")]
    pub monitoring_options: Option<MonitoringOptions>,
    #[serde(rename = "logging", default, skip_serializing_if = "Option::is_none")]
    pub logging_options: Option<LoggingOptions>,
    #[serde(rename = "authentication", default, skip_serializing_if = "Option::is_none")]
    pub authentication_options: Option<AuthenticationOptions>,
    #[serde(rename = "authorization", default, skip_serializing_if = "Option::is_none")]
    pub authorization_options: Option<AuthorizationOptions>,
    #[serde(rename = "multicluster", default, skip_serializing_if = "Option::is_none")]
    pub multicluster_options: Option<MultiClusterOptions>,
    #[serde(rename = "events", default, skip_serializing_if = "Option::is_none")]
    pub events_options: Option<EventsOptions>,
    #[serde(rename = "auditing", default, skip_serializing_if = "Option::is_none")]
    pub auditing_options: Option<AuditingOptions>,
    #[serde(rename = "alerting", default, skip_serializing_if = "Option::is_none")]
    pub alerting_options: Option<AlertingOptions>,
    #[serde(rename = "notification", default, skip_serializing_if = "Option::is_none")]
    pub notification_options: Option<NotificationOptions>,
    #[serde(rename = "kubeedge", default, skip_serializing_if = "Option::is_none")]
    pub kubeedge_options: Option<KubeEdgeOptions>,
    #[serde(rename = "edgeruntime", default, skip_serializing_if = "Option::is_none")]
    pub edgeruntime_options: Option<EdgeRuntimeOptions>,
    #[serde(rename = "metering", default, skip_serializing_if = "Option::is_none")]
    pub metering_options: Option<MeteringOptions>,
    #[serde(rename = "gateway", default, skip_serializing_if = "Option::is_none")]
    pub gateway_options: Option<GatewayOptions>,
    #[serde(rename = "gpu", default, skip_serializing_if = "Option::is_none")]
    pub gpu_options: Option<GpuOptions>,
    #[serde(rename = "terminal", default, skip_serializing_if = "Option::is_none")]
    pub terminal_options: Option<TerminalOptions>,
}

impl Default for Config {
    /// 所有配置项都填充默认值
    fn default() -> Self {
        Self {
            devops_options: Some(DevopsOptions::default()),
            sonarqube_options: Some(SonarQubeOptions::default()),
            kubernetes_options: Some(KubernetesOptions::default()),
            servicemesh_options: Some(ServiceMeshOptions::default()),
            network_options: Some(NetworkOptions::default()),
            ldap_options: Some(LdapOptions::default()),
            cache_options: Some(CacheOptions::default()),
            s3_options: Some(S3Options::default()),
            openpitrix_options: Some(OpenPitrixOptions::default()),
            monitoring_options: Some(MonitoringOptions::default()),
            logging_options: Some(create_default_logging_options()),
            authentication_options: Some(AuthenticationOptions::default()),
            authorization_options: Some(AuthorizationOptions::default()),
            multicluster_options: Some(MultiClusterOptions::default()),
            events_options: Some(create_default_events_options()),
            auditing_options: Some(AuditingOptions::default()),
            alerting_options: Some(AlertingOptions::default()),
            notification_options: Some(NotificationOptions::default()),
            kubeedge_options: Some(KubeEdgeOptions::default()),
            edgeruntime_options: Some(EdgeRuntimeOptions::default()),
            metering_options: Some(MeteringOptions::default()),
            gateway_options: Some(GatewayOptions::default()),
            gpu_options: Some(GpuOptions::default()),
            terminal_options: Some(TerminalOptions::default()),
        }
    }
}

impl Config {
    /// 为缺失的配置项补上默认值
    fn fill_defaults(&mut self) {
        fn fill<T>(option: &mut Option<T>, default: Option<T>) {
            if option.is_none() {
                *option = default;
            }
        }

        let defaults = Config::default();
        fill(&mut self.devops_options, defaults.devops_options);
        fill(&mut self.sonarqube_options, defaults.sonarqube_options);
        fill(&mut self.kubernetes_options, defaults.kubernetes_options);
        fill(&mut self.servicemesh_options, defaults.servicemesh_options);
        fill(&mut self.network_options, defaults.network_options);
        fill(&mut self.ldap_options, defaults.ldap_options);
        fill(&mut self.cache_options, defaults.cache_options);
        fill(&mut self.s3_options, defaults.s3_options);
        fill(&mut self.openpitrix_options, defaults.openpitrix_options);
        fill(&mut self.monitoring_options, defaults.monitoring_options);
        fill(&mut self.logging_options, defaults.logging_options);
        fill(&mut self.authentication_options, defaults.authentication_options);
        fill(&mut self.authorization_options, defaults.authorization_options);
        fill(&mut self.multicluster_options, defaults.multicluster_options);
        fill(&mut self.events_options, defaults.events_options);
        fill(&mut self.auditing_options, defaults.auditing_options);
        fill(&mut self.alerting_options, defaults.alerting_options);
        fill(&mut self.notification_options, defaults.notification_options);
        fill(&mut self.kubeedge_options, defaults.kubeedge_options);
        fill(&mut self.edgeruntime_options, defaults.edgeruntime_options);
        fill(&mut self.metering_options, defaults.metering_options);
        fill(&mut self.gateway_options, defaults.gateway_options);
        fill(&mut self.gpu_options, defaults.gpu_options);
        fill(&mut self.terminal_options, defaults.terminal_options);
    }

    /// 去掉关键地址为空、视为未启用的配置项
    pub fn strip_empty_options(&mut self) {
        fn drop_if<T>(option: &mut Option<T>, empty: impl Fn(&T) -> bool) {
            if option.as_ref().map(&empty).unwrap_or(false) {
                *option = None;
            }
        }

        drop_if(&mut self.cache_options, |o| o.kind.is_empty());
        drop_if(&mut self.devops_options, |o| o.host.is_empty());
        drop_if(&mut self.monitoring_options, |o| o.endpoint.is_empty());
        drop_if(&mut self.sonarqube_options, |o| o.host.is_empty());
        drop_if(&mut self.ldap_options, |o| o.host.is_empty());
        drop_if(&mut self.network_options, NetworkOptions::is_empty);
        drop_if(&mut self.servicemesh_options, |o| {
            o.istio_pilot_host.is_empty()
                && o.servicemesh_prometheus_host.is_empty()
                && o.jaeger_query_host.is_empty()
        });
        drop_if(&mut self.s3_options, |o| o.endpoint.is_empty());
        drop_if(&mut self.alerting_options, |o| {
            o.endpoint.is_empty()
                && o.prometheus_endpoint.is_empty()
                && o.thanos_ruler_endpoint.is_empty()
        });
        drop_if(&mut self.logging_options, |o| o.host.is_empty());
        drop_if(&mut self.notification_options, |o| o.endpoint.is_empty());
        drop_if(&mut self.multicluster_options, |o| !o.enable);
        drop_if(&mut self.events_options, |o| o.host.is_empty());
        drop_if(&mut self.auditing_options, |o| o.host.is_empty());
        drop_if(&mut self.kubeedge_options, |o| o.endpoint.is_empty());
        drop_if(&mut self.edgeruntime_options, |o| o.endpoint.is_empty());
        drop_if(&mut self.gpu_options, |o| o.kinds.is_empty());
    }

    /// 将配置转换为功能开关表，隐藏具体地址与凭据
    pub fn to_map(&self) -> BTreeMap<String, bool> {
        let mut conf = self.clone();
        conf.strip_empty_options();

        let mut result = BTreeMap::new();
        let mut set = |name: &str, enabled: bool| {
            result.insert(name.to_string(), enabled);
        };

        set("devops", conf.devops_options.is_some());
        set("sonarqube", conf.sonarqube_options.is_some());
        set("kubernetes", conf.kubernetes_options.is_some());
        set("servicemesh", conf.servicemesh_options.is_some());
        match &conf.network_options {
            Some(network) => {
                set("network", network.enable_network_policy);
                set("network.ippool", network.ippool_type != IpPoolType::None);
                set("network.topology", !network.weave_scope_host.is_empty());
            }
            None => {
                set("network", false);
                set("network.ippool", false);
            }
        }
        set("cache", conf.cache_options.is_some());
        set("s3", conf.s3_options.is_some());
        set("openpitrix", true);
        set(
            "openpitrix.appstore",
            conf.openpitrix_options
                .as_ref()
                .map(|o| !o.app_store_conf_is_empty())
                .unwrap_or(false),
        );
        set("monitoring", conf.monitoring_options.is_some());
        set("logging", conf.logging_options.is_some());
        set("authentication", conf.authentication_options.is_some());
        set("authorization", conf.authorization_options.is_some());
        set("multicluster", conf.multicluster_options.is_some());
        set("events", conf.events_options.is_some());
        set("auditing", conf.auditing_options.is_some());
        set("alerting", conf.alerting_options.is_some());
        set("notification", conf.notification_options.is_some());
        set("kubeedge", conf.kubeedge_options.is_some());
        set("edgeruntime", conf.edgeruntime_options.is_some());
        set("metering", conf.metering_options.is_some());
        set("gateway", conf.gateway_options.is_some());
        set("gpu", conf.gpu_options.is_some());
        set("terminal", conf.terminal_options.is_some());

        result
    }

    /// 从平台配置 ConfigMap 中读取配置
    pub fn from_config_map(cm: &ConfigMap) -> Result<Self> {
        let value = cm
            .data
            .as_ref()
            .and_then(|data| data.get(CONFIG_MAP_DATA_KEY))
            .ok_or_else(|| Error::Config(format!("ConfigMap 中缺少 {}", CONFIG_MAP_DATA_KEY)))?;
        serde_yaml::from_str(value)
            .map_err(|e| Error::Config(format!("解析 ConfigMap 中的配置失败: {}", e)))
    }

    /// weave scope 地址，未配置时为 None
    pub fn weave_scope_host(&self) -> Option<&str> {
        self.network_options
            .as_ref()
            .map(|n| n.weave_scope_host.as_str())
            .filter(|host| !host.is_empty())
    }
}

/// 配置管理器
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// 按顺序查找配置文件的目录
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(vec![
            PathBuf::from(DEFAULT_CONFIGURATION_PATH),
            PathBuf::from("."),
        ])
    }
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// 查找第一个存在的配置文件
    pub fn resolve(&self) -> Option<PathBuf> {
        self.search_paths.iter().find_map(|dir| {
            CONFIG_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", DEFAULT_CONFIGURATION_NAME, ext)))
                .find(|path| path.is_file())
        })
    }

    /// 加载配置，配置文件不存在时使用默认值与环境变量
    pub fn load(&self) -> Result<Config> {
        let defaults = RawConfig::try_from(&Config::default())
            .map_err(|e| Error::Config(format!("构建默认配置失败: {}", e)))?;

        let mut builder = RawConfig::builder().add_source(defaults);
        match self.resolve() {
            Some(path) => {
                debug!("从 {} 加载配置", path.display());
                builder = builder.add_source(File::from(path.as_path()).required(true));
            }
            None => {
                info!("未找到配置文件 {}，使用默认配置", DEFAULT_CONFIGURATION_NAME);
            }
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .convert_case(Case::Camel),
        );

        let mut config = builder
            .build()
            .map_err(|e| Error::Config(format!("构建配置失败: {}", e)))?
            .try_deserialize::<Config>()
            .map_err(|e| Error::Config(format!("配置格式错误: {}", e)))?;
        config.fill_defaults();
        Ok(config)
    }

    /// 监听配置文件，变更后重新加载并通过通道发送新配置
    ///
    /// 返回的监听器被丢弃后停止监听。重新加载失败时保留旧配置。
    pub fn watch(&self) -> Result<(RecommendedWatcher, mpsc::Receiver<Config>)> {
        let path = self
            .resolve()
            .ok_or_else(|| Error::Config("没有可监听的配置文件".to_string()))?;
        let (tx, rx) = mpsc::channel(4);
        let manager = self.clone();
        let file_name = path.file_name().map(|name| name.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                if !event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name)
                {
                    return;
                }
                info!("检测到配置文件变更，正在重新加载...");
                match manager.load() {
                    Ok(config) => {
                        if tx.blocking_send(config).is_err() {
                            debug!("配置变更接收端已关闭");
                        }
                    }
                    Err(e) => warn!("重新加载配置失败，继续使用旧配置: {}", e),
                }
            }
            Err(e) => error!("监听配置文件错误: {}", e),
        })
        .map_err(|e| Error::Config(format!("创建配置监听器失败: {}", e)))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Config(format!("监听目录 {} 失败: {}", dir.display(), e)))?;
        info!("开始监听配置文件 {}", path.display());

        Ok((watcher, rx))
    }
}

/// 从默认位置加载配置
pub fn try_load_from_disk() -> Result<Config> {
    ConfigManager::default().load()
}

/// 给定目录下的默认配置文件路径
pub fn config_file_in(dir: &Path) -> PathBuf {
    dir.join(format!("{}.yaml", DEFAULT_CONFIGURATION_NAME))
}
