//! 外部服务配置项
//!
//! 每个外部服务一组配置，字段名与配置文件中的 camelCase 键一致，
//! 时间类字段使用 `30s`、`24h` 这样的可读格式。

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// 可读时长的序列化
pub mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom)
    }

    /// 可选时长
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S: Serializer>(
            value: &Option<Duration>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Duration>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => humantime::parse_duration(raw.trim())
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }
}

/// Jenkins 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DevopsOptions {
    pub host: String,
    pub username: String,
    pub password: String,
    pub max_connections: i32,
}

impl Default for DevopsOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            password: String::new(),
            max_connections: 100,
        }
    }
}

/// SonarQube 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SonarQubeOptions {
    pub host: String,
    pub token: String,
}

/// Kubernetes 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubernetesOptions {
    /// kubeconfig 路径，为空时使用默认推断
    #[serde(rename = "kubeconfig", alias = "kubeConfig")]
    pub kube_config: String,
    /// API Server 地址，覆盖 kubeconfig 中的地址
    pub master: String,
    pub qps: f32,
    pub burst: i32,
}

impl Default for KubernetesOptions {
    fn default() -> Self {
        Self {
            kube_config: String::new(),
            master: String::new(),
            qps: 1e6,
            burst: 1_000_000,
        }
    }
}

/// 服务网格配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServiceMeshOptions {
    pub istio_pilot_host: String,
    pub jaeger_query_host: String,
    pub servicemesh_prometheus_host: String,
}

/// IP 池类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpPoolType {
    #[default]
    None,
    Calico,
}

/// 命名空间网络策略配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NsnpOptions {
    pub allowed_ingress_namespaces: Vec<String>,
}

/// 网络配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkOptions {
    pub enable_network_policy: bool,
    pub nsnp_options: NsnpOptions,
    /// weave scope 服务地址，设置后启用网络拓扑接口
    pub weave_scope_host: String,
    #[serde(rename = "ippoolType")]
    pub ippool_type: IpPoolType,
}

impl NetworkOptions {
    /// 未启用任何网络功能
    pub fn is_empty(&self) -> bool {
        !self.enable_network_policy
            && self.weave_scope_host.is_empty()
            && self.ippool_type == IpPoolType::None
    }
}

/// LDAP 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LdapOptions {
    pub host: String,
    #[serde(rename = "managerDN", alias = "managerDn")]
    pub manager_dn: String,
    pub manager_password: String,
    pub user_search_base: String,
    pub group_search_base: String,
    pub initial_cap: i32,
    pub max_cap: i32,
    pub pool_name: String,
}

impl Default for LdapOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            manager_dn: "cn=admin,dc=example,dc=org".to_string(),
            manager_password: String::new(),
            user_search_base: "ou=Users,dc=example,dc=org".to_string(),
            group_search_base: "ou=Groups,dc=example,dc=org".to_string(),
            initial_cap: 10,
            max_cap: 100,
            pool_name: "ldap".to_string(),
        }
    }
}

/// 缓存配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    #[serde(rename = "type")]
    pub kind: String,
    pub options: BTreeMap<String, Value>,
}

/// S3 对象存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct S3Options {
    pub endpoint: String,
    pub region: String,
    #[serde(rename = "disableSSL", alias = "disableSsl")]
    pub disable_ssl: bool,
    pub force_path_style: bool,
    #[serde(rename = "accessKeyID", alias = "accessKeyId")]
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub bucket: String,
}

impl Default for S3Options {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: "us-east-1".to_string(),
            disable_ssl: true,
            force_path_style: true,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: String::new(),
            bucket: "s2i-binaries".to_string(),
        }
    }
}

/// Helm 发布控制器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReleaseControllerOptions {
    pub max_concurrent: i32,
    #[serde(with = "duration")]
    pub wait_time: Duration,
}

impl Default for ReleaseControllerOptions {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            wait_time: Duration::from_secs(30),
        }
    }
}

/// 应用商店配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenPitrixOptions {
    #[serde(rename = "s3", skip_serializing_if = "Option::is_none")]
    pub s3_options: Option<S3Options>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_controller_options: Option<ReleaseControllerOptions>,
}

impl Default for OpenPitrixOptions {
    fn default() -> Self {
        Self {
            s3_options: Some(S3Options::default()),
            release_controller_options: Some(ReleaseControllerOptions::default()),
        }
    }
}

impl OpenPitrixOptions {
    /// 应用商店存储未配置
    pub fn app_store_conf_is_empty(&self) -> bool {
        self.s3_options
            .as_ref()
            .map(|s3| s3.endpoint.is_empty())
            .unwrap_or(true)
    }
}

/// 监控配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MonitoringOptions {
    pub endpoint: String,
}

/// Elasticsearch 类后端的公共配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElasticOptions {
    pub host: String,
    pub basic_auth: bool,
    pub username: String,
    pub password: String,
    pub index_prefix: String,
    pub version: String,
}

impl Default for ElasticOptions {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

impl ElasticOptions {
    fn with_prefix(prefix: &str) -> Self {
        Self {
            host: String::new(),
            basic_auth: false,
            username: String::new(),
            password: String::new(),
            index_prefix: prefix.to_string(),
            version: String::new(),
        }
    }
}

/// 日志查询配置
pub type LoggingOptions = ElasticOptions;
/// 事件查询配置
pub type EventsOptions = ElasticOptions;

/// 审计配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditingOptions {
    pub enable: bool,
    pub webhook_url: String,
    pub host: String,
    pub basic_auth: bool,
    pub username: String,
    pub password: String,
    pub index_prefix: String,
    pub version: String,
}

impl Default for AuditingOptions {
    fn default() -> Self {
        Self {
            enable: false,
            webhook_url: String::new(),
            host: String::new(),
            basic_auth: false,
            username: String::new(),
            password: String::new(),
            index_prefix: "ks-logstash-auditing".to_string(),
            version: String::new(),
        }
    }
}

/// OAuth 客户端
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuthClient {
    pub name: String,
    pub secret: String,
    pub respond_with_challenges: bool,
    #[serde(rename = "redirectURIs", alias = "redirectUris")]
    pub redirect_uris: Vec<String>,
    pub grant_method: String,
    #[serde(with = "duration::option", skip_serializing_if = "Option::is_none")]
    pub access_token_max_age: Option<Duration>,
    #[serde(with = "duration::option", skip_serializing_if = "Option::is_none")]
    pub access_token_inactivity_timeout: Option<Duration>,
}

/// 身份提供方
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdentityProviderOptions {
    pub name: String,
    pub mapping_method: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub provider: BTreeMap<String, Value>,
}

/// OAuth 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OAuthOptions {
    pub issuer: String,
    pub identity_providers: Vec<IdentityProviderOptions>,
    pub clients: Vec<OAuthClient>,
    #[serde(with = "duration")]
    pub access_token_max_age: Duration,
    #[serde(with = "duration")]
    pub access_token_inactivity_timeout: Duration,
}

impl Default for OAuthOptions {
    fn default() -> Self {
        Self {
            issuer: "imaginekube".to_string(),
            identity_providers: Vec::new(),
            clients: Vec::new(),
            access_token_max_age: Duration::from_secs(2 * 3600),
            access_token_inactivity_timeout: Duration::ZERO,
        }
    }
}

/// 认证配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub authenticate_rate_limiter_max_tries: i32,
    #[serde(with = "duration")]
    pub authenticate_rate_limiter_duration: Duration,
    #[serde(with = "duration")]
    pub login_history_retention_period: Duration,
    pub login_history_maximum_entries: i32,
    pub multiple_login: bool,
    pub jwt_secret: String,
    #[serde(rename = "oauthOptions")]
    pub oauth_options: OAuthOptions,
}

impl Default for AuthenticationOptions {
    fn default() -> Self {
        Self {
            authenticate_rate_limiter_max_tries: 5,
            authenticate_rate_limiter_duration: Duration::from_secs(30 * 60),
            login_history_retention_period: Duration::from_secs(7 * 24 * 3600),
            login_history_maximum_entries: 100,
            multiple_login: false,
            jwt_secret: String::new(),
            oauth_options: OAuthOptions::default(),
        }
    }
}

/// 授权配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorizationOptions {
    /// 授权模式：RBAC、AlwaysAllow、AlwaysDeny
    pub mode: String,
}

impl Default for AuthorizationOptions {
    fn default() -> Self {
        Self {
            mode: "RBAC".to_string(),
        }
    }
}

/// 多集群配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiClusterOptions {
    pub enable: bool,
    pub agent_image: String,
    #[serde(with = "duration")]
    pub cluster_controller_resync_period: Duration,
    pub host_cluster_name: String,
}

impl Default for MultiClusterOptions {
    fn default() -> Self {
        Self {
            enable: false,
            agent_image: "imaginekube/tower:v1.0".to_string(),
            cluster_controller_resync_period: Duration::from_secs(120),
            host_cluster_name: "host".to_string(),
        }
    }
}

/// 告警配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlertingOptions {
    pub endpoint: String,
    pub prometheus_endpoint: String,
    pub thanos_ruler_endpoint: String,
    pub thanos_rule_resource_labels: String,
}

/// 仅含访问地址的服务配置：通知、KubeEdge、边缘运行时
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EndpointOptions {
    pub endpoint: String,
}

pub type NotificationOptions = EndpointOptions;
pub type KubeEdgeOptions = EndpointOptions;
pub type EdgeRuntimeOptions = EndpointOptions;

/// 计量配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MeteringOptions {
    pub retention_day: String,
}

impl Default for MeteringOptions {
    fn default() -> Self {
        Self {
            retention_day: "7d".to_string(),
        }
    }
}

/// 网关配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayOptions {
    pub watches_path: String,
    pub namespace: String,
    pub repository: String,
    pub tag: String,
}

/// GPU 类型
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GpuKind {
    pub resource_name: String,
    pub resource_type: String,
    pub default: bool,
}

/// GPU 配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GpuOptions {
    pub kinds: Vec<GpuKind>,
}

/// Web 终端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TerminalOptions {
    pub image: String,
    /// 超时秒数
    pub timeout: u64,
}

impl Default for TerminalOptions {
    fn default() -> Self {
        Self {
            image: "alpine:3.15".to_string(),
            timeout: 600,
        }
    }
}

/// 创建默认日志查询配置
pub fn create_default_logging_options() -> LoggingOptions {
    ElasticOptions::with_prefix("ks-logstash-log")
}

/// 创建默认事件查询配置
pub fn create_default_events_options() -> EventsOptions {
    ElasticOptions::with_prefix("ks-logstash-events")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_is_empty() {
        let mut network = NetworkOptions::default();
        assert!(network.is_empty());
        network.ippool_type = IpPoolType::Calico;
        assert!(!network.is_empty());
    }

    #[test]
    fn test_app_store_conf_is_empty() {
        let mut options = OpenPitrixOptions::default();
        assert!(options.app_store_conf_is_empty());
        options.s3_options = Some(S3Options {
            endpoint: "http://minio.openpitrix-system.svc".to_string(),
            ..S3Options::default()
        });
        assert!(!options.app_store_conf_is_empty());
        options.s3_options = None;
        assert!(options.app_store_conf_is_empty());
    }

    #[test]
    fn test_duration_fields_are_human_readable() {
        let options = ReleaseControllerOptions::default();
        let encoded = serde_yaml::to_string(&options).unwrap();
        assert!(encoded.contains("waitTime: 30s"));

        let decoded: ReleaseControllerOptions =
            serde_yaml::from_str("maxConcurrent: 3\nwaitTime: 2m\n").unwrap();
        assert_eq!(decoded.max_concurrent, 3);
        assert_eq!(decoded.wait_time, Duration::from_secs(120));
    }

    #[test]
    fn test_optional_duration() {
        let client: OAuthClient =
            serde_yaml::from_str("name: console\naccessTokenMaxAge: 24h\n").unwrap();
        assert_eq!(client.access_token_max_age, Some(Duration::from_secs(86400)));
        assert_eq!(client.access_token_inactivity_timeout, None);
    }
}
