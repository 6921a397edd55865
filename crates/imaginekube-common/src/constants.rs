//! 全局常量
//!
//! 标签键、注解键、系统命名空间与 API 文档标签等在各模块间共享的常量。

/// 系统命名空间
pub const KUBE_SYSTEM_NAMESPACE: &str = "kube-system";
pub const OPENPITRIX_NAMESPACE: &str = "openpitrix-system";
pub const DEVOPS_NAMESPACE: &str = "imaginekube-devops-system";
pub const ISTIO_NAMESPACE: &str = "istio-system";
pub const MONITORING_NAMESPACE: &str = "imaginekube-monitoring-system";
pub const LOGGING_NAMESPACE: &str = "imaginekube-logging-system";
pub const IMAGINEKUBE_NAMESPACE: &str = "imaginekube-system";
pub const CONTROLS_NAMESPACE: &str = "imaginekube-controls-system";
pub const PORTER_NAMESPACE: &str = "porter-system";
pub const INGRESS_CONTROLLER_NAMESPACE: &str = CONTROLS_NAMESPACE;

/// 所有平台系统命名空间
pub const SYSTEM_NAMESPACES: &[&str] = &[
    IMAGINEKUBE_NAMESPACE,
    LOGGING_NAMESPACE,
    MONITORING_NAMESPACE,
    OPENPITRIX_NAMESPACE,
    KUBE_SYSTEM_NAMESPACE,
    ISTIO_NAMESPACE,
    DEVOPS_NAMESPACE,
    PORTER_NAMESPACE,
];

/// 内置管理员用户名
pub const ADMIN_USER_NAME: &str = "admin";
/// 平台管理员全局角色
pub const PLATFORM_ADMIN_ROLE: &str = "platform-admin";
pub const INGRESS_CONTROLLER_PREFIX: &str = "imaginekube-router-";

/// 平台配置所在的 ConfigMap
pub const CONFIG_NAME: &str = "imaginekube-config";
pub const CONFIG_MAP_DATA_KEY: &str = "imaginekube.yaml";

/// 资源标签键
pub const CLUSTER_NAME_LABEL_KEY: &str = "imaginekube.com/cluster";
pub const NAME_LABEL_KEY: &str = "imaginekube.com/name";
pub const WORKSPACE_LABEL_KEY: &str = "imaginekube.com/workspace";
pub const NAMESPACE_LABEL_KEY: &str = "imaginekube.com/namespace";
pub const USERNAME_LABEL_KEY: &str = "imaginekube.com/username";
pub const DEVOPS_PROJECT_LABEL_KEY: &str = "imaginekube.com/devopsproject";
pub const KUBEFED_MANAGED_LABEL: &str = "kubefed.io/managed";
pub const DISPLAY_NAME_ANNOTATION_KEY: &str = "imaginekube.com/alias-name";
pub const CREATOR_ANNOTATION_KEY: &str = "imaginekube.com/creator";

/// 应用商店标签键
pub const CHART_REPO_ID_LABEL_KEY: &str = "application.imaginekube.com/repo-id";
pub const CHART_APPLICATION_ID_LABEL_KEY: &str = "application.imaginekube.com/app-id";
pub const CHART_APPLICATION_VERSION_ID_LABEL_KEY: &str = "application.imaginekube.com/app-version-id";
pub const CATEGORY_ID_LABEL_KEY: &str = "application.imaginekube.com/app-category-id";
pub const DANGLING_APP_CLEANUP_KEY: &str = "application.imaginekube.com/app-cleanup";
pub const CLEANUP_DANGLING_APP_ONGOING: &str = "ongoing";
pub const CLEANUP_DANGLING_APP_DONE: &str = "done";
/// Helm 仓库最小同步周期（秒）
pub const HELM_REPO_MIN_SYNC_PERIOD: u64 = 180;

pub const APPLICATION_RELEASE_NAME: &str = "meta.helm.sh/release-name";
pub const APPLICATION_RELEASE_NS: &str = "meta.helm.sh/release-namespace";
pub const APPLICATION_NAME: &str = "app.kubernetes.io/name";
pub const APPLICATION_VERSION: &str = "app.kubernetes.io/version";

pub const NOTIFICATION_SECRET_NAMESPACE: &str = "imaginekube-monitoring-federated";
pub const NOTIFICATION_MANAGED_LABEL: &str = "notification.imaginekube.com/managed";

/// 存储卷自动扩容相关注解
pub const AUTO_RESTART_ENABLED_KEY: &str = "restart.imaginekube.com/enabled";
pub const SUPPORT_ONLINE_RESIZE: &str = "restart.imaginekube.com/online-expansion-support";
pub const RESTART_SKIP: &str = "restart.imaginekube.com/skip";
pub const RESIZING_MAX_TIME: &str = "restart.imaginekube.com/max-time";
pub const RESTART_STAGE: &str = "restart.imaginekube.com/stage";
pub const RESTART_STOP_TIME: &str = "restart.imaginekube.com/stop-time";
pub const EXPECT_REPLICA_NUMS: &str = "restart.imaginekube.com/replica-nums";
pub const DEFAULT_THRESHOLD: &str = "10%";
pub const DEFAULT_INODES_THRESHOLD: &str = "10%";
pub const DEFAULT_INCREASE: &str = "10%";

/// 认证代理注入的用户名请求头
pub const USER_NAME_HEADER: &str = "X-Token-Username";

/// API 文档标签
pub const WORKSPACE_TAG: &str = "Workspace";
pub const NAMESPACE_TAG: &str = "Namespace";
pub const NETWORK_TOPOLOGY_TAG: &str = "Network Topology";
pub const OPENPITRIX_TAG: &str = "OpenPitrix Resources";
pub const OPENPITRIX_APP_INSTANCE_TAG: &str = "App Instance";
pub const OPENPITRIX_APP_TEMPLATE_TAG: &str = "App Template";
pub const OPENPITRIX_REPOSITORY_TAG: &str = "Repository";
pub const NAMESPACE_RESOURCES_TAG: &str = "Namespace Resources";
pub const CLUSTER_RESOURCES_TAG: &str = "Cluster Resources";

/// 判断命名空间是否为平台系统命名空间
pub fn is_system_namespace(namespace: &str) -> bool {
    SYSTEM_NAMESPACES.contains(&namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_system_namespace() {
        assert!(is_system_namespace("kube-system"));
        assert!(is_system_namespace(IMAGINEKUBE_NAMESPACE));
        assert!(!is_system_namespace("default"));
    }
}
