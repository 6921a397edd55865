//! 自定义资源定义模块
//!
//! ImagineKube 的租户与应用商店自定义资源，均为集群级资源。
//! 只声明 API Server 读取和写入时用到的字段。

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta, Time};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// 企业空间规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "tenant.imaginekube.com", version = "v1alpha1", kind = "Workspace")]
#[kube(status = "WorkspaceStatus", schema = "disabled")]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSpec {
    /// 企业空间管理员
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    /// 是否开启网络隔离
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_isolation: Option<bool>,
}

/// 企业空间状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WorkspaceStatus {}

/// 企业空间模板中的企业空间定义
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct WorkspaceTemplateBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,
    #[serde(default)]
    pub spec: WorkspaceSpec,
}

/// 多集群部署目标
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClusterReference {
    pub name: String,
}

/// 企业空间的集群放置策略
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<ClusterReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_selector: Option<LabelSelector>,
}

/// 企业空间模板规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "tenant.imaginekube.com", version = "v1alpha2", kind = "WorkspaceTemplate")]
#[kube(schema = "disabled")]
pub struct WorkspaceTemplateSpec {
    #[serde(default)]
    pub template: WorkspaceTemplateBody,
    #[serde(default)]
    pub placement: Placement,
}

/// Helm 应用规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "application.imaginekube.com", version = "v1alpha1", kind = "HelmApplication")]
#[kube(status = "HelmApplicationStatus", schema = "disabled")]
#[serde(rename_all = "camelCase")]
pub struct HelmApplicationSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub abstraction: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_home: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
}

/// Helm 应用状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmApplicationStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_time: Option<Time>,
}

/// Chart 元数据
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub home: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub icon: String,
}

/// Helm 应用版本规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "application.imaginekube.com", version = "v1alpha1", kind = "HelmApplicationVersion")]
#[kube(status = "HelmApplicationVersionStatus", schema = "disabled")]
#[serde(rename_all = "camelCase")]
pub struct HelmApplicationVersionSpec {
    #[serde(default)]
    pub metadata: ChartMetadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Time>,
}

/// Helm 应用版本状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct HelmApplicationVersionStatus {
    #[serde(default)]
    pub state: String,
}

/// Helm 发布规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "application.imaginekube.com", version = "v1alpha1", kind = "HelmRelease")]
#[kube(status = "HelmReleaseStatus", schema = "disabled")]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_version_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub chart_app_ver: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub version: i64,
}

/// Helm 发布状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseStatus {
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<Time>,
}

/// Helm 仓库访问凭据
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmRepoCredential {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cert_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key_file: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ca_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_skip_tls_verify: Option<bool>,
    #[serde(default, rename = "s3Config", skip_serializing_if = "Option::is_none")]
    pub s3_config: Option<S3Config>,
}

/// S3 仓库访问凭据
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    #[serde(default, rename = "accessKeyID")]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
}

/// Helm 仓库规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "application.imaginekube.com", version = "v1alpha1", kind = "HelmRepo")]
#[kube(status = "HelmRepoStatus", schema = "disabled")]
#[serde(rename_all = "camelCase")]
pub struct HelmRepoSpec {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub credential: HelmRepoCredential,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// 同步周期（秒），0 表示不自动同步
    #[serde(default)]
    pub sync_period: i64,
    #[serde(default)]
    pub version: i64,
}

/// Helm 仓库状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HelmRepoStatus {
    /// 仓库索引内容，体积较大，对外返回前清空
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<Time>,
}

/// 应用分类规范
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[kube(group = "application.imaginekube.com", version = "v1alpha1", kind = "HelmCategory")]
#[kube(status = "HelmCategoryStatus", schema = "disabled")]
pub struct HelmCategorySpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub locale: String,
}

/// 应用分类状态
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct HelmCategoryStatus {
    #[serde(default)]
    pub total: i64,
}
