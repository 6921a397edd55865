//! 应用实例（Helm 发布）

use super::{ignore_not_found, scoped_query, status_filter};
use crate::crd::HelmRelease;
use crate::informers::InformerFactory;
use crate::resources::{CachedResource, Interface};
use imaginekube_common::constants::{
    CLUSTER_NAME_LABEL_KEY, NAMESPACE_LABEL_KEY, WORKSPACE_LABEL_KEY,
};
use imaginekube_common::{ListResult, Query, Result};
use tracing::error;

fn filter_release(release: &HelmRelease, field: &str, value: &str) -> bool {
    let state = release.status.as_ref().map(|status| status.state.as_str());
    status_filter(state, release, field, value)
}

/// 应用实例查询
pub struct ReleaseOperator {
    releases: CachedResource<HelmRelease>,
}

impl ReleaseOperator {
    pub fn new(factory: &InformerFactory) -> Self {
        Self {
            releases: CachedResource::new("helmreleases", factory.store::<HelmRelease>())
                .with_filter(filter_release),
        }
    }

    /// 列出应用实例，按企业空间、集群和命名空间收窄
    pub fn list_applications(
        &self,
        workspace: &str,
        cluster: &str,
        namespace: &str,
        query: &Query,
    ) -> Result<ListResult> {
        let query = scoped_query(
            query,
            &[
                (WORKSPACE_LABEL_KEY, workspace),
                (CLUSTER_NAME_LABEL_KEY, cluster),
                (NAMESPACE_LABEL_KEY, namespace),
            ],
        )
        .map_err(|e| {
            error!("解析标签选择器失败: {}", e);
            e
        })?;
        ignore_not_found(self.releases.list("", &query)).map_err(|e| {
            error!("列出应用实例失败: {}", e);
            e
        })
    }

    /// 获取应用实例
    pub fn describe_application(&self, id: &str) -> Result<HelmRelease> {
        self.releases.get_object("", id).map_err(|e| {
            error!("获取应用实例 {} 失败: {}", id, e);
            e
        })
    }
}
