//! 应用仓库
//!
//! 仓库索引数据和访问凭据不对外返回。

use super::{scoped_query, to_list_result};
use crate::crd::{HelmRepo, HelmRepoCredential};
use crate::informers::InformerFactory;
use crate::resources::CachedResource;
use imaginekube_common::constants::WORKSPACE_LABEL_KEY;
use imaginekube_common::{ListResult, Query, Result};
use tracing::error;

fn strip_data(mut repo: HelmRepo) -> HelmRepo {
    if let Some(status) = repo.status.as_mut() {
        status.data.clear();
    }
    repo
}

/// 应用仓库查询
pub struct RepoOperator {
    repos: CachedResource<HelmRepo>,
}

impl RepoOperator {
    pub fn new(factory: &InformerFactory) -> Self {
        Self {
            repos: CachedResource::new("helmrepos", factory.store::<HelmRepo>())
                .with_transform(strip_data),
        }
    }

    /// 列出仓库，同时清除凭据
    pub fn list_repos(&self, workspace: &str, query: &Query) -> Result<ListResult> {
        let query = if workspace.is_empty() {
            query.clone()
        } else {
            scoped_query(query, &[(WORKSPACE_LABEL_KEY, workspace)]).map_err(|e| {
                error!("解析标签选择器失败: {}", e);
                e
            })?
        };
        let (repos, total) = self.repos.list_objects("", &query).map_err(|e| {
            error!("列出应用仓库失败: {}", e);
            e
        })?;
        let repos = repos
            .into_iter()
            .map(|mut repo| {
                repo.spec.credential = HelmRepoCredential::default();
                repo
            })
            .collect();
        to_list_result(repos, total)
    }

    /// 获取仓库
    pub fn describe_repo(&self, id: &str) -> Result<HelmRepo> {
        self.repos.get_object("", id).map_err(|e| {
            error!("获取应用仓库 {} 失败: {}", id, e);
            e
        })
    }
}
