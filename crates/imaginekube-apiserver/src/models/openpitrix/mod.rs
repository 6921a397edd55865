//! OpenPitrix 应用商店模型（v2alpha1）
//!
//! 应用模板、应用版本、应用实例、应用仓库与应用分类的只读查询，
//! 全部基于 informer 缓存。

mod applications;
mod categories;
mod release;
mod repos;

pub use applications::ApplicationOperator;
pub use categories::CategoryOperator;
pub use release::ReleaseOperator;
pub use repos::RepoOperator;

use crate::informers::InformerFactory;
use imaginekube_common::models::query::FIELD_STATUS;
use imaginekube_common::{Labels, ListResult, Query, Result};
use kube::Resource;
use serde::Serialize;

/// 应用商店操作集合
pub struct OpenPitrixOperator {
    pub applications: ApplicationOperator,
    pub categories: CategoryOperator,
    pub releases: ReleaseOperator,
    pub repos: RepoOperator,
}

impl OpenPitrixOperator {
    pub fn new(factory: &InformerFactory) -> Self {
        Self {
            applications: ApplicationOperator::new(factory),
            categories: CategoryOperator::new(factory),
            releases: ReleaseOperator::new(factory),
            repos: RepoOperator::new(factory),
        }
    }
}

/// 把非空的范围标签并入查询的标签选择器
///
/// 选择器本身必须是等值约束，否则返回 BadRequest。
fn scoped_query(query: &Query, scope: &[(&str, &str)]) -> Result<Query> {
    let extra: Labels = scope
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let mut scoped = query.clone();
    scoped.merge_label_selector(&extra)?;
    Ok(scoped)
}

/// 状态过滤，取值可用 `|` 分隔多个状态
fn state_matches(state: &str, value: &str) -> bool {
    value.split('|').any(|candidate| candidate == state)
}

fn status_filter<K: Resource>(state: Option<&str>, obj: &K, field: &str, value: &str) -> bool {
    match field {
        FIELD_STATUS => state_matches(state.unwrap_or_default(), value),
        _ => crate::resources::default_filter(obj, field, value),
    }
}

/// 列表查询时忽略资源不存在的错误
fn ignore_not_found(result: Result<ListResult>) -> Result<ListResult> {
    match result {
        Err(e) if e.is_not_found() => Ok(ListResult::default()),
        other => other,
    }
}

fn to_list_result<K: Serialize>(objects: Vec<K>, total: usize) -> Result<ListResult> {
    let items = objects
        .into_iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ListResult::new(items, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use imaginekube_common::constants::{CLUSTER_NAME_LABEL_KEY, WORKSPACE_LABEL_KEY};
    use imaginekube_common::Error;

    #[test]
    fn test_scoped_query() {
        let query = Query::new().with_label_selector("app=web");
        let scoped = scoped_query(
            &query,
            &[(WORKSPACE_LABEL_KEY, "demo"), (CLUSTER_NAME_LABEL_KEY, "")],
        )
        .unwrap();
        assert_eq!(scoped.label_selector, "app=web,imaginekube.com/workspace=demo");
        assert_eq!(query.label_selector, "app=web");

        let unchanged = scoped_query(&query, &[(WORKSPACE_LABEL_KEY, "")]).unwrap();
        assert_eq!(unchanged.label_selector, "app=web");

        let invalid = Query::new().with_label_selector("app in (web)");
        assert!(matches!(
            scoped_query(&invalid, &[(WORKSPACE_LABEL_KEY, "demo")]),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn test_state_matches() {
        assert!(state_matches("active", "active|suspended"));
        assert!(!state_matches("draft", "active|suspended"));
    }

    #[test]
    fn test_ignore_not_found() {
        let result = ignore_not_found(Err(Error::not_found("helmreleases", "x"))).unwrap();
        assert_eq!(result.total_items, 0);
        assert!(ignore_not_found(Err(Error::BadRequest("x".to_string()))).is_err());
    }
}
