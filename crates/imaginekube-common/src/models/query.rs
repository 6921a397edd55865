//! 列表查询模型
//!
//! 解析列表请求中的分页、排序、标签选择器与过滤条件参数。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::selector::{self, LabelSelector, Labels};
use crate::error::Result;

/// 查询参数名
pub const PARAMETER_NAME: &str = "name";
pub const PARAMETER_LABEL_SELECTOR: &str = "labelSelector";
pub const PARAMETER_FIELD_SELECTOR: &str = "fieldSelector";
pub const PARAMETER_PAGE: &str = "page";
pub const PARAMETER_LIMIT: &str = "limit";
pub const PARAMETER_ORDER_BY: &str = "sortBy";
pub const PARAMETER_ASCENDING: &str = "ascending";

/// 过滤与排序字段
pub const FIELD_NAME: &str = "name";
pub const FIELD_NAMES: &str = "names";
pub const FIELD_UID: &str = "uid";
pub const FIELD_CREATION_TIMESTAMP: &str = "creationTimestamp";
pub const FIELD_CREATE_TIME: &str = "createTime";
pub const FIELD_LAST_UPDATE_TIMESTAMP: &str = "lastUpdateTimestamp";
pub const FIELD_LABEL: &str = "label";
pub const FIELD_ANNOTATIONS: &str = "annotation";
pub const FIELD_NAMESPACE: &str = "namespace";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_OWNER_REFERENCE: &str = "ownerReference";
pub const FIELD_OWNER_KIND: &str = "ownerKind";
pub const FIELD_TYPE: &str = "type";
pub const FIELD_NODE_NAME: &str = "nodeName";

/// 不分页时的 limit 取值
pub const NO_PAGINATION_LIMIT: i64 = -1;

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// 每页条数，-1 表示不分页
    pub limit: i64,
    /// 起始偏移
    pub offset: i64,
}

impl Pagination {
    /// 创建新的分页参数
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// 不分页
    pub fn none() -> Self {
        Self::new(NO_PAGINATION_LIMIT, 0)
    }

    /// 根据总数计算有效的切片区间 `[start, end)`
    pub fn valid_range(&self, total: usize) -> (usize, usize) {
        if self.limit == NO_PAGINATION_LIMIT {
            return (0, total);
        }
        let total_i = total as i64;
        if self.limit < 0 || self.offset < 0 || self.offset > total_i {
            return (0, 0);
        }
        let end = self.offset.saturating_add(self.limit).min(total_i);
        (self.offset as usize, end as usize)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::none()
    }
}

/// 页码换算为偏移，溢出时取最大值，即超出任何列表的末尾
fn page_offset(limit: i64, page: i64) -> i64 {
    if limit > 0 {
        (page.max(1) - 1).saturating_mul(limit)
    } else {
        0
    }
}

/// 列表查询条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// 分页
    pub pagination: Pagination,
    /// 排序字段
    pub sort_by: String,
    /// 是否升序
    pub ascending: bool,
    /// 过滤条件，字段名到取值
    pub filters: BTreeMap<String, String>,
    /// 标签选择器原文
    pub label_selector: String,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            pagination: Pagination::none(),
            sort_by: FIELD_CREATION_TIMESTAMP.to_string(),
            ascending: false,
            filters: BTreeMap::new(),
            label_selector: String::new(),
        }
    }
}

impl Query {
    /// 创建默认查询条件
    pub fn new() -> Self {
        Self::default()
    }

    /// 从请求参数解析查询条件
    ///
    /// 同名参数出现多次时取最后一个，非保留参数全部作为过滤条件。
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Self::default();
        let mut page: i64 = 1;
        let mut limit: i64 = NO_PAGINATION_LIMIT;

        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                PARAMETER_PAGE => page = value.parse().unwrap_or(1),
                PARAMETER_LIMIT => limit = value.parse().unwrap_or(NO_PAGINATION_LIMIT),
                PARAMETER_ORDER_BY => {
                    if !value.is_empty() {
                        query.sort_by = value.to_string();
                    }
                }
                PARAMETER_ASCENDING => query.ascending = value.parse().unwrap_or(false),
                PARAMETER_LABEL_SELECTOR => query.label_selector = value.to_string(),
                _ => {
                    query.filters.insert(key.to_string(), value.to_string());
                }
            }
        }

        query.pagination = Pagination::new(limit, page_offset(limit, page));
        query
    }

    /// 设置过滤条件
    pub fn with_filter(mut self, field: &str, value: &str) -> Self {
        self.filters.insert(field.to_string(), value.to_string());
        self
    }

    /// 设置分页
    pub fn with_pagination(mut self, limit: i64, page: i64) -> Self {
        self.pagination = Pagination::new(limit, page_offset(limit, page));
        self
    }

    /// 设置排序
    pub fn with_sort(mut self, sort_by: &str, ascending: bool) -> Self {
        self.sort_by = sort_by.to_string();
        self.ascending = ascending;
        self
    }

    /// 设置标签选择器
    pub fn with_label_selector(mut self, selector: &str) -> Self {
        self.label_selector = selector.to_string();
        self
    }

    /// 解析后的标签选择器，无法解析时匹配一切
    pub fn selector(&self) -> LabelSelector {
        match LabelSelector::parse(&self.label_selector) {
            Ok(selector) => selector,
            Err(e) => {
                warn!("忽略无效的标签选择器 {}: {}", self.label_selector, e);
                LabelSelector::default()
            }
        }
    }

    /// 将额外的等值标签合并进标签选择器
    ///
    /// 现有选择器必须只包含等值约束。
    pub fn merge_label_selector(&mut self, extra: &Labels) -> Result<()> {
        let current = selector::labels_from_selector(&self.label_selector)?;
        if extra.is_empty() {
            return Ok(());
        }
        let merged = selector::merge_labels(current, extra);
        self.label_selector = selector::labels_to_selector(&merged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_query() {
        let query = Query::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(query.pagination, Pagination::none());
        assert_eq!(query.sort_by, FIELD_CREATION_TIMESTAMP);
        assert!(!query.ascending);
        assert!(query.filters.is_empty());
    }

    #[test]
    fn test_parse_query_parameters() {
        let query = Query::from_pairs([
            ("page", "3"),
            ("limit", "10"),
            ("sortBy", "name"),
            ("ascending", "true"),
            ("labelSelector", "app=nginx"),
            ("name", "web"),
            ("status", "running"),
            ("status", "stopped"),
        ]);
        assert_eq!(query.pagination, Pagination::new(10, 20));
        assert_eq!(query.sort_by, "name");
        assert!(query.ascending);
        assert_eq!(query.label_selector, "app=nginx");
        assert_eq!(query.filters.get("name").map(String::as_str), Some("web"));
        assert_eq!(query.filters.get("status").map(String::as_str), Some("stopped"));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let query = Query::from_pairs([("page", "x"), ("limit", "y"), ("ascending", "maybe")]);
        assert_eq!(query.pagination, Pagination::none());
        assert!(!query.ascending);
    }

    #[test]
    fn test_valid_range() {
        assert_eq!(Pagination::none().valid_range(5), (0, 5));
        assert_eq!(Pagination::new(2, 0).valid_range(5), (0, 2));
        assert_eq!(Pagination::new(2, 4).valid_range(5), (4, 5));
        assert_eq!(Pagination::new(2, 5).valid_range(5), (5, 5));
        assert_eq!(Pagination::new(2, 6).valid_range(5), (0, 0));
        assert_eq!(Pagination::new(-5, 0).valid_range(5), (0, 0));
        assert_eq!(Pagination::new(2, -1).valid_range(5), (0, 0));
    }

    #[test]
    fn test_huge_pagination_does_not_overflow() {
        let query = Query::from_pairs([("page", "3"), ("limit", "4611686018427387904")]);
        assert_eq!(query.pagination.offset, i64::MAX);
        assert_eq!(query.pagination.valid_range(10), (0, 0));

        let query = Query::new().with_pagination(i64::MAX, i64::MAX);
        assert_eq!(query.pagination.valid_range(10), (0, 0));

        assert_eq!(Pagination::new(i64::MAX, 5).valid_range(10), (5, 10));
        assert_eq!(Pagination::new(i64::MAX, 0).valid_range(3), (0, 3));
    }

    #[test]
    fn test_merge_label_selector() {
        let mut query = Query::new().with_label_selector("app=nginx");
        let extra: Labels = [("imaginekube.com/workspace".to_string(), "demo".to_string())]
            .into_iter()
            .collect();
        query.merge_label_selector(&extra).unwrap();
        assert_eq!(query.label_selector, "app=nginx,imaginekube.com/workspace=demo");

        let mut invalid = Query::new().with_label_selector("app in (a,b)");
        assert!(invalid.merge_label_selector(&extra).is_err());
    }

    #[test]
    fn test_invalid_selector_matches_everything() {
        let query = Query::new().with_label_selector("app in (");
        assert!(query.selector().is_empty());
    }
}
