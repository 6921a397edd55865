//! 应用分类

use crate::crd::HelmCategory;
use crate::informers::InformerFactory;
use crate::resources::{default_filter, CachedResource, Interface};
use imaginekube_common::models::query::FIELD_NAME;
use imaginekube_common::{ListResult, Query, Result};
use tracing::error;

/// 分类按展示名称过滤，其余字段走元数据过滤
fn filter_category(category: &HelmCategory, field: &str, value: &str) -> bool {
    match field {
        FIELD_NAME => {
            category.spec.name.contains(value) || default_filter(category, field, value)
        }
        _ => default_filter(category, field, value),
    }
}

/// 应用分类查询
pub struct CategoryOperator {
    categories: CachedResource<HelmCategory>,
}

impl CategoryOperator {
    pub fn new(factory: &InformerFactory) -> Self {
        Self {
            categories: CachedResource::new("helmcategories", factory.store::<HelmCategory>())
                .with_filter(filter_category),
        }
    }

    /// 列出应用分类
    pub fn list_categories(&self, query: &Query) -> Result<ListResult> {
        self.categories.list("", query).map_err(|e| {
            error!("列出应用分类失败: {}", e);
            e
        })
    }

    /// 获取应用分类
    pub fn describe_category(&self, id: &str) -> Result<HelmCategory> {
        self.categories.get_object("", id).map_err(|e| {
            error!("获取应用分类 {} 失败: {}", id, e);
            e
        })
    }
}
