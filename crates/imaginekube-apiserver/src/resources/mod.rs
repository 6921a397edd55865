//! 资源查询模块
//!
//! 以 informer 缓存为数据源，为各类 Kubernetes 资源提供统一的 get/list 能力：
//! 命名空间限定、标签选择器、字段过滤、排序与分页。

mod adapters;
mod registry;

pub use adapters::{
    daemonset_status, deployment_status, job_status, statefulset_status, STATUS_RUNNING,
    STATUS_STOPPED, STATUS_UPDATING,
};
pub use registry::{api_resource, ResourceGetter, ResourceScope};

use imaginekube_common::models::query::{
    FIELD_ANNOTATIONS, FIELD_LABEL, FIELD_NAME, FIELD_NAMES, FIELD_NAMESPACE, FIELD_OWNER_KIND,
    FIELD_OWNER_REFERENCE, FIELD_UID, PARAMETER_FIELD_SELECTOR,
};
use imaginekube_common::selector::label_match;
use imaginekube_common::{Error, FieldSelector, ListResult, Query, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::runtime::reflector::{ObjectRef, Store};
use kube::{Resource, ResourceExt};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::hash::Hash;

/// 资源查询接口
pub trait Interface: Send + Sync {
    /// 按命名空间与名称获取对象，集群级资源的命名空间为空
    fn get(&self, namespace: &str, name: &str) -> Result<Value>;

    /// 按查询条件列出对象，命名空间为空时列出全部
    fn list(&self, namespace: &str, query: &Query) -> Result<ListResult>;
}

/// 过滤函数：对象是否满足 `field=value`
pub type FilterFn<K> = fn(&K, &str, &str) -> bool;
/// 比较函数：按排序字段给出升序关系
pub type CompareFn<K> = fn(&K, &K, &str) -> Ordering;
/// 转换函数：返回前对对象做处理
pub type TransformFn<K> = fn(K) -> K;

/// 基于 informer 缓存的通用资源查询
pub struct CachedResource<K>
where
    K: Resource + 'static,
    K::DynamicType: Eq + Hash,
{
    resource: String,
    store: Store<K>,
    dyntype: K::DynamicType,
    filter: FilterFn<K>,
    compare: CompareFn<K>,
    transform: Option<TransformFn<K>>,
}

impl<K> CachedResource<K>
where
    K: Resource + Clone + Serialize + Send + Sync + 'static,
    K::DynamicType: Eq + Hash + Clone + Send + Sync,
{
    /// 创建新的缓存查询，使用默认的元数据过滤与排序
    pub fn new(resource: &str, store: Store<K>) -> Self
    where
        K::DynamicType: Default,
    {
        Self::new_with(resource, store, K::DynamicType::default())
    }

    /// 动态类型的缓存查询，`dyntype` 须与 informer 写入时一致
    pub fn new_with(resource: &str, store: Store<K>, dyntype: K::DynamicType) -> Self {
        Self {
            resource: resource.to_string(),
            store,
            dyntype,
            filter: default_filter::<K>,
            compare: default_compare::<K>,
            transform: None,
        }
    }

    /// 替换过滤函数
    pub fn with_filter(mut self, filter: FilterFn<K>) -> Self {
        self.filter = filter;
        self
    }

    /// 替换比较函数
    pub fn with_compare(mut self, compare: CompareFn<K>) -> Self {
        self.compare = compare;
        self
    }

    /// 设置转换函数
    pub fn with_transform(mut self, transform: TransformFn<K>) -> Self {
        self.transform = Some(transform);
        self
    }

    /// 获取对象的类型化副本
    pub fn get_object(&self, namespace: &str, name: &str) -> Result<K> {
        let mut key = ObjectRef::new_with(name, self.dyntype.clone());
        if !namespace.is_empty() {
            key = key.within(namespace);
        }
        self.store
            .get(&key)
            .filter(|obj| obj.namespace().unwrap_or_default() == namespace)
            .map(|obj| self.apply_transform(obj.as_ref().clone()))
            .ok_or_else(|| Error::not_found(&self.resource, name))
    }

    /// 按查询条件列出类型化对象，返回当前页与过滤后的总数
    pub fn list_objects(&self, namespace: &str, query: &Query) -> Result<(Vec<K>, usize)> {
        let selector = query.selector();
        let field_selector = match query.filters.get(PARAMETER_FIELD_SELECTOR) {
            Some(raw) => Some(FieldSelector::parse(raw)?),
            None => None,
        };

        let mut objects: Vec<K> = Vec::new();
        for obj in self.store.state() {
            if !namespace.is_empty() && obj.namespace().as_deref() != Some(namespace) {
                continue;
            }
            if !selector.matches(obj.labels()) {
                continue;
            }
            if let Some(field_selector) = &field_selector {
                if !field_selector.matches(&serde_json::to_value(obj.as_ref())?) {
                    continue;
                }
            }
            let selected = query
                .filters
                .iter()
                .filter(|(field, _)| field.as_str() != PARAMETER_FIELD_SELECTOR)
                .all(|(field, value)| (self.filter)(&obj, field, value));
            if selected {
                objects.push(self.apply_transform(obj.as_ref().clone()));
            }
        }

        objects.sort_by(|left, right| {
            let ordering = (self.compare)(left, right, &query.sort_by);
            if query.ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });

        let total = objects.len();
        let (start, end) = query.pagination.valid_range(total);
        let page = objects.drain(start..end).collect();
        Ok((page, total))
    }

    fn apply_transform(&self, obj: K) -> K {
        match self.transform {
            Some(transform) => transform(obj),
            None => obj,
        }
    }
}

impl<K> Interface for CachedResource<K>
where
    K: Resource + Clone + Serialize + Send + Sync + 'static,
    K::DynamicType: Eq + Hash + Clone + Send + Sync,
{
    fn get(&self, namespace: &str, name: &str) -> Result<Value> {
        let obj = self.get_object(namespace, name)?;
        Ok(serde_json::to_value(obj)?)
    }

    fn list(&self, namespace: &str, query: &Query) -> Result<ListResult> {
        let (objects, total) = self.list_objects(namespace, query)?;
        let items = objects
            .into_iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ListResult::new(items, total))
    }
}

/// 默认过滤：只看对象元数据
pub fn default_filter<K: Resource>(obj: &K, field: &str, value: &str) -> bool {
    default_object_meta_filter(obj.meta(), field, value)
}

/// 默认排序：只看对象元数据
pub fn default_compare<K: Resource>(left: &K, right: &K, sort_by: &str) -> Ordering {
    default_object_meta_compare(left.meta(), right.meta(), sort_by)
}

/// 元数据过滤
///
/// 不认识的字段一律不匹配。
pub fn default_object_meta_filter(meta: &ObjectMeta, field: &str, value: &str) -> bool {
    let name = meta.name.as_deref().unwrap_or_default();
    let empty = Default::default();
    match field {
        FIELD_NAMES => value.split(',').any(|candidate| candidate == name),
        FIELD_NAME => name.contains(value),
        FIELD_UID => meta.uid.as_deref().unwrap_or_default() == value,
        FIELD_NAMESPACE => meta.namespace.as_deref().unwrap_or_default() == value,
        FIELD_OWNER_REFERENCE => meta
            .owner_references
            .iter()
            .flatten()
            .any(|owner| owner.uid == value),
        FIELD_OWNER_KIND => meta
            .owner_references
            .iter()
            .flatten()
            .any(|owner| owner.kind == value),
        FIELD_ANNOTATIONS => label_match(meta.annotations.as_ref().unwrap_or(&empty), value),
        FIELD_LABEL => label_match(meta.labels.as_ref().unwrap_or(&empty), value),
        _ => false,
    }
}

/// 元数据排序
///
/// `name` 按名称，其余一律按创建时间，创建时间相同时按名称。
pub fn default_object_meta_compare(left: &ObjectMeta, right: &ObjectMeta, sort_by: &str) -> Ordering {
    let by_name = || {
        left.name
            .as_deref()
            .unwrap_or_default()
            .cmp(right.name.as_deref().unwrap_or_default())
    };
    match sort_by {
        FIELD_NAME => by_name(),
        _ => {
            let l = left.creation_timestamp.as_ref().map(|t| t.0);
            let r = right.creation_timestamp.as_ref().map(|t| t.0);
            l.cmp(&r).then_with(by_name)
        }
    }
}
