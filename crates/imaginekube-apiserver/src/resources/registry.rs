//! 资源查询注册表
//!
//! 按资源复数名查找对应的查询实现。集群级请求先查集群级表，再查命名空间级表，
//! 同一张表内按注册顺序取第一个匹配。

use super::adapters;
use super::{CachedResource, Interface};
use crate::crd::{Workspace, WorkspaceTemplate};
use crate::informers::InformerFactory;
use imaginekube_common::{Error, GroupVersionResource, ListResult, Query, Result};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, Secret, Service,
    ServiceAccount,
};
use k8s_openapi::api::networking::v1::{Ingress, NetworkPolicy};
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::ApiResource;
use kube::core::GroupVersionKind;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// 资源作用域
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceScope {
    Namespaced,
    Cluster,
}

type Entry = (GroupVersionResource, Arc<dyn Interface>);

/// 资源查询注册表
#[derive(Default, Clone)]
pub struct ResourceGetter {
    namespaced: Vec<Entry>,
    cluster: Vec<Entry>,
}

impl ResourceGetter {
    /// 创建空的注册表
    pub fn empty() -> Self {
        Self::default()
    }

    /// 基于 informer 工厂注册全部支持的资源类型
    pub fn new(factory: &InformerFactory) -> Self {
        use ResourceScope::{Cluster, Namespaced};

        let mut getter = Self::empty();

        getter.typed::<Deployment>(factory, Namespaced, |r| {
            r.with_filter(adapters::filter_deployment)
                .with_compare(adapters::compare_deployment)
        });
        getter.typed::<DaemonSet>(factory, Namespaced, |r| {
            r.with_filter(adapters::filter_daemonset)
        });
        getter.typed::<StatefulSet>(factory, Namespaced, |r| {
            r.with_filter(adapters::filter_statefulset)
        });
        getter.typed::<Service>(factory, Namespaced, |r| r);
        getter.typed::<ConfigMap>(factory, Namespaced, |r| r);
        getter.typed::<Secret>(factory, Namespaced, |r| r.with_filter(adapters::filter_secret));
        getter.typed::<Pod>(factory, Namespaced, |r| r.with_filter(adapters::filter_pod));
        getter.typed::<ServiceAccount>(factory, Namespaced, |r| r);
        getter.typed::<Ingress>(factory, Namespaced, |r| r);
        getter.typed::<NetworkPolicy>(factory, Namespaced, |r| r);
        getter.typed::<Job>(factory, Namespaced, |r| {
            r.with_filter(adapters::filter_job)
                .with_compare(adapters::compare_job)
        });
        getter.dynamic(factory, Namespaced, "app.k8s.io", "v1beta1", "Application", "applications");
        getter.typed::<PersistentVolumeClaim>(factory, Namespaced, |r| {
            r.with_filter(adapters::filter_pvc)
        });
        getter.dynamic(
            factory,
            Namespaced,
            "snapshot.storage.k8s.io",
            "v1",
            "VolumeSnapshot",
            "volumesnapshots",
        );
        getter.typed::<RoleBinding>(factory, Namespaced, |r| r);
        getter.typed::<Role>(factory, Namespaced, |r| r);
        getter.dynamic(
            factory,
            Namespaced,
            "network.imaginekube.com",
            "v1alpha1",
            "IPPool",
            "ippools",
        );
        for (kind, plural) in FEDERATED_KINDS {
            getter.dynamic(factory, Namespaced, FEDERATED_GROUP, "v1beta1", kind, plural);
        }
        getter.dynamic(
            factory,
            Namespaced,
            "monitoring.imaginekube.io",
            "v1alpha2",
            "Dashboard",
            "dashboards",
        );

        getter.typed::<PersistentVolume>(factory, Cluster, |r| r);
        getter.dynamic(
            factory,
            Cluster,
            "snapshot.storage.k8s.io",
            "v1",
            "VolumeSnapshotClass",
            "volumesnapshotclasses",
        );
        getter.dynamic(
            factory,
            Cluster,
            "snapshot.storage.k8s.io",
            "v1",
            "VolumeSnapshotContent",
            "volumesnapshotcontents",
        );
        getter.typed::<Node>(factory, Cluster, |r| r.with_filter(adapters::filter_node));
        getter.typed::<Namespace>(factory, Cluster, |r| {
            r.with_filter(adapters::filter_namespace)
        });
        getter.typed::<CustomResourceDefinition>(factory, Cluster, |r| r);
        getter.dynamic(
            factory,
            Cluster,
            "devops.imaginekube.com",
            "v1alpha3",
            "DevOpsProject",
            "devopsprojects",
        );
        getter.typed::<Workspace>(factory, Cluster, |r| r);
        getter.typed::<WorkspaceTemplate>(factory, Cluster, |r| r);
        for (kind, plural) in IAM_KINDS {
            getter.dynamic(factory, Cluster, IAM_GROUP, "v1alpha2", kind, plural);
        }
        getter.typed::<ClusterRole>(factory, Cluster, |r| r);
        getter.typed::<ClusterRoleBinding>(factory, Cluster, |r| r);
        getter.dynamic(
            factory,
            Cluster,
            "cluster.imaginekube.com",
            "v1alpha1",
            "Cluster",
            "clusters",
        );
        for (kind, plural) in NOTIFICATION_KINDS {
            getter.dynamic(factory, Cluster, NOTIFICATION_GROUP, "v2beta2", kind, plural);
        }
        getter.dynamic(
            factory,
            Cluster,
            "monitoring.imaginekube.io",
            "v1alpha2",
            "ClusterDashboard",
            "clusterdashboards",
        );

        debug!(
            "注册了 {} 种命名空间级资源和 {} 种集群级资源",
            getter.namespaced.len(),
            getter.cluster.len()
        );
        getter
    }

    fn typed<K>(
        &mut self,
        factory: &InformerFactory,
        scope: ResourceScope,
        customize: impl FnOnce(CachedResource<K>) -> CachedResource<K>,
    ) where
        K: Resource<DynamicType = ()>
            + Clone
            + DeserializeOwned
            + serde::Serialize
            + Debug
            + Send
            + Sync
            + 'static,
    {
        let gvr = GroupVersionResource::new(&K::group(&()), &K::version(&()), &K::plural(&()));
        let getter = customize(CachedResource::new(&gvr.resource, factory.store::<K>()));
        self.register(scope, gvr, Arc::new(getter));
    }

    fn dynamic(
        &mut self,
        factory: &InformerFactory,
        scope: ResourceScope,
        group: &str,
        version: &str,
        kind: &str,
        plural: &str,
    ) {
        let resource = api_resource(group, version, kind, plural);
        let gvr = GroupVersionResource::new(group, version, plural);
        let getter = CachedResource::new_with(plural, factory.dynamic_store(&resource), resource);
        self.register(scope, gvr, Arc::new(getter));
    }

    /// 注册资源查询实现，重复注册同一 GVR 时替换旧实现
    pub fn register(
        &mut self,
        scope: ResourceScope,
        gvr: GroupVersionResource,
        getter: Arc<dyn Interface>,
    ) {
        let table = match scope {
            ResourceScope::Namespaced => &mut self.namespaced,
            ResourceScope::Cluster => &mut self.cluster,
        };
        match table.iter_mut().find(|(key, _)| *key == gvr) {
            Some(entry) => {
                warn!("资源 {} 重复注册，替换已有实现", gvr);
                entry.1 = getter;
            }
            None => table.push((gvr, getter)),
        }
    }

    /// 按资源复数名查找查询实现
    pub fn try_resource(&self, cluster_scope: bool, resource: &str) -> Option<Arc<dyn Interface>> {
        let cluster = self.cluster.iter().filter(|_| cluster_scope);
        cluster
            .chain(self.namespaced.iter())
            .find(|(gvr, _)| gvr.resource == resource)
            .map(|(_, getter)| getter.clone())
    }

    /// 按完整的 GVR 查找查询实现
    pub fn get_by_gvr(&self, gvr: &GroupVersionResource) -> Option<Arc<dyn Interface>> {
        self.cluster
            .iter()
            .chain(self.namespaced.iter())
            .find(|(key, _)| key == gvr)
            .map(|(_, getter)| getter.clone())
    }

    /// 获取单个对象，命名空间为空时视为集群级请求
    pub fn get(&self, resource: &str, namespace: &str, name: &str) -> Result<Value> {
        self.lookup(resource, namespace)?.get(namespace, name)
    }

    /// 列出对象，命名空间为空时视为集群级请求
    pub fn list(&self, resource: &str, namespace: &str, query: &Query) -> Result<ListResult> {
        self.lookup(resource, namespace)?.list(namespace, query)
    }

    fn lookup(&self, resource: &str, namespace: &str) -> Result<Arc<dyn Interface>> {
        self.try_resource(namespace.is_empty(), resource)
            .ok_or_else(|| Error::ResourceNotSupported(resource.to_string()))
    }

    /// 某一作用域下已注册的资源，按注册顺序
    pub fn resources(&self, scope: ResourceScope) -> Vec<&GroupVersionResource> {
        let table = match scope {
            ResourceScope::Namespaced => &self.namespaced,
            ResourceScope::Cluster => &self.cluster,
        };
        table.iter().map(|(gvr, _)| gvr).collect()
    }
}

/// 构造动态资源描述
pub fn api_resource(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(group, version, kind), plural)
}

const FEDERATED_GROUP: &str = "types.kubefed.io";
const FEDERATED_KINDS: [(&str, &str); 9] = [
    ("FederatedNamespace", "federatednamespaces"),
    ("FederatedDeployment", "federateddeployments"),
    ("FederatedSecret", "federatedsecrets"),
    ("FederatedConfigMap", "federatedconfigmaps"),
    ("FederatedService", "federatedservices"),
    ("FederatedApplication", "federatedapplications"),
    ("FederatedPersistentVolumeClaim", "federatedpersistentvolumeclaims"),
    ("FederatedStatefulSet", "federatedstatefulsets"),
    ("FederatedIngress", "federatedingresses"),
];

const IAM_GROUP: &str = "iam.imaginekube.com";
const IAM_KINDS: [(&str, &str); 8] = [
    ("GlobalRole", "globalroles"),
    ("WorkspaceRole", "workspaceroles"),
    ("User", "users"),
    ("GlobalRoleBinding", "globalrolebindings"),
    ("WorkspaceRoleBinding", "workspacerolebindings"),
    ("LoginRecord", "loginrecords"),
    ("Group", "groups"),
    ("GroupBinding", "groupbindings"),
];

const NOTIFICATION_GROUP: &str = "notification.imaginekube.io";
const NOTIFICATION_KINDS: [(&str, &str); 5] = [
    ("NotificationManager", "notificationmanagers"),
    ("Config", "configs"),
    ("Receiver", "receivers"),
    ("Router", "routers"),
    ("Silence", "silences"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::api::DynamicObject;

    fn deployment(namespace: &str, name: &str, replicas: i32) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                ..DeploymentSpec::default()
            }),
            ..Deployment::default()
        }
    }

    fn namespace(name: &str) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            ..Namespace::default()
        }
    }

    #[test]
    fn test_registration_table() {
        let factory = InformerFactory::fake();
        let getter = ResourceGetter::new(&factory);

        let namespaced = getter.resources(ResourceScope::Namespaced);
        let cluster = getter.resources(ResourceScope::Cluster);
        assert_eq!(namespaced.len(), 27);
        assert_eq!(cluster.len(), 26);
        assert_eq!(namespaced[0].to_string(), "apps/v1/deployments");
        assert!(cluster
            .iter()
            .any(|gvr| gvr.to_string() == "tenant.imaginekube.com/v1alpha2/workspacetemplates"));
        assert_eq!(factory.len(), 53);
    }

    #[test]
    fn test_try_resource_scope() {
        let factory = InformerFactory::fake();
        let getter = ResourceGetter::new(&factory);

        assert!(getter.try_resource(true, "namespaces").is_some());
        assert!(getter.try_resource(false, "namespaces").is_none());
        assert!(getter.try_resource(true, "deployments").is_some());
        assert!(getter.try_resource(false, "deployments").is_some());
        assert!(getter.try_resource(true, "unknown").is_none());
    }

    #[test]
    fn test_get_and_list() {
        let factory = InformerFactory::fake();
        let getter = ResourceGetter::new(&factory);
        factory.add(deployment("default", "web", 1));
        factory.add(deployment("default", "api", 0));
        factory.add(deployment("demo", "web", 2));
        factory.add(namespace("default"));

        let obj = getter.get("deployments", "default", "web").unwrap();
        assert_eq!(obj["metadata"]["namespace"], "default");

        let all = getter.list("deployments", "", &Query::new()).unwrap();
        assert_eq!(all.total_items, 3);

        let stopped = getter
            .list("deployments", "default", &Query::new().with_filter("status", "stopped"))
            .unwrap();
        assert_eq!(stopped.names(), vec!["api"]);

        let namespaces = getter.list("namespaces", "", &Query::new()).unwrap();
        assert_eq!(namespaces.names(), vec!["default"]);
    }

    #[test]
    fn test_unsupported_resource() {
        let getter = ResourceGetter::new(&InformerFactory::fake());
        let err = getter.list("foos", "", &Query::new()).unwrap_err();
        assert!(matches!(err, Error::ResourceNotSupported(ref r) if r == "foos"));

        let err = getter.get("namespaces", "default", "default").unwrap_err();
        assert!(matches!(err, Error::ResourceNotSupported(_)));
    }

    #[test]
    fn test_dynamic_resource() {
        let factory = InformerFactory::fake();
        let getter = ResourceGetter::new(&factory);
        let resource = api_resource(IAM_GROUP, "v1alpha2", "User", "users");
        factory.add_dynamic(&resource, DynamicObject::new("admin", &resource));

        let users = getter.list("users", "", &Query::new()).unwrap();
        assert_eq!(users.names(), vec!["admin"]);

        let gvr = GroupVersionResource::new(IAM_GROUP, "v1alpha2", "users");
        assert!(getter.get_by_gvr(&gvr).unwrap().get("", "admin").is_ok());
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let factory = InformerFactory::fake();
        let mut getter = ResourceGetter::empty();
        let gvr = GroupVersionResource::new("", "v1", "namespaces");
        getter.register(
            ResourceScope::Cluster,
            gvr.clone(),
            Arc::new(CachedResource::new("namespaces", factory.store::<Namespace>())),
        );
        getter.register(
            ResourceScope::Cluster,
            gvr,
            Arc::new(
                CachedResource::new("namespaces", factory.store::<Namespace>())
                    .with_filter(adapters::filter_namespace),
            ),
        );
        assert_eq!(getter.resources(ResourceScope::Cluster).len(), 1);
    }

    #[test]
    fn test_registration_order_wins() {
        let factory = InformerFactory::fake();
        let mut getter = ResourceGetter::empty();
        let first = api_resource("a.example.com", "v1", "Widget", "widgets");
        let second = api_resource("b.example.com", "v1", "Widget", "widgets");
        factory.add_dynamic(&first, DynamicObject::new("from-a", &first));
        factory.add_dynamic(&second, DynamicObject::new("from-b", &second));
        for resource in [&first, &second] {
            getter.register(
                ResourceScope::Cluster,
                GroupVersionResource::new(&resource.group, &resource.version, &resource.plural),
                Arc::new(CachedResource::new_with(
                    "widgets",
                    factory.dynamic_store(resource),
                    resource.clone(),
                )),
            );
        }

        for _ in 0..10 {
            let widgets = getter.list("widgets", "", &Query::new()).unwrap();
            assert_eq!(widgets.names(), vec!["from-a"]);
        }
    }
}
