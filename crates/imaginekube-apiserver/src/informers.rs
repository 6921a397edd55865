//! 共享 informer 工厂
//!
//! 每种资源类型只建立一个 watch 驱动的本地缓存（reflector store），
//! 资源查询模块共享这些缓存。测试时使用不连接集群的假工厂直接写入缓存。

use futures::future::{self, BoxFuture};
use futures::{FutureExt, StreamExt};
use imaginekube_common::GroupVersionResource;
use kube::api::{Api, ApiResource, DynamicObject};
use kube::runtime::reflector::{self, store::Writer, Store};
use kube::runtime::{watcher, WatchStreamExt};
use kube::discovery::Discovery;
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

type ErasedStore = Box<dyn Any + Send + Sync>;
type ErasedWriter = Box<dyn Any + Send>;

struct Informer {
    gvr: GroupVersionResource,
    store: ErasedStore,
    /// 仅假工厂持有写端
    writer: Option<ErasedWriter>,
    ready: watch::Receiver<bool>,
}

#[derive(Default)]
struct Inner {
    informers: HashMap<(GroupVersionResource, TypeId), Informer>,
    pending: Vec<BoxFuture<'static, ()>>,
    started: bool,
}

/// informer 工厂
pub struct InformerFactory {
    client: Option<Client>,
    /// 集群实际提供的资源类型，None 表示不做检查
    served: Option<HashSet<GroupVersionResource>>,
    inner: Mutex<Inner>,
}

impl InformerFactory {
    /// 创建连接集群的 informer 工厂
    pub fn new(client: Client) -> Self {
        Self {
            client: Some(client),
            served: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// 创建不连接集群的假工厂，缓存内容由测试写入
    pub fn fake() -> Self {
        Self {
            client: None,
            served: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// 只为集群提供的资源类型启动监听，其余类型的缓存保持为空并视为已同步
    pub fn with_served_resources(mut self, served: HashSet<GroupVersionResource>) -> Self {
        self.served = Some(served);
        self
    }

    fn is_served(&self, gvr: &GroupVersionResource) -> bool {
        self.served
            .as_ref()
            .map_or(true, |served| served.contains(gvr))
    }

    /// Kubernetes 客户端，假工厂返回 None
    pub fn client(&self) -> Option<Client> {
        self.client.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 获取内置资源类型的共享缓存
    pub fn store<K>(&self) -> Store<K>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        self.informer(gvr_of::<K>(), (), Api::all)
    }

    /// 获取任意资源类型的共享缓存，对象以 DynamicObject 表示
    pub fn dynamic_store(&self, resource: &ApiResource) -> Store<DynamicObject> {
        let gvr = GroupVersionResource::new(&resource.group, &resource.version, &resource.plural);
        let ar = resource.clone();
        self.informer(gvr, resource.clone(), move |client| {
            Api::all_with(client, &ar)
        })
    }

    fn informer<K, F>(&self, gvr: GroupVersionResource, dyntype: K::DynamicType, make_api: F) -> Store<K>
    where
        K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
        K::DynamicType: Clone + Eq + Hash + Send + Sync + 'static,
        F: FnOnce(Client) -> Api<K>,
    {
        let key = (gvr.clone(), TypeId::of::<K>());
        let mut inner = self.lock();
        if let Some(store) = inner
            .informers
            .get(&key)
            .and_then(|informer| informer.store.downcast_ref::<Store<K>>())
        {
            return store.clone();
        }

        let writer = Writer::new(dyntype);
        let store = writer.as_reader();
        let (ready_tx, ready_rx) = watch::channel(false);

        let writer = match &self.client {
            Some(_) if !self.is_served(&gvr) => {
                info!("集群未提供 {}，跳过监听", gvr);
                ready_tx.send_replace(true);
                None
            }
            Some(client) => {
                let task = run_reflector(gvr.clone(), make_api(client.clone()), writer, ready_tx);
                if inner.started {
                    tokio::spawn(task);
                } else {
                    inner.pending.push(task);
                }
                None
            }
            None => {
                ready_tx.send_replace(true);
                Some(Box::new(writer) as ErasedWriter)
            }
        };

        debug!("注册 {} 的 informer", gvr);
        inner.informers.insert(
            key,
            Informer {
                gvr,
                store: Box::new(store.clone()),
                writer,
                ready: ready_rx,
            },
        );
        store
    }

    /// 启动所有尚未运行的 informer，之后注册的 informer 立即启动
    pub fn start(&self) {
        let mut inner = self.lock();
        inner.started = true;
        let pending = std::mem::take(&mut inner.pending);
        info!("启动 {} 个 informer", pending.len());
        for task in pending {
            tokio::spawn(task);
        }
    }

    /// 等待所有缓存完成首次同步，返回超时仍未同步的资源类型
    pub async fn wait_for_cache_sync(&self, timeout: Duration) -> Vec<GroupVersionResource> {
        let receivers: Vec<(GroupVersionResource, watch::Receiver<bool>)> = self
            .lock()
            .informers
            .values()
            .map(|informer| (informer.gvr.clone(), informer.ready.clone()))
            .collect();

        let deadline = tokio::time::Instant::now() + timeout;
        let mut unsynced = Vec::new();
        for (gvr, mut ready) in receivers {
            let synced = matches!(
                tokio::time::timeout_at(deadline, ready.wait_for(|ready| *ready)).await,
                Ok(Ok(_))
            );
            if !synced {
                warn!("{} 的缓存未能在 {:?} 内完成同步", gvr, timeout);
                unsynced.push(gvr);
            }
        }
        unsynced
    }

    /// 所有缓存是否都已同步
    pub fn has_synced(&self) -> bool {
        self.lock()
            .informers
            .values()
            .all(|informer| *informer.ready.borrow())
    }

    /// 已注册的资源类型数量
    pub fn len(&self) -> usize {
        self.lock().informers.len()
    }

    /// 是否尚未注册任何资源类型
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 向假工厂的缓存写入或更新对象
    pub fn add<K>(&self, obj: K)
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        self.store::<K>();
        self.apply(gvr_of::<K>(), watcher::Event::Applied(obj));
    }

    /// 从假工厂的缓存删除对象
    pub fn delete<K>(&self, obj: K)
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        self.store::<K>();
        self.apply(gvr_of::<K>(), watcher::Event::Deleted(obj));
    }

    /// 向假工厂的动态资源缓存写入对象
    pub fn add_dynamic(&self, resource: &ApiResource, obj: DynamicObject) {
        self.dynamic_store(resource);
        let gvr = GroupVersionResource::new(&resource.group, &resource.version, &resource.plural);
        self.apply(gvr, watcher::Event::Applied(obj));
    }

    fn apply<K>(&self, gvr: GroupVersionResource, event: watcher::Event<K>)
    where
        K: Resource + Clone + Send + Sync + 'static,
        K::DynamicType: Clone + Eq + Hash + Send + Sync + 'static,
    {
        let key = (gvr.clone(), TypeId::of::<K>());
        let mut inner = self.lock();
        match inner
            .informers
            .get_mut(&key)
            .and_then(|informer| informer.writer.as_mut())
            .and_then(|writer| writer.downcast_mut::<Writer<K>>())
        {
            Some(writer) => writer.apply_watcher_event(&event),
            None => warn!("{} 的缓存由集群驱动，忽略手动写入", gvr),
        }
    }
}

/// 通过 discovery 获取集群提供的全部资源类型，包含每个组的所有版本
pub async fn served_resources(client: Client) -> kube::Result<HashSet<GroupVersionResource>> {
    let discovery = Discovery::new(client).run().await?;
    let mut served = HashSet::new();
    for group in discovery.groups() {
        for version in group.versions() {
            for (resource, _) in group.versioned_resources(version) {
                served.insert(GroupVersionResource::new(
                    &resource.group,
                    &resource.version,
                    &resource.plural,
                ));
            }
        }
    }
    debug!("集群提供 {} 种资源类型", served.len());
    Ok(served)
}

fn gvr_of<K: Resource<DynamicType = ()>>() -> GroupVersionResource {
    GroupVersionResource::new(&K::group(&()), &K::version(&()), &K::plural(&()))
}

fn run_reflector<K>(
    gvr: GroupVersionResource,
    api: Api<K>,
    writer: Writer<K>,
    ready: watch::Sender<bool>,
) -> BoxFuture<'static, ()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Clone + Eq + Hash + Send + Sync + 'static,
{
    async move {
        info!("开始监听 {}", gvr);
        reflector::reflector(writer, watcher(api, watcher::Config::default()))
            .default_backoff()
            .for_each(|event| {
                match event {
                    Ok(watcher::Event::Restarted(objs)) => {
                        debug!("{} 完成全量同步，共 {} 个对象", gvr, objs.len());
                        ready.send_replace(true);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("{} 的监听出错: {}", gvr, e),
                }
                future::ready(())
            })
            .await;
        warn!("{} 的监听已退出", gvr);
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Namespace;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::GroupVersionKind;

    fn namespace(name: &str) -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..ObjectMeta::default()
            },
            ..Namespace::default()
        }
    }

    #[tokio::test]
    async fn test_fake_factory_shares_stores() {
        let factory = InformerFactory::fake();
        let store = factory.store::<Namespace>();
        assert!(store.state().is_empty());

        factory.add(namespace("default"));
        factory.add(namespace("imaginekube-system"));
        assert_eq!(store.state().len(), 2);
        assert_eq!(factory.store::<Namespace>().state().len(), 2);
        assert_eq!(factory.len(), 1);

        factory.delete(namespace("default"));
        assert_eq!(store.state().len(), 1);
    }

    #[tokio::test]
    async fn test_fake_factory_is_synced() {
        let factory = InformerFactory::fake();
        factory.store::<Namespace>();
        assert!(factory.has_synced());
        assert!(factory
            .wait_for_cache_sync(Duration::from_millis(10))
            .await
            .is_empty());
    }

    fn unreachable_client() -> Client {
        let config = kube::Config::new("http://127.0.0.1:1".parse().unwrap());
        Client::try_from(config).unwrap()
    }

    #[tokio::test]
    async fn test_wait_for_cache_sync_times_out() {
        let factory = InformerFactory::new(unreachable_client());
        factory.store::<Namespace>();
        factory.start();

        assert!(!factory.has_synced());
        let unsynced = factory.wait_for_cache_sync(Duration::from_millis(50)).await;
        assert_eq!(unsynced, vec![gvr_of::<Namespace>()]);
        assert!(!factory.has_synced());
    }

    #[tokio::test]
    async fn test_unserved_resources_are_skipped() {
        let factory = InformerFactory::new(unreachable_client())
            .with_served_resources(HashSet::from([gvr_of::<Namespace>()]));
        let gvk = GroupVersionKind::gvk("types.kubefed.io", "v1beta1", "FederatedNamespace");
        let federated = ApiResource::from_gvk_with_plural(&gvk, "federatednamespaces");
        let store = factory.dynamic_store(&federated);
        assert_eq!(factory.lock().pending.len(), 0);
        assert!(factory.has_synced());
        assert!(store.state().is_empty());

        factory.store::<Namespace>();
        assert_eq!(factory.lock().pending.len(), 1);
        assert!(!factory.has_synced());
    }

    #[tokio::test]
    async fn test_dynamic_store() {
        let factory = InformerFactory::fake();
        let gvk = GroupVersionKind::gvk("tenant.imaginekube.com", "v1alpha1", "Workspace");
        let ar = ApiResource::from_gvk_with_plural(&gvk, "workspaces");
        let store = factory.dynamic_store(&ar);

        factory.add_dynamic(&ar, DynamicObject::new("demo", &ar));
        assert_eq!(store.state().len(), 1);
        assert!(factory.client().is_none());
    }
}
