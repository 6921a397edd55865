//! 应用模板与应用版本

use super::{ignore_not_found, scoped_query, status_filter};
use crate::crd::{HelmApplication, HelmApplicationVersion};
use crate::informers::InformerFactory;
use crate::resources::{CachedResource, Interface};
use imaginekube_common::constants::{CHART_APPLICATION_ID_LABEL_KEY, WORKSPACE_LABEL_KEY};
use imaginekube_common::{ListResult, Query, Result};
use tracing::error;

fn filter_app(app: &HelmApplication, field: &str, value: &str) -> bool {
    let state = app.status.as_ref().map(|status| status.state.as_str());
    status_filter(state, app, field, value)
}

fn filter_app_version(version: &HelmApplicationVersion, field: &str, value: &str) -> bool {
    let state = version.status.as_ref().map(|status| status.state.as_str());
    status_filter(state, version, field, value)
}

/// 应用模板查询
pub struct ApplicationOperator {
    apps: CachedResource<HelmApplication>,
    versions: CachedResource<HelmApplicationVersion>,
}

impl ApplicationOperator {
    pub fn new(factory: &InformerFactory) -> Self {
        Self {
            apps: CachedResource::new("helmapplications", factory.store::<HelmApplication>())
                .with_filter(filter_app),
            versions: CachedResource::new(
                "helmapplicationversions",
                factory.store::<HelmApplicationVersion>(),
            )
            .with_filter(filter_app_version),
        }
    }

    /// 列出应用模板，指定企业空间时只返回该企业空间的应用
    pub fn list_apps(&self, workspace: &str, query: &Query) -> Result<ListResult> {
        let query = scoped_query(query, &[(WORKSPACE_LABEL_KEY, workspace)]).map_err(|e| {
            error!("解析标签选择器失败: {}", e);
            e
        })?;
        ignore_not_found(self.apps.list("", &query)).map_err(|e| {
            error!("列出应用模板失败: {}", e);
            e
        })
    }

    /// 获取应用模板
    pub fn describe_app(&self, id: &str) -> Result<HelmApplication> {
        self.apps.get_object("", id).map_err(|e| {
            error!("获取应用模板 {} 失败: {}", id, e);
            e
        })
    }

    /// 列出某个应用模板的版本
    pub fn list_app_versions(&self, workspace: &str, app_id: &str, query: &Query) -> Result<ListResult> {
        let query = scoped_query(
            query,
            &[(WORKSPACE_LABEL_KEY, workspace), (CHART_APPLICATION_ID_LABEL_KEY, app_id)],
        )?;
        ignore_not_found(self.versions.list("", &query)).map_err(|e| {
            error!("列出应用版本失败: {}", e);
            e
        })
    }

    /// 获取应用版本
    pub fn describe_app_version(&self, id: &str) -> Result<HelmApplicationVersion> {
        self.versions.get_object("", id).map_err(|e| {
            error!("获取应用版本 {} 失败: {}", id, e);
            e
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        ChartMetadata, HelmApplicationSpec, HelmApplicationStatus, HelmApplicationVersionSpec,
    };
    use imaginekube_common::Error;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn app(name: &str, workspace: &str, state: &str) -> HelmApplication {
        let mut app = HelmApplication::new(
            name,
            HelmApplicationSpec {
                name: name.to_string(),
                ..HelmApplicationSpec::default()
            },
        );
        app.metadata.labels = Some(BTreeMap::from([(
            WORKSPACE_LABEL_KEY.to_string(),
            workspace.to_string(),
        )]));
        app.status = Some(HelmApplicationStatus {
            state: state.to_string(),
            ..HelmApplicationStatus::default()
        });
        app
    }

    fn version(name: &str, app_id: &str) -> HelmApplicationVersion {
        HelmApplicationVersion {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels: Some(BTreeMap::from([(
                    CHART_APPLICATION_ID_LABEL_KEY.to_string(),
                    app_id.to_string(),
                )])),
                ..ObjectMeta::default()
            },
            spec: HelmApplicationVersionSpec {
                metadata: ChartMetadata {
                    name: app_id.to_string(),
                    version: "0.1.0".to_string(),
                    ..ChartMetadata::default()
                },
                ..HelmApplicationVersionSpec::default()
            },
            status: None,
        }
    }

    fn setup() -> ApplicationOperator {
        let factory = InformerFactory::fake();
        let operator = ApplicationOperator::new(&factory);
        factory.add(app("app-nginx", "demo", "active"));
        factory.add(app("app-redis", "demo", "draft"));
        factory.add(app("app-mysql", "other", "active"));
        factory.add(version("appv-nginx-1", "app-nginx"));
        factory.add(version("appv-nginx-2", "app-nginx"));
        factory.add(version("appv-redis-1", "app-redis"));
        operator
    }

    #[test]
    fn test_list_apps() {
        let operator = setup();
        let query = Query::new().with_sort("name", true);

        let all = operator.list_apps("", &query).unwrap();
        assert_eq!(all.total_items, 3);

        let demo = operator.list_apps("demo", &query).unwrap();
        assert_eq!(demo.names(), vec!["app-nginx", "app-redis"]);

        let active = operator
            .list_apps("demo", &query.clone().with_filter("status", "active|suspended"))
            .unwrap();
        assert_eq!(active.names(), vec!["app-nginx"]);

        let invalid = operator.list_apps("demo", &Query::new().with_label_selector("a notin (b)"));
        assert!(matches!(invalid, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_list_app_versions() {
        let operator = setup();
        let versions = operator
            .list_app_versions("", "app-nginx", &Query::new().with_sort("name", true))
            .unwrap();
        assert_eq!(versions.names(), vec!["appv-nginx-1", "appv-nginx-2"]);
    }

    #[test]
    fn test_describe() {
        let operator = setup();
        assert_eq!(operator.describe_app("app-redis").unwrap().spec.name, "app-redis");
        assert_eq!(
            operator.describe_app_version("appv-redis-1").unwrap().spec.metadata.name,
            "app-redis"
        );
        assert!(operator.describe_app("missing").unwrap_err().is_not_found());
    }
}
