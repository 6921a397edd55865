//! REST 接口
//!
//! 各 API 组的路由与处理函数，共享同一个 [`AppState`]。

mod config;
mod error;
mod network;
mod openpitrix;
mod resources;
mod tenant;

pub use error::ApiError;

use crate::config::Config;
use crate::informers::InformerFactory;
use crate::metrics::{self, ApiMetrics};
use crate::models::openpitrix::OpenPitrixOperator;
use crate::models::tenant::TenantOperator;
use crate::resources::ResourceGetter;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Router};
use imaginekube_common::constants::USER_NAME_HEADER;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub informers: Arc<InformerFactory>,
    pub resources: Arc<ResourceGetter>,
    pub tenant: Arc<TenantOperator>,
    pub openpitrix: Arc<OpenPitrixOperator>,
    pub config: Arc<RwLock<Config>>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    /// 基于 informer 工厂构建全部业务操作
    pub fn new(informers: Arc<InformerFactory>, config: Config) -> prometheus::Result<Self> {
        Ok(Self {
            resources: Arc::new(ResourceGetter::new(&informers)),
            tenant: Arc::new(TenantOperator::new(&informers)),
            openpitrix: Arc::new(OpenPitrixOperator::new(&informers)),
            config: Arc::new(RwLock::new(config)),
            metrics: Arc::new(ApiMetrics::new()?),
            informers,
        })
    }
}

/// 构建完整路由，配置了 weave scope 地址时才注册网络拓扑接口
pub fn router(state: AppState, weave_scope_host: Option<&str>) -> Router {
    let mut router = Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(export_metrics))
        .nest("/kapis/tenant.imaginekube.com/v1alpha3", tenant::routes())
        .nest("/kapis/openpitrix.io/v2alpha1", openpitrix::routes())
        .nest("/kapis/resources.imaginekube.com/v1alpha3", resources::routes())
        .nest("/kapis/config.imaginekube.com/v1alpha2", config::routes());

    if let Some(host) = weave_scope_host {
        router = router.nest("/kapis/network.imaginekube.com/v1alpha2", network::routes(host));
    }

    router
        .layer(middleware::from_fn_with_state(
            state.clone(),
            metrics::track_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 网关转发的用户名
pub(crate) fn user_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<AppState>) -> Response {
    if state.informers.has_synced() {
        (StatusCode::OK, "ok").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "informer 缓存尚未同步").into_response()
    }
}

async fn export_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[tokio::test]
    async fn test_health_endpoints() {
        let (_informers, state) = state();
        let router = router(state, None);

        let (status, _) = send(router.clone(), get_request("/healthz")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(router.clone(), get_request("/readyz")).await;
        assert_eq!(status, StatusCode::OK);

        let response = tower::ServiceExt::oneshot(router, get_request("/metrics")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_network_routes_require_weave_scope() {
        let (_informers, state) = state();
        let router = router(state, None);
        let (status, _) = send(
            router,
            get_request("/kapis/network.imaginekube.com/v1alpha2/namespaces/default/topology"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_user_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_from(&headers), None);
        headers.insert(USER_NAME_HEADER, "bob".parse().unwrap());
        assert_eq!(user_from(&headers).as_deref(), Some("bob"));
    }
}
