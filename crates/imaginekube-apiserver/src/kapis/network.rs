//! 网络拓扑接口 network.imaginekube.com/v1alpha2
//!
//! 将命名空间拓扑请求转发给 weave scope，原样返回其状态码与响应体。

use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use imaginekube_common::Error;
use tracing::{debug, warn};

#[derive(Clone)]
struct Topology {
    base_url: String,
    client: reqwest::Client,
}

impl Topology {
    fn new(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{}", host)
        };
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|e| {
                warn!("创建 weave scope 客户端失败，使用默认配置: {}", e);
                reqwest::Client::new()
            });
        Self { base_url, client }
    }

    async fn fetch(&self, path: &str, namespace: &str) -> Result<Response, Error> {
        let url = format!("{}/api/topology/containers{}", self.base_url, path);
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        debug!("请求 weave scope: {}", url);

        let upstream = self
            .client
            .get(&url)
            .query(&[("namespace", namespace), ("timestamp", timestamp.as_str())])
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("请求 weave scope 失败: {}", e)))?;

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = upstream
            .bytes()
            .await
            .map_err(|e| Error::Upstream(format!("读取 weave scope 响应失败: {}", e)))?;

        Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
    }
}

pub(super) fn routes(host: &str) -> Router<AppState> {
    Router::new()
        .route("/namespaces/{namespace}/topology", get(namespace_topology))
        .route(
            "/namespaces/{namespace}/topology/{node_id}",
            get(namespace_node_topology),
        )
        .with_state(Topology::new(host))
}

async fn namespace_topology(
    State(topology): State<Topology>,
    Path(namespace): Path<String>,
) -> Result<Response, ApiError> {
    topology
        .fetch("", &namespace)
        .await
        .map_err(ApiError::internal)
}

async fn namespace_node_topology(
    State(topology): State<Topology>,
    Path((namespace, node_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    topology
        .fetch(&format!("/{}", node_id), &namespace)
        .await
        .map_err(ApiError::internal)
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::kapis::router;
    use axum::extract::{Path, RawQuery};
    use axum::Json;
    use serde_json::json;
    use tokio::net::TcpListener;

    const PREFIX: &str = "/kapis/network.imaginekube.com/v1alpha2";

    async fn fake_weave_scope() -> String {
        let app = Router::new()
            .route(
                "/api/topology/containers",
                get(|RawQuery(query): RawQuery| async move {
                    Json(json!({ "nodes": {}, "query": query }))
                }),
            )
            .route(
                "/api/topology/containers/{id}",
                get(|Path(id): Path<String>| async move {
                    if id == "missing" {
                        (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
                    } else {
                        (StatusCode::OK, Json(json!({ "node": { "id": id } })))
                    }
                }),
            );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr.to_string()
    }

    #[test]
    fn test_base_url() {
        assert_eq!(Topology::new("weave-scope-app.weave").base_url, "http://weave-scope-app.weave");
        assert_eq!(Topology::new("https://scope.local/").base_url, "https://scope.local");
    }

    #[tokio::test]
    async fn test_proxy_namespace_topology() {
        let host = fake_weave_scope().await;
        let (_informers, state) = state();
        let router = router(state, Some(&host));

        let (status, body) =
            send(router.clone(), get_request(&format!("{}/namespaces/demo/topology", PREFIX))).await;
        assert_eq!(status, StatusCode::OK);
        let query = body["query"].as_str().unwrap();
        assert!(query.contains("namespace=demo"));
        assert!(query.contains("timestamp="));

        let (status, body) = send(
            router.clone(),
            get_request(&format!("{}/namespaces/demo/topology/web", PREFIX)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["node"]["id"], "web");

        let (status, _) = send(
            router,
            get_request(&format!("{}/namespaces/demo/topology/missing", PREFIX)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unreachable_weave_scope() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);

        let (_informers, state) = state();
        let router = router(state, Some(&host));
        let (status, body) =
            send(router, get_request(&format!("{}/namespaces/demo/topology", PREFIX))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
    }
}
