//! 租户接口 tenant.imaginekube.com/v1alpha3

use super::{user_from, ApiError, AppState};
use crate::crd::{Workspace, WorkspaceTemplate};
use axum::extract::{Path, Query as QueryParams, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use imaginekube_common::{ListResult, Query};
use serde_json::{json, Value};
use tracing::error;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/workspacetemplates",
            get(list_workspace_templates).post(create_workspace_template),
        )
        .route(
            "/workspacetemplates/{workspace}",
            get(describe_workspace_template)
                .put(update_workspace_template)
                .patch(patch_workspace_template)
                .delete(delete_workspace_template),
        )
        .route("/workspaces", get(list_workspaces))
        .route("/workspaces/{workspace}", get(get_workspace))
}

fn require_user(headers: &HeaderMap) -> Result<String, ApiError> {
    user_from(headers).ok_or_else(|| {
        error!("无法获取用户信息");
        ApiError::forbidden("无法获取用户信息")
    })
}

async fn list_workspaces(
    State(state): State<AppState>,
    headers: HeaderMap,
    QueryParams(params): QueryParams<Vec<(String, String)>>,
) -> Result<Json<ListResult>, ApiError> {
    let user = require_user(&headers)?;
    let query = Query::from_pairs(params);
    state
        .tenant
        .list_workspaces(&user, &query)
        .map(Json)
        .map_err(ApiError::internal)
}

async fn get_workspace(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<Json<Workspace>, ApiError> {
    Ok(Json(state.tenant.get_workspace(&workspace)?))
}

async fn list_workspace_templates(
    state: State<AppState>,
    headers: HeaderMap,
    params: QueryParams<Vec<(String, String)>>,
) -> Result<Json<ListResult>, ApiError> {
    list_workspaces(state, headers, params).await
}

async fn describe_workspace_template(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<Json<WorkspaceTemplate>, ApiError> {
    Ok(Json(state.tenant.describe_workspace_template(&workspace)?))
}

async fn create_workspace_template(
    State(state): State<AppState>,
    Json(template): Json<WorkspaceTemplate>,
) -> Result<Json<WorkspaceTemplate>, ApiError> {
    Ok(Json(state.tenant.create_workspace_template(&template).await?))
}

async fn update_workspace_template(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Json(template): Json<WorkspaceTemplate>,
) -> Result<Json<WorkspaceTemplate>, ApiError> {
    Ok(Json(
        state
            .tenant
            .update_workspace_template(&workspace, &template)
            .await?,
    ))
}

async fn patch_workspace_template(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
    Json(patch): Json<Value>,
) -> Result<Json<WorkspaceTemplate>, ApiError> {
    Ok(Json(
        state
            .tenant
            .patch_workspace_template(&workspace, &patch)
            .await?,
    ))
}

async fn delete_workspace_template(
    State(state): State<AppState>,
    Path(workspace): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.tenant.delete_workspace_template(&workspace).await?;
    Ok(Json(json!({ "message": "success" })))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::crd::{Workspace, WorkspaceSpec, WorkspaceTemplate, WorkspaceTemplateSpec};
    use crate::kapis::router;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    const PREFIX: &str = "/kapis/tenant.imaginekube.com/v1alpha3";

    fn setup() -> axum::Router {
        let (informers, state) = state();
        for name in ["alpha", "beta"] {
            informers.add(WorkspaceTemplate::new(name, WorkspaceTemplateSpec::default()));
        }
        informers.add(Workspace::new("alpha", WorkspaceSpec::default()));
        router(state, None)
    }

    fn as_user(uri: &str, user: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("X-Token-Username", user)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_list_workspaces_requires_user() {
        let router = setup();
        let (status, body) = send(router, get_request(&format!("{}/workspaces", PREFIX))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], 403);
    }

    #[tokio::test]
    async fn test_list_workspaces_as_admin() {
        let router = setup();
        let (status, body) = send(
            router.clone(),
            as_user(&format!("{}/workspaces?sortBy=name&ascending=true", PREFIX), "admin"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalItems"], 2);
        assert_eq!(body["items"][0]["metadata"]["name"], "alpha");

        let (status, body) = send(
            router,
            as_user(&format!("{}/workspacetemplates?limit=1&page=2", PREFIX), "admin"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_workspace() {
        let router = setup();
        let (status, body) =
            send(router.clone(), get_request(&format!("{}/workspaces/alpha", PREFIX))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "Workspace");

        let (status, _) = send(router.clone(), get_request(&format!("{}/workspaces/beta", PREFIX))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(router, get_request(&format!("{}/workspacetemplates/beta", PREFIX))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_without_cluster() {
        let router = setup();
        let request = Request::builder()
            .method("DELETE")
            .uri(format!("{}/workspacetemplates/alpha", PREFIX))
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(router, request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
