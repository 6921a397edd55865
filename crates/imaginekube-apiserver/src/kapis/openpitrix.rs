//! 应用商店接口 openpitrix.io/v2alpha1
//!
//! 同一类资源的全局路径和企业空间路径共用处理函数，范围参数从路径中按名称读取。

use super::{ApiError, AppState};
use crate::crd::{HelmApplication, HelmApplicationVersion, HelmCategory, HelmRelease, HelmRepo};
use axum::extract::{Path, Query as QueryParams, State};
use axum::routing::get;
use axum::{Json, Router};
use imaginekube_common::{ListResult, Query};
use std::collections::HashMap;

type PathParams = Option<Path<HashMap<String, String>>>;
type Params = QueryParams<Vec<(String, String)>>;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/apps", get(list_apps))
        .route("/apps/{app}", get(describe_app))
        .route("/apps/{app}/versions", get(list_app_versions))
        .route("/apps/{app}/versions/{version}", get(describe_app_version))
        .route("/workspaces/{workspace}/apps", get(list_apps))
        .route("/workspaces/{workspace}/apps/{app}", get(describe_app))
        .route("/workspaces/{workspace}/apps/{app}/versions", get(list_app_versions))
        .route(
            "/workspaces/{workspace}/apps/{app}/versions/{version}",
            get(describe_app_version),
        )
        .route("/categories", get(list_categories))
        .route("/categories/{category}", get(describe_category))
        .route("/repos", get(list_repos))
        .route("/repos/{repo}", get(describe_repo))
        .route("/workspaces/{workspace}/repos", get(list_repos))
        .route("/workspaces/{workspace}/repos/{repo}", get(describe_repo))
        .route("/applications", get(list_applications))
        .route("/applications/{application}", get(describe_application))
        .route("/workspaces/{workspace}/applications", get(list_applications))
        .route(
            "/workspaces/{workspace}/namespaces/{namespace}/applications",
            get(list_applications),
        )
        .route(
            "/workspaces/{workspace}/clusters/{cluster}/namespaces/{namespace}/applications",
            get(list_applications),
        )
        .route(
            "/workspaces/{workspace}/clusters/{cluster}/namespaces/{namespace}/applications/{application}",
            get(describe_application),
        )
}

fn param<'a>(path: &'a PathParams, key: &str) -> &'a str {
    path.as_ref()
        .and_then(|Path(params)| params.get(key))
        .map(String::as_str)
        .unwrap_or_default()
}

async fn list_apps(
    State(state): State<AppState>,
    path: PathParams,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    let result = state
        .openpitrix
        .applications
        .list_apps(param(&path, "workspace"), &query)?;
    Ok(Json(result))
}

async fn describe_app(
    State(state): State<AppState>,
    path: PathParams,
) -> Result<Json<HelmApplication>, ApiError> {
    Ok(Json(state.openpitrix.applications.describe_app(param(&path, "app"))?))
}

async fn list_app_versions(
    State(state): State<AppState>,
    path: PathParams,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    let result = state.openpitrix.applications.list_app_versions(
        param(&path, "workspace"),
        param(&path, "app"),
        &query,
    )?;
    Ok(Json(result))
}

async fn describe_app_version(
    State(state): State<AppState>,
    path: PathParams,
) -> Result<Json<HelmApplicationVersion>, ApiError> {
    let version = state
        .openpitrix
        .applications
        .describe_app_version(param(&path, "version"))?;
    Ok(Json(version))
}

async fn list_categories(
    State(state): State<AppState>,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    Ok(Json(state.openpitrix.categories.list_categories(&query)?))
}

async fn describe_category(
    State(state): State<AppState>,
    path: PathParams,
) -> Result<Json<HelmCategory>, ApiError> {
    let category = state
        .openpitrix
        .categories
        .describe_category(param(&path, "category"))?;
    Ok(Json(category))
}

async fn list_repos(
    State(state): State<AppState>,
    path: PathParams,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    let result = state
        .openpitrix
        .repos
        .list_repos(param(&path, "workspace"), &query)?;
    Ok(Json(result))
}

async fn describe_repo(
    State(state): State<AppState>,
    path: PathParams,
) -> Result<Json<HelmRepo>, ApiError> {
    Ok(Json(state.openpitrix.repos.describe_repo(param(&path, "repo"))?))
}

async fn list_applications(
    State(state): State<AppState>,
    path: PathParams,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    let result = state.openpitrix.releases.list_applications(
        param(&path, "workspace"),
        param(&path, "cluster"),
        param(&path, "namespace"),
        &query,
    )?;
    Ok(Json(result))
}

async fn describe_application(
    State(state): State<AppState>,
    path: PathParams,
) -> Result<Json<HelmRelease>, ApiError> {
    let release = state
        .openpitrix
        .releases
        .describe_application(param(&path, "application"))?;
    Ok(Json(release))
}
