//! 通用资源接口 resources.imaginekube.com/v1alpha3

use super::{ApiError, AppState};
use axum::extract::{Path, Query as QueryParams, State};
use axum::routing::get;
use axum::{Json, Router};
use imaginekube_common::{ListResult, Query};
use serde_json::Value;

type Params = QueryParams<Vec<(String, String)>>;

const NAMESPACES: &str = "namespaces";

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/namespaces", get(list_namespaces))
        .route("/namespaces/{namespace}", get(get_namespace))
        .route("/namespaces/{namespace}/{resources}", get(list_namespaced))
        .route("/namespaces/{namespace}/{resources}/{name}", get(get_namespaced))
        .route("/{resources}", get(list_cluster))
        .route("/{resources}/{name}", get(get_cluster))
}

async fn list_cluster(
    State(state): State<AppState>,
    Path(resources): Path<String>,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    Ok(Json(state.resources.list(&resources, "", &query)?))
}

async fn get_cluster(
    State(state): State<AppState>,
    Path((resources, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.resources.get(&resources, "", &name)?))
}

async fn list_namespaces(
    State(state): State<AppState>,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    Ok(Json(state.resources.list(NAMESPACES, "", &query)?))
}

async fn get_namespace(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.resources.get(NAMESPACES, "", &namespace)?))
}

async fn list_namespaced(
    State(state): State<AppState>,
    Path((namespace, resources)): Path<(String, String)>,
    QueryParams(params): Params,
) -> Result<Json<ListResult>, ApiError> {
    let query = Query::from_pairs(params);
    Ok(Json(state.resources.list(&resources, &namespace, &query)?))
}

async fn get_namespaced(
    State(state): State<AppState>,
    Path((namespace, resources, name)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.resources.get(&resources, &namespace, &name)?))
}
