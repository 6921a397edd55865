//! 配置接口 config.imaginekube.com/v1alpha2

use super::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::BTreeMap;

pub(super) fn routes() -> Router<AppState> {
    Router::new().route("/configs/configz", get(configz))
}

/// 当前生效配置的功能开关表
async fn configz(State(state): State<AppState>) -> Json<BTreeMap<String, bool>> {
    Json(state.config.read().await.to_map())
}
