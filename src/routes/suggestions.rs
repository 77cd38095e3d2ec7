use crate::{
    error::Result,
    state::AppState,
    utils::middleware::RequireAuth,
    utils::retry::retry_transient,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub limit: Option<usize>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_suggestions))
}

/// 二度连接推荐
/// GET /api/graph/suggestions
async fn get_suggestions(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<Value>> {
    debug!("Getting connection suggestions for user {}", user.id);

    let limit = query
        .limit
        .unwrap_or(state.config.suggestion_default_limit)
        .min(state.config.suggestion_max_limit);
    let suggestions = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.suggest_connections(user.id, limit).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": suggestions
    })))
}
