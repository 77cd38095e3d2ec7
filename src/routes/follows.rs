use crate::{
    error::Result,
    models::edge::FollowEntry,
    state::AppState,
    utils::middleware::{OptionalAuth, RequireAuth},
    utils::retry::retry_transient,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MutualQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InteractionRequest {
    #[validate(range(min = 0.000001, message = "delta must be positive"))]
    pub delta: f64,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/:user_id/follow", post(follow_user).delete(unfollow_user))
        .route("/user/:user_id/followers", get(get_followers))
        .route("/user/:user_id/following", get(get_following))
        .route("/user/:user_id/relationship", get(get_relationship))
        .route("/user/:user_id/stats", get(get_stats))
        .route("/user/:user_id/interactions", post(record_interaction))
        .route("/mutual/:target_user_id", get(get_mutual))
}

/// 关注用户
/// POST /api/graph/follows/user/:user_id/follow
async fn follow_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>> {
    debug!("User {} following user {}", user.id, user_id);

    let created = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.create_edge(user.id, user_id).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "created": created
        }
    })))
}

/// 取消关注用户
/// DELETE /api/graph/follows/user/:user_id/follow
async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>> {
    debug!("User {} unfollowing user {}", user.id, user_id);

    let removed = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.delete_edge(user.id, user_id).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "removed": removed
        }
    })))
}

/// 获取用户的粉丝列表
/// GET /api/graph/follows/user/:user_id/followers
async fn get_followers(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
    OptionalAuth(_user): OptionalAuth,
) -> Result<Json<Value>> {
    debug!("Getting followers for user {}", user_id);

    let (limit, offset) = page_bounds(&state, query.page, query.limit);
    let edges = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.list_incoming(user_id, limit, offset).await }
    })
    .await?;

    let followers: Vec<FollowEntry> = edges.into_iter().map(FollowEntry::follower).collect();

    Ok(Json(json!({
        "success": true,
        "data": followers
    })))
}

/// 获取用户关注的人列表
/// GET /api/graph/follows/user/:user_id/following
async fn get_following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
    OptionalAuth(_user): OptionalAuth,
) -> Result<Json<Value>> {
    debug!("Getting following for user {}", user_id);

    let (limit, offset) = page_bounds(&state, query.page, query.limit);
    let edges = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.list_outgoing(user_id, limit, offset).await }
    })
    .await?;

    let following: Vec<FollowEntry> = edges.into_iter().map(FollowEntry::following).collect();

    Ok(Json(json!({
        "success": true,
        "data": following
    })))
}

/// 当前用户与目标用户的双向关系
/// GET /api/graph/follows/user/:user_id/relationship
async fn get_relationship(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>> {
    debug!("Getting relationship between {} and {}", user.id, user_id);

    let relationship = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.get_relationship(user.id, user_id).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": relationship
    })))
}

/// 用户的关注统计
/// GET /api/graph/follows/user/:user_id/stats
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>> {
    debug!("Getting graph stats for user {}", user_id);

    let stats = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.get_stats(user_id).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": stats
    })))
}

/// 记录一次交互, 累加关系权重
/// POST /api/graph/follows/user/:user_id/interactions
async fn record_interaction(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(user_id): Path<i64>,
    Json(request): Json<InteractionRequest>,
) -> Result<Json<Value>> {
    debug!(
        "User {} recording interaction with user {} (delta {})",
        user.id, user_id, request.delta
    );
    request.validate()?;

    let edge = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        let delta = request.delta;
        async move { service.record_interaction(user.id, user_id, delta).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "weight": edge.interaction_weight,
            "last_interaction_at": edge.last_interaction_at
        }
    })))
}

/// 共同关注的用户
/// GET /api/graph/follows/mutual/:target_user_id
async fn get_mutual(
    State(state): State<Arc<AppState>>,
    RequireAuth(user): RequireAuth,
    Path(target_user_id): Path<i64>,
    Query(query): Query<MutualQuery>,
) -> Result<Json<Value>> {
    debug!(
        "Getting mutual connections between {} and {}",
        user.id, target_user_id
    );

    let limit = query
        .limit
        .unwrap_or(state.config.default_page_size as usize)
        .min(state.config.max_page_size as usize);
    let mutual = retry_transient(&state.config, || {
        let service = state.graph_service.clone();
        async move { service.list_mutual(user.id, target_user_id, limit).await }
    })
    .await?;

    Ok(Json(json!({
        "success": true,
        "data": mutual
    })))
}

fn page_bounds(state: &AppState, page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit
        .unwrap_or(state.config.default_page_size)
        .clamp(1, state.config.max_page_size);
    (limit, (page - 1) * limit)
}
