use crate::{error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// 网关签发的JWT声明, sub 是整数用户ID
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// 已认证的请求用户
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
}

/// 认证中间件
///
/// 校验 Bearer JWT 并把用户身份放进请求扩展;
/// 无令牌或校验失败的请求按未认证继续, 由各路由决定是否拒绝。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                match verify_token(&app_state.config.jwt_secret, token) {
                    Ok(user) => {
                        debug!("Authenticated user: {}", user.id);
                        request.extensions_mut().insert(user);
                    }
                    Err(e) => {
                        debug!("JWT verification failed: {}", e);
                    }
                }
            }
        }
    }

    Ok(next.run(request).await)
}

fn verify_token(secret: &str, token: &str) -> crate::error::Result<AuthUser> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(token, &decoding_key, &validation)?;

    let id = token_data
        .claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::Authentication("Token subject is not a user id".to_string()))?;

    Ok(AuthUser { id })
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<AuthUser>);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthUser>().copied();
        Ok(OptionalAuth(user))
    }
}

/// 必须认证的提取器
pub struct RequireAuth(pub AuthUser);

#[async_trait::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;
        Ok(RequireAuth(user))
    }
}
