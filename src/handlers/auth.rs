use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;

/// The caller, resolved from `Authorization: Bearer <token>`.
pub struct AuthUser(pub User);

/// The caller if a bearer token was sent. A token that is present but
/// invalid is still rejected.
pub struct MaybeUser(pub Option<User>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn resolve(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = bearer_token(parts) else {
        return Ok(None);
    };
    let user_id = state
        .tokens
        .verify(token, db::now())
        .ok_or(AppError::Unauthenticated)?;

    let conn = state.conn()?;
    let user = queries::get_user(&conn, &user_id)?.ok_or(AppError::Unauthenticated)?;
    Ok(Some(user))
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        resolve(parts, state)?
            .map(AuthUser)
            .ok_or(AppError::Unauthenticated)
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state)?))
    }
}
