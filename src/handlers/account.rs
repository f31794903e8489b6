use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db;
use crate::errors::AppResult;
use crate::handlers::auth::AuthUser;
use crate::models::{Address, Role, User};
use crate::services::addresses;
use crate::services::applications;
use crate::services::bookings::AddressInput;
use crate::state::AppState;

// GET /api/me
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}

// POST /api/me/role
#[derive(Debug, Deserialize)]
pub struct RoleChangeRequest {
    role: Role,
}

pub async fn change_role(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<RoleChangeRequest>,
) -> AppResult<Json<User>> {
    let db = state.conn()?;
    Ok(Json(applications::change_own_role(&db, &user, req.role)?))
}

// GET /api/me/addresses
pub async fn my_addresses(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Address>>> {
    let db = state.conn()?;
    Ok(Json(addresses::my_addresses(&db, &user)?))
}

// POST /api/me/addresses
pub async fn add_address(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<AddressInput>,
) -> AppResult<(StatusCode, Json<Address>)> {
    let db = state.conn()?;
    let address = addresses::add_address(&db, &user, &input, db::now())?;
    Ok((StatusCode::CREATED, Json(address)))
}

// POST /api/me/addresses/:id/default
pub async fn set_default_address(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Address>>> {
    let mut db = state.conn()?;
    Ok(Json(addresses::make_default(&mut db, &user, &id)?))
}
