use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::db;
use crate::errors::AppResult;
use crate::handlers::auth::AuthUser;
use crate::models::Review;
use crate::services::catalog::{self, Catalog};
use crate::services::reviews::{self, CreateReviewInput};
use crate::state::AppState;

// GET /api/services
pub async fn get_catalog(State(state): State<Arc<AppState>>) -> AppResult<Json<Catalog>> {
    let db = state.conn()?;
    Ok(Json(catalog::load(&db)?))
}

// PUT /api/admin/services
pub async fn update_catalog(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(update): Json<Catalog>,
) -> AppResult<Json<Catalog>> {
    let mut db = state.conn()?;
    Ok(Json(catalog::upsert(&mut db, &user, &update)?))
}

// POST /api/reviews
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateReviewInput>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let mut db = state.conn()?;
    let review = reviews::create_review(&mut db, &user, &input, db::now())?;
    Ok((StatusCode::CREATED, Json(review)))
}
