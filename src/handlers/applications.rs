use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::db::{self, queries};
use crate::errors::AppResult;
use crate::handlers::auth::AuthUser;
use crate::models::Application;
use crate::services::applications::{self, SubmitApplicationInput};
use crate::services::notify::Notification;
use crate::state::AppState;

// POST /api/applications
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<SubmitApplicationInput>,
) -> AppResult<(StatusCode, Json<Application>)> {
    let application = {
        let db = state.conn()?;
        applications::submit_application(&db, &user, input, db::now())?
    };

    state
        .notify(Notification::ApplicationSubmitted {
            application_id: application.id.clone(),
            applicant_email: user.email.clone(),
            application_type: application.application_type.as_str().to_string(),
        })
        .await;
    Ok((StatusCode::CREATED, Json(application)))
}

// GET /api/applications/mine
pub async fn my_applications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Application>>> {
    let db = state.conn()?;
    Ok(Json(applications::my_applications(&db, &user)?))
}

// GET /api/applications/:id
pub async fn get_application(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Application>> {
    let db = state.conn()?;
    Ok(Json(applications::get_application(&db, &user, &id)?))
}

// GET /api/admin/applications/pending
pub async fn pending_applications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<Application>>> {
    let db = state.conn()?;
    Ok(Json(applications::pending_applications(&db, &user)?))
}

// POST /api/admin/applications/:id/approve
pub async fn approve_application(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Application>> {
    let (application, applicant) = {
        let mut db = state.conn()?;
        let application = applications::approve_application(&mut db, &user, &id, db::now())?;
        let applicant = queries::get_user(&db, &application.user_id)?;
        (application, applicant)
    };

    if let Some(applicant) = applicant {
        state
            .notify(Notification::ApplicationApproved {
                applicant_email: applicant.email,
                application_type: application.application_type.as_str().to_string(),
            })
            .await;
    }
    Ok(Json(application))
}

// POST /api/admin/applications/:id/reject
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    reason: Option<String>,
}

pub async fn reject_application(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> AppResult<Json<Application>> {
    let reason = body.and_then(|Json(req)| req.reason);
    let (application, applicant) = {
        let mut db = state.conn()?;
        let application = applications::reject_application(&mut db, &user, &id, reason, db::now())?;
        let applicant = queries::get_user(&db, &application.user_id)?;
        (application, applicant)
    };

    if let Some(applicant) = applicant {
        state
            .notify(Notification::ApplicationRejected {
                applicant_email: applicant.email,
                reason: application.rejection_reason.clone(),
            })
            .await;
    }
    Ok(Json(application))
}
