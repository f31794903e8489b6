use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::{self, queries::CompanyCleaner};
use crate::errors::AppResult;
use crate::handlers::auth::AuthUser;
use crate::models::{CleanerInvite, CleanerProfile, Company};
use crate::services::invites::{self, CreateInviteInput, InviteCheck, InvitePolicy};
use crate::services::notify::Notification;
use crate::state::AppState;

fn invite_link(base_url: &str, token: &str) -> String {
    format!("{}/join/{}", base_url.trim_end_matches('/'), token)
}

// GET /api/company/invites
pub async fn company_invites(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<CleanerInvite>>> {
    let db = state.conn()?;
    Ok(Json(invites::company_invites(&db, &user)?))
}

// POST /api/company/invites
#[derive(Serialize)]
pub struct CreateInviteResponse {
    invite: CleanerInvite,
    link: String,
}

pub async fn create_invite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(input): Json<CreateInviteInput>,
) -> AppResult<(StatusCode, Json<CreateInviteResponse>)> {
    let policy = InvitePolicy {
        default_days: state.config.invite_default_days,
        max_days: state.config.invite_max_days,
    };
    let (invite, company) = {
        let db = state.conn()?;
        invites::create_invite(&db, &user, &input, policy, db::now())?
    };

    let link = invite_link(&state.config.app_base_url, &invite.token);
    state
        .notify(Notification::InviteCreated {
            company_name: company.name,
            email: invite.email.clone(),
            link: link.clone(),
        })
        .await;
    Ok((StatusCode::CREATED, Json(CreateInviteResponse { invite, link })))
}

// POST /api/company/invites/:id/revoke
pub async fn revoke_invite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<CleanerInvite>> {
    let db = state.conn()?;
    Ok(Json(invites::revoke_invite(&db, &user, &id)?))
}

// GET /api/invites/validate/:token
pub async fn validate_invite(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> AppResult<Json<InviteCheck>> {
    let db = state.conn()?;
    Ok(Json(invites::validate_token(&db, &token, db::now())?))
}

// POST /api/invites/accept
#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    token: String,
}

#[derive(Serialize)]
pub struct AcceptInviteResponse {
    profile: CleanerProfile,
    company: Company,
}

pub async fn accept_invite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<AcceptInviteRequest>,
) -> AppResult<Json<AcceptInviteResponse>> {
    let (profile, company) = {
        let mut db = state.conn()?;
        invites::accept_invite(&mut db, &user, &req.token, db::now())?
    };

    state
        .notify(Notification::InviteAccepted {
            company_name: company.name.clone(),
            cleaner_email: user.email.clone(),
        })
        .await;
    Ok(Json(AcceptInviteResponse { profile, company }))
}

// GET /api/company/cleaners
pub async fn company_cleaners(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> AppResult<Json<Vec<CompanyCleaner>>> {
    let db = state.conn()?;
    Ok(Json(invites::company_cleaners(&db, &user)?))
}

// DELETE /api/company/cleaners/:id
pub async fn detach_cleaner(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(profile_id): Path<String>,
) -> AppResult<StatusCode> {
    let mut db = state.conn()?;
    invites::detach_cleaner(&mut db, &user, &profile_id)?;
    Ok(StatusCode::NO_CONTENT)
}
