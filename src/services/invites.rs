use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::db::queries::{self, CompanyCleaner};
use crate::errors::{AppError, AppResult};
use crate::models::{CleanerInvite, CleanerProfile, Company, InviteStatus, Role, User};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateInviteInput {
    pub email: Option<String>,
    pub expires_in_days: Option<i64>,
}

/// Expiry limits, in days.
#[derive(Debug, Clone, Copy)]
pub struct InvitePolicy {
    pub default_days: i64,
    pub max_days: i64,
}

impl InvitePolicy {
    pub fn expiry_days(&self, requested: Option<i64>) -> i64 {
        let max = self.max_days.max(1);
        requested.unwrap_or(self.default_days).clamp(1, max)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteCheck {
    pub valid: bool,
    pub status: Option<InviteStatus>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub expires_at: Option<NaiveDateTime>,
}

impl InviteCheck {
    fn unknown() -> Self {
        Self {
            valid: false,
            status: None,
            company_name: None,
            email: None,
            expires_at: None,
        }
    }
}

fn generate_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}

/// The company the acting company admin runs.
pub fn admin_company(conn: &Connection, actor: &User) -> AppResult<Company> {
    if !actor.role.is_company_admin() {
        return Err(AppError::Forbidden);
    }
    queries::get_company_for_admin(conn, &actor.id)?.ok_or(AppError::NotFound("company"))
}

pub fn create_invite(
    conn: &Connection,
    actor: &User,
    input: &CreateInviteInput,
    policy: InvitePolicy,
    now: NaiveDateTime,
) -> AppResult<(CleanerInvite, Company)> {
    let company = admin_company(conn, actor)?;

    let email = input
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string);
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(AppError::validation("invalid e-mail address"));
        }
    }

    let invite = CleanerInvite {
        id: uuid::Uuid::new_v4().to_string(),
        company_id: company.id.clone(),
        invited_by: actor.id.clone(),
        email,
        token: generate_token(),
        status: InviteStatus::Pending,
        expires_at: now + Duration::days(policy.expiry_days(input.expires_in_days)),
        accepted_by: None,
        accepted_at: None,
        created_at: now,
    };
    queries::create_invite(conn, &invite)?;

    tracing::info!(invite_id = %invite.id, company_id = %company.id, "cleaner invite created");
    Ok((invite, company))
}

fn expire_quietly(conn: &Connection, invite: &CleanerInvite) {
    match queries::transition_invite_status(conn, &invite.id, InviteStatus::Pending, InviteStatus::Expired) {
        Ok(_) => tracing::info!(invite_id = %invite.id, "invite expired"),
        Err(e) => tracing::warn!(invite_id = %invite.id, "failed to mark invite expired: {e}"),
    }
}

/// Public token check. Never fails for an unknown token.
pub fn validate_token(conn: &Connection, token: &str, now: NaiveDateTime) -> AppResult<InviteCheck> {
    let Some(mut invite) = queries::get_invite_by_token(conn, token.trim())? else {
        return Ok(InviteCheck::unknown());
    };

    if invite.status == InviteStatus::Pending && invite.is_expired(now) {
        expire_quietly(conn, &invite);
        invite.status = InviteStatus::Expired;
    }

    let company_name = queries::get_company(conn, &invite.company_id)?.map(|c| c.name);
    Ok(InviteCheck {
        valid: invite.is_usable(now),
        status: Some(invite.status),
        company_name,
        email: invite.email,
        expires_at: Some(invite.expires_at),
    })
}

/// Joins the invite's company as a `new`-tier cleaner. The role change,
/// profile, invite status and company counters land together or not at all.
pub fn accept_invite(
    conn: &mut Connection,
    user: &User,
    token: &str,
    now: NaiveDateTime,
) -> AppResult<(CleanerProfile, Company)> {
    if matches!(user.role, Role::Cleaner | Role::CompanyAdmin) {
        return Err(AppError::invalid_state(format!(
            "a {} cannot accept a cleaner invite",
            user.role.as_str()
        )));
    }

    let tx = conn.transaction()?;
    let invite = queries::get_invite_by_token(&tx, token.trim())?.ok_or(AppError::NotFound("invite"))?;

    if invite.status != InviteStatus::Pending {
        return Err(AppError::invalid_state(format!("invite is {}", invite.status.as_str())));
    }
    if invite.is_expired(now) {
        expire_quietly(&tx, &invite);
        tx.commit()?;
        return Err(AppError::invalid_state("invite has expired"));
    }
    if !invite.is_addressed_to(&user.email) {
        return Err(AppError::Forbidden);
    }
    if queries::get_cleaner_profile_by_user(&tx, &user.id)?.is_some() {
        return Err(AppError::invalid_state("you already have a cleaner profile"));
    }
    let company = queries::get_company(&tx, &invite.company_id)?.ok_or(AppError::NotFound("company"))?;

    if !queries::mark_invite_accepted(&tx, &invite.id, &user.id, &now)? {
        return Err(AppError::conflict("invite was already used"));
    }
    if !queries::update_user_role_if(&tx, &user.id, user.role, Role::Cleaner)? {
        return Err(AppError::conflict("role was changed by another request"));
    }
    let profile = CleanerProfile::new_for_user(&user.id, Some(company.id.clone()), now);
    queries::create_cleaner_profile(&tx, &profile)?;
    queries::adjust_company_cleaners(&tx, &company.id, 1)?;
    let company = queries::get_company(&tx, &company.id)?.ok_or(AppError::NotFound("company"))?;
    tx.commit()?;

    tracing::info!(
        invite_id = %invite.id,
        user_id = %user.id,
        company_id = %company.id,
        "invite accepted"
    );
    Ok((profile, company))
}

pub fn revoke_invite(conn: &Connection, actor: &User, id: &str) -> AppResult<CleanerInvite> {
    let company = admin_company(conn, actor)?;
    let invite = match queries::get_invite(conn, id)? {
        Some(invite) if invite.company_id == company.id => invite,
        _ => return Err(AppError::NotFound("invite")),
    };
    if invite.status != InviteStatus::Pending {
        return Err(AppError::invalid_state(format!(
            "only pending invites can be revoked; this one is {}",
            invite.status.as_str()
        )));
    }
    if !queries::transition_invite_status(conn, id, InviteStatus::Pending, InviteStatus::Revoked)? {
        return Err(AppError::conflict("invite was changed by another request"));
    }
    tracing::info!(invite_id = %id, "invite revoked");
    queries::get_invite(conn, id)?.ok_or(AppError::NotFound("invite"))
}

pub fn company_invites(conn: &Connection, actor: &User) -> AppResult<Vec<CleanerInvite>> {
    let company = admin_company(conn, actor)?;
    Ok(queries::list_company_invites(conn, &company.id)?)
}

pub fn company_cleaners(conn: &Connection, actor: &User) -> AppResult<Vec<CompanyCleaner>> {
    let company = admin_company(conn, actor)?;
    Ok(queries::list_company_cleaners(conn, &company.id)?)
}

/// Removes a cleaner from the admin's company. The cleaner keeps their role
/// and profile.
pub fn detach_cleaner(conn: &mut Connection, actor: &User, profile_id: &str) -> AppResult<()> {
    let tx = conn.transaction()?;
    let company = admin_company(&tx, actor)?;
    if !queries::detach_cleaner_from_company(&tx, profile_id, &company.id)? {
        return Err(AppError::NotFound("cleaner"));
    }
    queries::adjust_company_cleaners(&tx, &company.id, -1)?;
    tx.commit()?;

    tracing::info!(cleaner_profile_id = %profile_id, company_id = %company.id, "cleaner detached");
    Ok(())
}
