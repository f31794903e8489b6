use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::{
    Application, ApplicationDocuments, ApplicationStatus, ApplicationType, CleanerProfile, Company,
    CompanyInfo, Role, User,
};

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitApplicationInput {
    pub application_type: ApplicationType,
    pub company: Option<CompanyInfo>,
    #[serde(default)]
    pub documents: ApplicationDocuments,
    pub message: Option<String>,
}

fn require_global_admin(actor: &User) -> AppResult<()> {
    if actor.role.is_global_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}

pub fn submit_application(
    conn: &Connection,
    applicant: &User,
    input: SubmitApplicationInput,
    now: NaiveDateTime,
) -> AppResult<Application> {
    let company = match input.company {
        Some(info) if !info.name.trim().is_empty() => info,
        _ => return Err(AppError::validation("company information is required")),
    };

    match input.application_type {
        ApplicationType::Cleaner => {
            if !matches!(applicant.role, Role::Client | Role::PendingApplication) {
                return Err(AppError::invalid_state(format!(
                    "a {} cannot apply to become a cleaner",
                    applicant.role.as_str()
                )));
            }
            if !has_text(input.documents.identity_document_url.as_deref()) {
                return Err(AppError::validation("an identity document is required"));
            }
        }
        ApplicationType::CompanyAdmin => {
            if applicant.role.is_company_admin() {
                return Err(AppError::invalid_state("you already administer a company"));
            }
        }
    }

    // One open application per user, whatever its type.
    for kind in [ApplicationType::Cleaner, ApplicationType::CompanyAdmin] {
        if queries::has_pending_application(conn, &applicant.id, kind)? {
            return Err(AppError::conflict(format!(
                "you already have a pending {} application",
                kind.as_str()
            )));
        }
    }

    let application = Application {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: applicant.id.clone(),
        application_type: input.application_type,
        status: ApplicationStatus::Pending,
        company: Some(CompanyInfo {
            name: company.name.trim().to_string(),
            ..company
        }),
        documents: input.documents,
        message: input.message,
        reviewed_by: None,
        reviewed_at: None,
        rejection_reason: None,
        created_at: now,
        updated_at: now,
    };
    queries::create_application(conn, &application)?;

    tracing::info!(
        application_id = %application.id,
        user_id = %applicant.id,
        kind = application.application_type.as_str(),
        "application submitted"
    );

    // The application stands even if the role update does not land.
    if application.application_type == ApplicationType::Cleaner {
        match queries::update_user_role_if(conn, &applicant.id, applicant.role, Role::PendingCleaner) {
            Ok(true) => {}
            Ok(false) => tracing::warn!(user_id = %applicant.id, "role changed concurrently; left as is"),
            Err(e) => tracing::warn!(user_id = %applicant.id, "failed to mark applicant pending: {e}"),
        }
    }

    Ok(application)
}

fn load_pending(conn: &Connection, id: &str) -> AppResult<Application> {
    let application = queries::get_application(conn, id)?.ok_or(AppError::NotFound("application"))?;
    if application.status != ApplicationStatus::Pending {
        return Err(AppError::invalid_state(format!(
            "application is already {}",
            application.status.as_str()
        )));
    }
    Ok(application)
}

fn new_company(info: &CompanyInfo, admin_user_id: Option<String>, now: NaiveDateTime) -> Company {
    Company {
        id: uuid::Uuid::new_v4().to_string(),
        name: info.name.clone(),
        company_type: info.company_type,
        registration_number: info.registration_number.clone(),
        admin_user_id,
        total_cleaners: 0,
        active_cleaners: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Approves a pending application, grants the role its type maps to and
/// provisions the company (and, for cleaners, the profile). One transaction.
pub fn approve_application(
    conn: &mut Connection,
    reviewer: &User,
    id: &str,
    now: NaiveDateTime,
) -> AppResult<Application> {
    require_global_admin(reviewer)?;

    let tx = conn.transaction()?;
    let application = load_pending(&tx, id)?;
    let info = application
        .company
        .clone()
        .ok_or_else(|| AppError::invalid_state("application has no company information"))?;

    if !queries::resolve_application(&tx, id, ApplicationStatus::Approved, &reviewer.id, None, &now)? {
        return Err(AppError::conflict("application was resolved by another request"));
    }

    let applicant = queries::get_user(&tx, &application.user_id)?.ok_or(AppError::NotFound("applicant"))?;
    let role = application.application_type.granted_role();
    if applicant.role.is_global_admin()
        || (application.application_type == ApplicationType::Cleaner && applicant.role.is_company_admin())
    {
        return Err(AppError::invalid_state(format!(
            "a {} cannot be approved as {}",
            applicant.role.as_str(),
            role.as_str()
        )));
    }
    if !queries::update_user_role_if(&tx, &applicant.id, applicant.role, role)? {
        return Err(AppError::conflict("applicant's role changed during review"));
    }

    match application.application_type {
        ApplicationType::Cleaner => {
            if queries::get_cleaner_profile_by_user(&tx, &application.user_id)?.is_none() {
                let company = new_company(&info, None, now);
                queries::create_company(&tx, &company)?;
                let profile = CleanerProfile::new_for_user(&application.user_id, Some(company.id.clone()), now);
                queries::create_cleaner_profile(&tx, &profile)?;
                queries::adjust_company_cleaners(&tx, &company.id, 1)?;
            }
        }
        ApplicationType::CompanyAdmin => {
            if queries::get_company_for_admin(&tx, &application.user_id)?.is_none() {
                let company = new_company(&info, Some(application.user_id.clone()), now);
                queries::create_company(&tx, &company)?;
            }
        }
    }

    let approved = queries::get_application(&tx, id)?.ok_or(AppError::NotFound("application"))?;
    tx.commit()?;

    tracing::info!(
        application_id = %id,
        user_id = %approved.user_id,
        role = role.as_str(),
        "application approved"
    );
    Ok(approved)
}

pub fn reject_application(
    conn: &mut Connection,
    reviewer: &User,
    id: &str,
    reason: Option<String>,
    now: NaiveDateTime,
) -> AppResult<Application> {
    require_global_admin(reviewer)?;
    let reason = reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

    let tx = conn.transaction()?;
    let application = load_pending(&tx, id)?;
    if !queries::resolve_application(
        &tx,
        id,
        ApplicationStatus::Rejected,
        &reviewer.id,
        reason.as_deref(),
        &now,
    )? {
        return Err(AppError::conflict("application was resolved by another request"));
    }
    tx.commit()?;

    tracing::info!(application_id = %id, user_id = %application.user_id, "application rejected");

    if let Err(e) = queries::update_user_role_if(conn, &application.user_id, Role::PendingCleaner, Role::RejectedCleaner) {
        tracing::warn!(user_id = %application.user_id, "failed to mark applicant rejected: {e}");
    }

    queries::get_application(conn, id)?.ok_or(AppError::NotFound("application"))
}

/// Visible to the applicant and global admins only.
pub fn get_application(conn: &Connection, actor: &User, id: &str) -> AppResult<Application> {
    match queries::get_application(conn, id)? {
        Some(app) if app.user_id == actor.id || actor.role.is_global_admin() => Ok(app),
        _ => Err(AppError::NotFound("application")),
    }
}

pub fn my_applications(conn: &Connection, actor: &User) -> AppResult<Vec<Application>> {
    Ok(queries::list_user_applications(conn, &actor.id)?)
}

pub fn pending_applications(conn: &Connection, actor: &User) -> AppResult<Vec<Application>> {
    require_global_admin(actor)?;
    Ok(queries::list_pending_applications(conn)?)
}

/// Self-service role change, limited to the allow-listed moves.
pub fn change_own_role(conn: &Connection, user: &User, target: Role) -> AppResult<User> {
    if !user.role.can_self_transition_to(target) {
        return Err(AppError::invalid_state(format!(
            "cannot change role from {} to {}",
            user.role.as_str(),
            target.as_str()
        )));
    }
    if !queries::update_user_role_if(conn, &user.id, user.role, target)? {
        return Err(AppError::conflict("role was changed by another request"));
    }
    tracing::info!(user_id = %user.id, from = user.role.as_str(), to = target.as_str(), "role changed");
    queries::get_user(conn, &user.id)?.ok_or(AppError::NotFound("user"))
}
