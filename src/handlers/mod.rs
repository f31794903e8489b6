pub mod account;
pub mod applications;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod cleaners;
pub mod health;
pub mod invites;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // account
        .route("/api/me", get(account::me))
        .route("/api/me/role", post(account::change_role))
        .route(
            "/api/me/addresses",
            get(account::my_addresses).post(account::add_address),
        )
        .route(
            "/api/me/addresses/:id/default",
            post(account::set_default_address),
        )
        // applications
        .route("/api/applications", post(applications::submit_application))
        .route("/api/applications/mine", get(applications::my_applications))
        .route("/api/applications/:id", get(applications::get_application))
        .route(
            "/api/admin/applications/pending",
            get(applications::pending_applications),
        )
        .route(
            "/api/admin/applications/:id/approve",
            post(applications::approve_application),
        )
        .route(
            "/api/admin/applications/:id/reject",
            post(applications::reject_application),
        )
        // bookings
        .route("/api/pricing/quote", post(cleaners::quote))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/mine", get(bookings::my_bookings))
        .route("/api/bookings/upcoming", get(bookings::upcoming_bookings))
        .route("/api/bookings/:id", get(bookings::get_booking))
        .route("/api/bookings/:id/update", post(bookings::update_booking))
        .route("/api/bookings/:id/confirm", post(bookings::confirm_booking))
        .route("/api/bookings/:id/start", post(bookings::start_booking))
        .route("/api/bookings/:id/complete", post(bookings::complete_booking))
        .route("/api/bookings/:id/no-show", post(bookings::mark_no_show))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/jobs/mine", get(bookings::my_jobs))
        // cleaner search
        .route("/api/cleaners/area", get(cleaners::cleaners_in_area))
        .route(
            "/api/cleaners/postal/:code",
            get(cleaners::cleaners_by_postal_code),
        )
        .route("/api/cleaners/available", get(cleaners::available_cleaners))
        // cleaner self-service
        .route(
            "/api/cleaner/profile",
            get(cleaners::my_profile).put(cleaners::update_profile),
        )
        .route(
            "/api/cleaner/areas",
            get(cleaners::my_service_areas).post(cleaners::add_service_area),
        )
        .route("/api/cleaner/areas/:id", delete(cleaners::remove_service_area))
        .route(
            "/api/cleaner/availability",
            get(cleaners::my_availability).post(cleaners::add_availability),
        )
        .route(
            "/api/cleaner/availability/:id",
            delete(cleaners::remove_availability),
        )
        .route("/api/admin/cleaners/:id/tier", put(cleaners::set_tier))
        // company invites
        .route(
            "/api/company/invites",
            get(invites::company_invites).post(invites::create_invite),
        )
        .route(
            "/api/company/invites/:id/revoke",
            post(invites::revoke_invite),
        )
        .route("/api/company/cleaners", get(invites::company_cleaners))
        .route(
            "/api/company/cleaners/:id",
            delete(invites::detach_cleaner),
        )
        .route("/api/invites/validate/:token", get(invites::validate_invite))
        .route("/api/invites/accept", post(invites::accept_invite))
        // catalog and reviews
        .route("/api/services", get(catalog::get_catalog))
        .route("/api/admin/services", put(catalog::update_catalog))
        .route("/api/reviews", post(catalog::create_review))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
