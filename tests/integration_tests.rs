use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use cleanmarket::config::AppConfig;
use cleanmarket::db::{self, queries};
use cleanmarket::handlers;
use cleanmarket::models::{Role, User};
use cleanmarket::services::notify::{Notification, Notifier};
use cleanmarket::state::AppState;

// ── Mock Notifier ──

struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn notify(&self, _notification: &Notification) -> anyhow::Result<()> {
        anyhow::bail!("provider unavailable")
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        database_url: ":memory:".to_string(),
        token_secret: "test-secret".to_string(),
        app_base_url: "https://app.test".to_string(),
        ..AppConfig::default()
    }
}

fn test_state() -> (Arc<AppState>, Arc<Mutex<Vec<Notification>>>) {
    let conn = db::init_db(":memory:").unwrap();
    let sent = Arc::new(Mutex::new(vec![]));
    let notifiers: Vec<Box<dyn Notifier>> = vec![
        Box::new(FailingNotifier),
        Box::new(RecordingNotifier {
            sent: Arc::clone(&sent),
        }),
    ];
    let state = Arc::new(AppState::new(conn, test_config(), notifiers));
    (state, sent)
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn seed_user(state: &AppState, name: &str, role: Role) -> (User, String) {
    let now = db::now();
    let user = User {
        id: uuid::Uuid::new_v4().to_string(),
        email: format!("{name}@example.ro"),
        first_name: name.to_string(),
        last_name: "Test".to_string(),
        phone: None,
        role,
        created_at: now,
        updated_at: now,
    };
    queries::create_user(&state.db.lock().unwrap(), &user).unwrap();
    let token = state.tokens.issue(&user.id, now).unwrap();
    (user, token)
}

async fn send(
    state: &Arc<AppState>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let req = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = test_app(Arc::clone(state)).oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn kinds(sent: &Arc<Mutex<Vec<Notification>>>) -> Vec<&'static str> {
    sent.lock().unwrap().iter().map(|n| n.kind()).collect()
}

/// Takes a client through the cleaner application and approval, then gives
/// them a rate and a city-wide service area.
async fn onboard_cleaner(state: &Arc<AppState>, admin_token: &str, name: &str) -> (User, String, String) {
    let (user, token) = seed_user(state, name, Role::Client);

    let (status, application) = send(
        state,
        "POST",
        "/api/applications",
        Some(&token),
        Some(json!({
            "application_type": "cleaner",
            "company": {"name": format!("{name} Curatenie"), "company_type": "individual"},
            "documents": {"identity_document_url": "https://files.test/id.pdf"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = application["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        state,
        "POST",
        &format!("/api/admin/applications/{id}/approve"),
        Some(admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, profile) = send(
        state,
        "PUT",
        "/api/cleaner/profile",
        Some(&token),
        Some(json!({"hourly_rate": 5000, "bio": "Punctual si atenta"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let profile_id = profile["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        state,
        "POST",
        "/api/cleaner/areas",
        Some(&token),
        Some(json!({"city": "Cluj-Napoca", "travel_fee": 1000})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    (user, token, profile_id)
}

fn booking_body(profile_id: &str, time: &str) -> Value {
    json!({
        "cleaner_profile_id": profile_id,
        "service_type": "standard_cleaning",
        "scheduled_date": "2030-06-17",
        "scheduled_time": time,
        "address": {"street": "Str. Memorandumului 10", "city": "Cluj-Napoca"}
    })
}

// ── Health & Auth ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let (status, body) = send(&state, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requires_auth() {
    let (state, _) = test_state();

    let (status, body) = send(&state, "GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&state, "GET", "/api/me", Some("forged.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_token_rejected_even_on_guest_route() {
    let (state, _) = test_state();
    let (status, _) = send(
        &state,
        "POST",
        "/api/bookings",
        Some("garbage"),
        Some(booking_body("missing", "09:00")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbidden_for_clients() {
    let (state, _) = test_state();
    let (_, token) = seed_user(&state, "ana", Role::Client);

    let (status, body) = send(&state, "GET", "/api/admin/applications/pending", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = send(&state, "PUT", "/api/admin/services", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_booking_is_not_found() {
    let (state, _) = test_state();
    let (_, token) = seed_user(&state, "ana", Role::Client);
    let (status, _) = send(&state, "GET", "/api/bookings/nope", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Onboarding ──

#[tokio::test]
async fn test_application_scenario_end_to_end() {
    let (state, sent) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, cleaner_token, profile_id) = onboard_cleaner(&state, &admin_token, "maria").await;

    let (_, me) = send(&state, "GET", "/api/me", Some(&cleaner_token), None).await;
    assert_eq!(me["role"], "cleaner");

    let (_, profile) = send(&state, "GET", "/api/cleaner/profile", Some(&cleaner_token), None).await;
    assert_eq!(profile["id"], profile_id.as_str());
    assert_eq!(profile["tier"], "new");
    assert_eq!(profile["hourly_rate"], 5000);

    let (_, pending) = send(&state, "GET", "/api/admin/applications/pending", Some(&admin_token), None).await;
    assert_eq!(pending.as_array().unwrap().len(), 0);

    let (_, mine) = send(&state, "GET", "/api/applications/mine", Some(&cleaner_token), None).await;
    assert_eq!(mine[0]["status"], "approved");

    // the failing notifier never blocks the recording one
    assert_eq!(kinds(&sent), vec!["application_submitted", "application_approved"]);
}

#[tokio::test]
async fn test_rejection_and_duplicate_pending_application() {
    let (state, sent) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, token) = seed_user(&state, "ion", Role::Client);
    let body = json!({
        "application_type": "company_admin",
        "company": {"name": "Ion Clean SRL", "company_type": "business", "registration_number": "J12/1/2020"}
    });

    let (status, application) = send(&state, "POST", "/api/applications", Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&state, "POST", "/api/applications", Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let id = application["id"].as_str().unwrap();
    let (status, rejected) = send(
        &state,
        "POST",
        &format!("/api/admin/applications/{id}/reject"),
        Some(&admin_token),
        Some(json!({"reason": "missing registration papers"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejected["status"], "rejected");

    let (status, _) = send(
        &state,
        "POST",
        &format!("/api/admin/applications/{id}/approve"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, me) = send(&state, "GET", "/api/me", Some(&token), None).await;
    assert_eq!(me["role"], "client");
    assert!(kinds(&sent).contains(&"application_rejected"));
}

#[tokio::test]
async fn test_role_change_rules() {
    let (state, _) = test_state();
    let (_, token) = seed_user(&state, "ana", Role::Client);

    let (status, _) = send(&state, "POST", "/api/me/role", Some(&token), Some(json!({"role": "global_admin"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&state, "POST", "/api/me/role", Some(&token), Some(json!({"role": "wizard"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, me) = send(
        &state,
        "POST",
        "/api/me/role",
        Some(&token),
        Some(json!({"role": "pending_application"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "pending_application");
}

// ── Bookings ──

#[tokio::test]
async fn test_guest_checkout_lifecycle_and_review() {
    let (state, sent) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, cleaner_token, profile_id) = onboard_cleaner(&state, &admin_token, "maria").await;

    let mut body = booking_body(&profile_id, "09:00");
    body["guest"] = json!({"email": "Elena@Example.ro", "first_name": "Elena", "last_name": "Pop"});
    let (status, created) = send(&state, "POST", "/api/bookings", None, Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let booking = &created["booking"];
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["service_price"], 15000);
    assert_eq!(booking["travel_fee"], 1000);
    assert_eq!(booking["platform_fee"], 2400);
    assert_eq!(booking["total_price"], 18400);
    assert_eq!(booking["cleaner_payout"], 13600);
    assert_eq!(booking["duration_minutes"], 180);

    let id = booking["id"].as_str().unwrap().to_string();
    let guest_token = created["session_token"].as_str().unwrap().to_string();

    let (_, mine) = send(&state, "GET", "/api/bookings/mine", Some(&guest_token), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // only the assigned cleaner moves the booking forward
    let (status, _) = send(&state, "POST", &format!("/api/bookings/{id}/confirm"), Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&state, "POST", &format!("/api/bookings/{id}/start"), Some(&cleaner_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    for step in ["confirm", "start"] {
        let (status, _) = send(&state, "POST", &format!("/api/bookings/{id}/{step}"), Some(&cleaner_token), None).await;
        assert_eq!(status, StatusCode::OK, "{step}");
    }
    let (status, done) = send(
        &state,
        "POST",
        &format!("/api/bookings/{id}/complete"),
        Some(&cleaner_token),
        Some(json!({"notes": "Spare key left with the concierge"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");
    assert!(done["completed_at"].is_string());

    let (status, _) = send(
        &state,
        "POST",
        &format!("/api/bookings/{id}/cancel"),
        Some(&guest_token),
        Some(json!({"reason": "changed my mind"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &state,
        "POST",
        "/api/reviews",
        Some(&guest_token),
        Some(json!({"booking_id": id, "rating": 5, "comment": "Excelent"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, profile) = send(&state, "GET", "/api/cleaner/profile", Some(&cleaner_token), None).await;
    assert_eq!(profile["completed_bookings"], 1);
    assert_eq!(profile["total_reviews"], 1);

    let kinds = kinds(&sent);
    assert!(kinds.contains(&"booking_created"));
    assert_eq!(kinds.iter().filter(|k| **k == "booking_status_changed").count(), 3);
}

#[tokio::test]
async fn test_guest_email_collision_requires_sign_in() {
    let (state, _) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, _, profile_id) = onboard_cleaner(&state, &admin_token, "maria").await;
    seed_user(&state, "elena", Role::Client);

    let mut body = booking_body(&profile_id, "09:00");
    body["guest"] = json!({"email": "ELENA@example.ro", "first_name": "Elena", "last_name": "Pop"});
    let (status, _) = send(&state, "POST", "/api/bookings", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&state, "POST", "/api/bookings", None, Some(booking_body(&profile_id, "09:00"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_overlapping_slot_and_bad_time_rejected() {
    let (state, _) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, cleaner_token, profile_id) = onboard_cleaner(&state, &admin_token, "maria").await;
    let (_, client_token) = seed_user(&state, "ana", Role::Client);

    let (status, created) = send(&state, "POST", "/api/bookings", Some(&client_token), Some(booking_body(&profile_id, "09:00"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("session_token").is_none());
    let id = created["booking"]["id"].as_str().unwrap();
    send(&state, "POST", &format!("/api/bookings/{id}/confirm"), Some(&cleaner_token), None).await;

    let (status, _) = send(&state, "POST", "/api/bookings", Some(&client_token), Some(booking_body(&profile_id, "11:00"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // back to back is fine
    let (status, _) = send(&state, "POST", "/api/bookings", Some(&client_token), Some(booking_body(&profile_id, "12:00"))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&state, "POST", "/api/bookings", Some(&client_token), Some(booking_body(&profile_id, "25:00"))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, available) = send(
        &state,
        "GET",
        "/api/cleaners/available?date=2030-06-17&start=10:00&end=11:00",
        None,
        None,
    )
    .await;
    assert_eq!(available.as_array().unwrap().len(), 0);

    let (_, available) = send(
        &state,
        "GET",
        "/api/cleaners/available?date=2030-06-18&start=10:00&end=11:00",
        None,
        None,
    )
    .await;
    assert_eq!(available[0]["id"], profile_id.as_str());
}

#[tokio::test]
async fn test_quote_and_area_search() {
    let (state, _) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, _, profile_id) = onboard_cleaner(&state, &admin_token, "maria").await;

    let (status, quote) = send(
        &state,
        "POST",
        "/api/pricing/quote",
        None,
        Some(json!({
            "cleaner_profile_id": profile_id,
            "service_type": "standard_cleaning",
            "add_ons": ["inside_oven", "inside_oven"],
            "city": "cluj-napoca"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["add_ons_price"], 5000);
    assert_eq!(quote["subtotal"], 21000);
    assert_eq!(quote["estimated_hours"], 3.5);

    let (_, found) = send(&state, "GET", "/api/cleaners/area?city=Cluj-Napoca", None, None).await;
    assert_eq!(found.as_array().unwrap().len(), 1);

    let (_, found) = send(&state, "GET", "/api/cleaners/area?city=Iasi", None, None).await;
    assert_eq!(found.as_array().unwrap().len(), 0);
}

// ── Company invites ──

#[tokio::test]
async fn test_invite_flow_and_double_acceptance() {
    let (state, sent) = test_state();
    let (_, admin_token) = seed_user(&state, "admin", Role::GlobalAdmin);
    let (_, owner_token) = seed_user(&state, "owner", Role::Client);

    let (_, application) = send(
        &state,
        "POST",
        "/api/applications",
        Some(&owner_token),
        Some(json!({
            "application_type": "company_admin",
            "company": {"name": "Sclipici SRL", "company_type": "business"}
        })),
    )
    .await;
    let id = application["id"].as_str().unwrap();
    send(&state, "POST", &format!("/api/admin/applications/{id}/approve"), Some(&admin_token), None).await;

    let (status, created) = send(
        &state,
        "POST",
        "/api/company/invites",
        Some(&owner_token),
        Some(json!({"expires_in_days": 90})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let token = created["invite"]["token"].as_str().unwrap().to_string();
    assert_eq!(created["link"], format!("https://app.test/join/{token}"));

    let (_, check) = send(&state, "GET", &format!("/api/invites/validate/{token}"), None, None).await;
    assert_eq!(check["valid"], true);
    assert_eq!(check["company_name"], "Sclipici SRL");

    let (_, first_token) = seed_user(&state, "dana", Role::Client);
    let (_, second_token) = seed_user(&state, "radu", Role::Client);

    let (status, accepted) = send(&state, "POST", "/api/invites/accept", Some(&first_token), Some(json!({"token": token}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["company"]["total_cleaners"], 1);
    assert_eq!(accepted["profile"]["company_id"], accepted["company"]["id"]);

    let (status, _) = send(&state, "POST", "/api/invites/accept", Some(&second_token), Some(json!({"token": token}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, me) = send(&state, "GET", "/api/me", Some(&second_token), None).await;
    assert_eq!(me["role"], "client");

    let (_, cleaners) = send(&state, "GET", "/api/company/cleaners", Some(&owner_token), None).await;
    assert_eq!(cleaners.as_array().unwrap().len(), 1);

    let (_, check) = send(&state, "GET", &format!("/api/invites/validate/{token}"), None, None).await;
    assert_eq!(check["valid"], false);
    assert_eq!(check["status"], "accepted");

    let kinds = kinds(&sent);
    assert!(kinds.contains(&"invite_created"));
    assert!(kinds.contains(&"invite_accepted"));
}

#[tokio::test]
async fn test_company_routes_need_company_admin() {
    let (state, _) = test_state();
    let (_, token) = seed_user(&state, "ana", Role::Client);

    let (status, _) = send(&state, "POST", "/api/company/invites", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, check) = send(&state, "GET", "/api/invites/validate/unknown", None, None).await;
    assert_eq!(check["valid"], false);
}

// ── Account ──

#[tokio::test]
async fn test_address_book() {
    let (state, _) = test_state();
    let (_, token) = seed_user(&state, "ana", Role::Client);

    let (status, home) = send(
        &state,
        "POST",
        "/api/me/addresses",
        Some(&token),
        Some(json!({"street": "Str. Fabricii 3", "city": "Cluj-Napoca"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(home["is_default"], true);

    let (_, office) = send(
        &state,
        "POST",
        "/api/me/addresses",
        Some(&token),
        Some(json!({"street": "Bd. Eroilor 5", "city": "Cluj-Napoca"})),
    )
    .await;
    let office_id = office["id"].as_str().unwrap();

    let (status, list) = send(&state, "POST", &format!("/api/me/addresses/{office_id}/default"), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["id"], office_id);
    assert_eq!(list[0]["is_default"], true);
    assert_eq!(list[1]["is_default"], false);
}

#[tokio::test]
async fn test_catalog_is_public() {
    let (state, _) = test_state();
    let (status, catalog) = send(&state, "GET", "/api/services", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog["services"].as_array().unwrap().len(), 6);
    assert_eq!(catalog["add_ons"].as_array().unwrap().len(), 7);
}
