use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub token_secret: String,
    pub token_ttl_hours: i64,
    pub platform_fee_percentage: f64,
    pub invite_default_days: i64,
    pub invite_max_days: i64,
    pub slack_webhook_url: Option<String>,
    pub sidemail_api_key: Option<String>,
    pub mail_from: String,
    pub app_base_url: String,
    /// Locale every "HH:MM" value is interpreted in. Informational only.
    pub timezone: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "cleanmarket.db".to_string()),
            token_secret: env::var("TOKEN_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(72),
            platform_fee_percentage: env::var("PLATFORM_FEE_PERCENTAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|p: &f64| (0.0..=100.0).contains(p))
                .unwrap_or(15.0),
            invite_default_days: env::var("INVITE_DEFAULT_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            invite_max_days: env::var("INVITE_MAX_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            slack_webhook_url: env::var("SLACK_WEBHOOK_URL").ok().filter(|v| !v.is_empty()),
            sidemail_api_key: env::var("SIDEMAIL_API_KEY").ok().filter(|v| !v.is_empty()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@cleanmarket.ro".to_string()),
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            timezone: env::var("APP_TIMEZONE").unwrap_or_else(|_| "Europe/Bucharest".to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: ":memory:".to_string(),
            token_secret: "changeme".to_string(),
            token_ttl_hours: 72,
            platform_fee_percentage: 15.0,
            invite_default_days: 7,
            invite_max_days: 30,
            slack_webhook_url: None,
            sidemail_api_key: None,
            mail_from: "no-reply@cleanmarket.ro".to_string(),
            app_base_url: "http://localhost:3000".to_string(),
            timezone: "Europe/Bucharest".to_string(),
        }
    }
}
