use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cleanmarket::config::AppConfig;
use cleanmarket::db;
use cleanmarket::handlers;
use cleanmarket::services::notify::sidemail::SidemailNotifier;
use cleanmarket::services::notify::slack::SlackNotifier;
use cleanmarket::services::notify::Notifier;
use cleanmarket::state::AppState;

fn build_notifiers(config: &AppConfig) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    if let Some(url) = &config.slack_webhook_url {
        tracing::info!("slack notifications enabled");
        notifiers.push(Box::new(SlackNotifier::new(url.clone())));
    }
    if let Some(key) = &config.sidemail_api_key {
        tracing::info!("sidemail notifications enabled (from: {})", config.mail_from);
        notifiers.push(Box::new(SidemailNotifier::new(
            key.clone(),
            config.mail_from.clone(),
            config.app_base_url.clone(),
        )));
    }
    if notifiers.is_empty() {
        tracing::info!("no notifiers configured; events are only logged");
    }
    notifiers
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.token_secret == "changeme" {
        tracing::warn!("TOKEN_SECRET is not set; using the development default");
    }

    let conn = db::init_db(&config.database_url)?;
    let notifiers = build_notifiers(&config);
    let addr = format!("0.0.0.0:{}", config.port);

    let state = Arc::new(AppState::new(conn, config, notifiers));
    let app = handlers::router(state);

    tracing::info!("starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
