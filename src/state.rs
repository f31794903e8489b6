use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::services::notify::{self, Notification, Notifier};
use crate::services::tokens::TokenService;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub tokens: TokenService,
    pub notifiers: Vec<Box<dyn Notifier>>,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, notifiers: Vec<Box<dyn Notifier>>) -> Self {
        let tokens = TokenService::new(&config.token_secret, config.token_ttl_hours);
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            tokens,
            notifiers,
        }
    }

    /// Locks the store. The guard must be dropped before any `.await`.
    pub fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }

    pub async fn notify(&self, notification: Notification) {
        notify::dispatch(&self.notifiers, &notification).await;
    }
}
