use crate::{notify::Notifier, session::SessionStore};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};

/// Shared state handed to every handler via `State<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub sessions: SessionStore,
    pub notifier: Arc<dyn Notifier>,
    /// Upper bound on sending the welcome email
    pub mail_timeout: Duration,
}
