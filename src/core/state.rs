use std::collections::HashMap;
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::core::config::Settings;
use crate::services::attempt::AttemptSession;

/// Live attempts keyed by student id. One student, one attempt.
pub(crate) type AttemptRegistry = Mutex<HashMap<String, AttemptSession>>;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    attempts: AttemptRegistry,
}

impl AppState {
    pub fn new(settings: Settings, db: PgPool) -> Self {
        Self {
            inner: Arc::new(InnerState {
                settings,
                db,
                attempts: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn attempts(&self) -> &AttemptRegistry {
        &self.inner.attempts
    }
}
