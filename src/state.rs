use std::sync::Arc;

use crate::config::Config;
use crate::err::Error;
use crate::password::CredentialHasher;
use crate::session::{MemorySessionStore, SessionStore};
use crate::store::{CredentialStore, ExamStore, MemoryStore, PgStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub students: Arc<dyn CredentialStore>,
    pub exams: Arc<dyn ExamStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub hasher: Arc<CredentialHasher>,
}

impl AppState {
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        match config.database_url.clone() {
            Some(url) => {
                let store = Arc::new(PgStore::connect(&url, &config).await?);
                Ok(Self::with_stores(config, store.clone(), store)?)
            }
            None => {
                log::warn!("DATABASE_URL not set, data will not survive a restart");
                Ok(Self::in_memory(config)?)
            }
        }
    }

    pub fn in_memory(config: Config) -> Result<Self, Error> {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(config, store.clone(), store)
    }

    pub fn with_stores(
        config: Config,
        students: Arc<dyn CredentialStore>,
        exams: Arc<dyn ExamStore>,
    ) -> Result<Self, Error> {
        let hasher = CredentialHasher::new(config.password_hash_rounds)?;
        Ok(Self {
            config: Arc::new(config),
            students,
            exams,
            sessions: Arc::new(MemorySessionStore::new()),
            hasher: Arc::new(hasher),
        })
    }
}
