use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use crate::err::Error;
use crate::models::StudentProfile;

/// Identity captured at login. Not refreshed until the next login.
pub type Identity = StudentProfile;

#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            created_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.created_at
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, token: &str, session: Session) -> Result<(), Error>;

    async fn get(&self, token: &str) -> Result<Option<Session>, Error>;

    /// Removes the session and hands it back, if there was one.
    async fn delete(&self, token: &str) -> Result<Option<Session>, Error>;
}

/// Sessions live only as long as the process. There is no expiry sweep.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, token: &str, session: Session) -> Result<(), Error> {
        self.sessions
            .write()
            .await
            .insert(token.to_string(), session);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, Error> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<Option<Session>, Error> {
        Ok(self.sessions.write().await.remove(token))
    }
}

/// 32 random bytes, digested and hex encoded.
pub fn mint_token() -> String {
    let token_bytes: [u8; 32] = thread_rng().gen();

    let mut hasher: Sha256 = Digest::new();
    hasher.update(token_bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn identity() -> Identity {
        StudentProfile {
            enrollment_number: "CSE2021001".into(),
            name: "Rahul Sharma".into(),
            branch: "Computer Science".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn tokens_are_long_and_distinct() {
        let first = mint_token();
        let second = mint_token();
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn create_get_delete() {
        let store = MemorySessionStore::new();
        store.create("t1", Session::new(identity())).await.unwrap();

        let session = store.get("t1").await.unwrap().unwrap();
        assert_eq!(session.identity, identity());
        assert!(store.get("t2").await.unwrap().is_none());

        let removed = store.delete("t1").await.unwrap().unwrap();
        assert_eq!(removed.identity, identity());
        assert!(removed.created_at <= Utc::now());
        assert!(store.delete("t1").await.unwrap().is_none());
        assert!(store.get("t1").await.unwrap().is_none());
    }

    #[test]
    fn age_counts_from_creation() {
        let mut session = Session::new(identity());
        assert!(session.age() >= Duration::zero());
        session.created_at = Utc::now() - Duration::minutes(90);
        assert!(session.age().num_minutes() >= 90);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let store = MemorySessionStore::new();
        store.create("a", Session::new(identity())).await.unwrap();
        store.create("b", Session::new(identity())).await.unwrap();
        store.delete("a").await.unwrap();
        assert!(store.get("b").await.unwrap().is_some());
    }
}
