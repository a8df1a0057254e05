use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand_core::OsRng;
use tokio::task::spawn_blocking;

use crate::err::Error;

/// Salted PBKDF2-SHA256 hashing in PHC string form. The work runs on the
/// blocking pool, never on the async workers.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    // Verified against for unknown accounts so a miss costs as much as a hit.
    dummy_hash: String,
}

impl CredentialHasher {
    pub fn new(rounds: u32) -> Result<Self, Error> {
        let params = Params {
            rounds,
            ..Params::default()
        };
        let dummy_hash = hash_with(&params, "not-a-real-password")?;
        Ok(Self { params, dummy_hash })
    }

    pub async fn hash(&self, password: &str) -> Result<String, Error> {
        let params = self.params.clone();
        let password = password.to_string();
        spawn_blocking(move || hash_with(&params, &password)).await?
    }

    /// Verifies `password` against `hash`, or against the dummy hash when the
    /// account does not exist. Always `false` for a missing account.
    pub async fn verify(&self, password: &str, hash: Option<&str>) -> Result<bool, Error> {
        let known = hash.is_some();
        let hash = hash.unwrap_or(&self.dummy_hash).to_string();
        let password = password.to_string();
        let matches = spawn_blocking(move || verify_with(&password, &hash)).await??;
        Ok(matches && known)
    }
}

fn hash_with(params: &Params, password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Pbkdf2.hash_password_customized(
        password.as_bytes(),
        None,
        None,
        params.clone(),
        &salt,
    )?;
    Ok(hash.to_string())
}

fn verify_with(password: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
}
