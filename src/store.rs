mod memory;
mod pg;

use async_trait::async_trait;

use crate::err::Error;
use crate::models::{ExamRecord, Role, StudentAccount};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Persisted student accounts, keyed by enrollment number.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_student(&self, enrollment_number: &str)
        -> Result<Option<StudentAccount>, Error>;

    /// Returns `false` without touching the stored record when the
    /// enrollment number is already taken.
    async fn insert_student(&self, account: &StudentAccount) -> Result<bool, Error>;

    /// Accounts ordered by enrollment number.
    async fn list_students(&self, limit: i64) -> Result<Vec<StudentAccount>, Error>;

    async fn delete_student(&self, enrollment_number: &str) -> Result<u64, Error>;

    async fn count_with_role(&self, role: Role) -> Result<i64, Error>;
}

/// Append-only exam assignments.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn insert_exam(&self, exam: &ExamRecord) -> Result<(), Error>;

    /// Exams in insertion order.
    async fn exams_for(&self, enrollment_number: &str, limit: i64)
        -> Result<Vec<ExamRecord>, Error>;

    async fn delete_exams_for(&self, enrollment_number: &str) -> Result<u64, Error>;
}
