use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CredentialStore, ExamStore};
use crate::err::Error;
use crate::models::{ExamRecord, Role, StudentAccount};

/// Process-local backend used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    students: RwLock<BTreeMap<String, StudentAccount>>,
    exams: RwLock<Vec<ExamRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_student(
        &self,
        enrollment_number: &str,
    ) -> Result<Option<StudentAccount>, Error> {
        Ok(self.students.read().await.get(enrollment_number).cloned())
    }

    async fn insert_student(&self, account: &StudentAccount) -> Result<bool, Error> {
        let mut students = self.students.write().await;
        if students.contains_key(&account.enrollment_number) {
            return Ok(false);
        }
        students.insert(account.enrollment_number.clone(), account.clone());
        Ok(true)
    }

    async fn list_students(&self, limit: i64) -> Result<Vec<StudentAccount>, Error> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .students
            .read()
            .await
            .values()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_student(&self, enrollment_number: &str) -> Result<u64, Error> {
        let removed = self.students.write().await.remove(enrollment_number);
        Ok(removed.map_or(0, |_| 1))
    }

    async fn count_with_role(&self, role: Role) -> Result<i64, Error> {
        let count = self
            .students
            .read()
            .await
            .values()
            .filter(|student| student.role == role)
            .count();
        Ok(count as i64)
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn insert_exam(&self, exam: &ExamRecord) -> Result<(), Error> {
        self.exams.write().await.push(exam.clone());
        Ok(())
    }

    async fn exams_for(
        &self,
        enrollment_number: &str,
        limit: i64,
    ) -> Result<Vec<ExamRecord>, Error> {
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .exams
            .read()
            .await
            .iter()
            .filter(|exam| exam.enrollment_number == enrollment_number)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_exams_for(&self, enrollment_number: &str) -> Result<u64, Error> {
        let mut exams = self.exams.write().await;
        let before = exams.len();
        exams.retain(|exam| exam.enrollment_number != enrollment_number);
        Ok((before - exams.len()) as u64)
    }
}
