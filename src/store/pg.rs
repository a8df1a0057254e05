use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};

use super::{CredentialStore, ExamStore};
use crate::config::Config;
use crate::err::Error;
use crate::models::{ExamRecord, Role, StudentAccount};

// `seq` is filled by the database and orders a student's exams by insertion.
const INSERT_EXAM: &str = "INSERT INTO exams \
     (id, enrollment_number, exam_name, room_number, bench_number, block, exam_date, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

const EXAMS_FOR: &str = "SELECT id, enrollment_number, exam_name, room_number, bench_number, \
     block, exam_date, created_at FROM exams WHERE enrollment_number = $1 \
     ORDER BY seq LIMIT $2";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &Config) -> anyhow::Result<Self> {
        let mut options = PgConnectOptions::from_str(url)?;
        if let Some(name) = &config.database_name {
            options = options.database(name);
        }
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("Connected to PostgreSQL, schema is up to date");
        Ok(Self { pool })
    }
}

impl<'r> FromRow<'r, PgRow> for StudentAccount {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            enrollment_number: row.try_get("enrollment_number")?,
            name: row.try_get("name")?,
            branch: row.try_get("branch")?,
            password_hash: row.try_get("password_hash")?,
            role: Role::from_str(&role).map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_student(
        &self,
        enrollment_number: &str,
    ) -> Result<Option<StudentAccount>, Error> {
        let student = sqlx::query_as::<_, StudentAccount>(
            "SELECT * FROM students WHERE enrollment_number = $1 LIMIT 1",
        )
        .bind(enrollment_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(student)
    }

    async fn insert_student(&self, account: &StudentAccount) -> Result<bool, Error> {
        let res = sqlx::query(
            "INSERT INTO students VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (enrollment_number) DO NOTHING",
        )
        .bind(&account.enrollment_number)
        .bind(&account.name)
        .bind(&account.branch)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() >= 1)
    }

    async fn list_students(&self, limit: i64) -> Result<Vec<StudentAccount>, Error> {
        let students = sqlx::query_as::<_, StudentAccount>(
            "SELECT * FROM students ORDER BY enrollment_number LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(students)
    }

    async fn delete_student(&self, enrollment_number: &str) -> Result<u64, Error> {
        let res = sqlx::query("DELETE FROM students WHERE enrollment_number = $1")
            .bind(enrollment_number)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn count_with_role(&self, role: Role) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl ExamStore for PgStore {
    async fn insert_exam(&self, exam: &ExamRecord) -> Result<(), Error> {
        sqlx::query(INSERT_EXAM)
            .bind(exam.id)
            .bind(&exam.enrollment_number)
            .bind(&exam.exam_name)
            .bind(&exam.room_number)
            .bind(&exam.bench_number)
            .bind(&exam.block)
            .bind(&exam.exam_date)
            .bind(exam.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn exams_for(
        &self,
        enrollment_number: &str,
        limit: i64,
    ) -> Result<Vec<ExamRecord>, Error> {
        let exams = sqlx::query_as::<_, ExamRecord>(EXAMS_FOR)
            .bind(enrollment_number)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(exams)
    }

    async fn delete_exams_for(&self, enrollment_number: &str) -> Result<u64, Error> {
        let res = sqlx::query("DELETE FROM exams WHERE enrollment_number = $1")
            .bind(enrollment_number)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}
