use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role `{}`", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Stored credential record. Only [`StudentProfile`] ever leaves the server.
#[derive(Debug, Clone)]
pub struct StudentAccount {
    pub enrollment_number: String,
    pub name: String,
    pub branch: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl StudentAccount {
    pub fn new(
        enrollment_number: impl Into<String>,
        name: impl Into<String>,
        branch: impl Into<String>,
        password_hash: String,
        role: Role,
    ) -> Self {
        Self {
            enrollment_number: enrollment_number.into(),
            name: name.into(),
            branch: branch.into(),
            password_hash,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn profile(&self) -> StudentProfile {
        StudentProfile {
            enrollment_number: self.enrollment_number.clone(),
            name: self.name.clone(),
            branch: self.branch.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub enrollment_number: String,
    pub name: String,
    pub branch: String,
    pub role: Role,
}

impl StudentProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ExamRecord {
    #[serde(skip)]
    pub id: Uuid,
    pub enrollment_number: String,
    pub exam_name: String,
    pub room_number: String,
    pub bench_number: String,
    pub block: String,
    pub exam_date: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

impl ExamRecord {
    pub fn new(
        enrollment_number: impl Into<String>,
        exam_name: impl Into<String>,
        room_number: impl Into<String>,
        bench_number: impl Into<String>,
        block: impl Into<String>,
        exam_date: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            enrollment_number: enrollment_number.into(),
            exam_name: exam_name.into(),
            room_number: room_number.into(),
            bench_number: bench_number.into(),
            block: block.into(),
            exam_date: exam_date.into(),
            created_at: Utc::now(),
        }
    }
}
