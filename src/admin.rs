use axum::extract::{Multipart, Path};
use axum::Extension;
use serde::Serialize;

use crate::auth::{require_admin, Authenticated, Message};
use crate::config::STUDENT_LIST_LIMIT;
use crate::err::Error;
use crate::import::{import_spreadsheet, ImportSummary};
use crate::models::StudentProfile;
use crate::session::Identity;
use crate::state::AppState;
use crate::{proceeds, Payload};

pub const UPLOAD_FIELD: &str = "file";

pub async fn list_students(
    state: &AppState,
    identity: &Identity,
) -> Result<Vec<StudentProfile>, Error> {
    require_admin(identity)?;
    let students = state.students.list_students(STUDENT_LIST_LIMIT).await?;
    Ok(students.iter().map(|student| student.profile()).collect())
}

/// Removes the account, then its exam records. Unknown numbers are not an error.
pub async fn delete_student(
    state: &AppState,
    identity: &Identity,
    enrollment_number: &str,
) -> Result<(), Error> {
    require_admin(identity)?;
    let accounts = state.students.delete_student(enrollment_number).await?;
    let exams = state.exams.delete_exams_for(enrollment_number).await?;
    log::info!(
        "`{}` deleted `{}` ({} account, {} exams)",
        identity.enrollment_number,
        enrollment_number,
        accounts,
        exams
    );
    Ok(())
}

pub async fn upload_handler(
    Extension(state): Extension<AppState>,
    Authenticated(identity): Authenticated,
    mut multipart: Multipart,
) -> Payload<ImportSummary> {
    // role first: non-admins get 403 whatever the body holds
    require_admin(&identity)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        let summary = import_spreadsheet(&state, &identity, &bytes, &filename).await?;
        return proceeds(summary);
    }
    Err(Error::invalid(format!(
        "Missing multipart field `{}`",
        UPLOAD_FIELD
    )))
}

pub async fn students_handler(
    Extension(state): Extension<AppState>,
    Authenticated(identity): Authenticated,
) -> Payload<StudentList> {
    let students = list_students(&state, &identity).await?;
    proceeds(StudentList { students })
}

pub async fn delete_student_handler(
    Extension(state): Extension<AppState>,
    Authenticated(identity): Authenticated,
    Path(enrollment_number): Path<String>,
) -> Payload<Message> {
    delete_student(&state, &identity, &enrollment_number).await?;
    proceeds(Message::new("Student deleted successfully"))
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentList {
    pub students: Vec<StudentProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dashboard::get_dashboard;
    use crate::models::{ExamRecord, Role, StudentAccount};

    fn identity(role: Role) -> Identity {
        Identity {
            enrollment_number: "ADMIN001".into(),
            name: "Admin User".into(),
            branch: "Administration".into(),
            role,
        }
    }

    async fn state() -> AppState {
        let state = AppState::in_memory(Config {
            password_hash_rounds: 1_000,
            ..Config::default()
        })
        .unwrap();
        for number in ["CSE1", "CSE2"] {
            let account = StudentAccount::new(number, "Name", "CS", "secret-hash".into(), Role::Student);
            state.students.insert_student(&account).await.unwrap();
            state.exams.insert_exam(&ExamRecord::new(number, "Exam", "1", "1", "A", "d")).await.unwrap();
            state.exams.insert_exam(&ExamRecord::new(number, "Exam", "2", "2", "A", "d")).await.unwrap();
        }
        state
    }

    #[tokio::test]
    async fn students_only_with_admin_role() {
        let state = state().await;
        let err = list_students(&state, &identity(Role::Student)).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        let students = list_students(&state, &identity(Role::Admin)).await.unwrap();
        assert_eq!(students.len(), 2);
        let json = serde_json::to_string(&students).unwrap();
        assert!(!json.contains("secret-hash"));
    }

    #[tokio::test]
    async fn delete_cascades_to_exams() {
        let state = state().await;
        let stale = state.students.find_student("CSE1").await.unwrap().unwrap().profile();

        delete_student(&state, &identity(Role::Admin), "CSE1").await.unwrap();
        assert!(state.students.find_student("CSE1").await.unwrap().is_none());
        assert!(state.exams.exams_for("CSE1", 100).await.unwrap().is_empty());
        assert_eq!(state.exams.exams_for("CSE2", 100).await.unwrap().len(), 2);

        let err = get_dashboard(&state, &stale).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_gated() {
        let state = state().await;
        delete_student(&state, &identity(Role::Admin), "MISSING").await.unwrap();

        let err = delete_student(&state, &identity(Role::Student), "CSE2").await.unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        assert!(state.students.find_student("CSE2").await.unwrap().is_some());
    }
}
