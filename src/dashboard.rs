use axum::{Extension, Json};
use serde::Serialize;

use crate::auth::Authenticated;
use crate::config::DASHBOARD_EXAM_LIMIT;
use crate::err::Error;
use crate::models::{ExamRecord, StudentProfile};
use crate::session::Identity;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub student: StudentProfile,
    pub exams: Vec<ExamRecord>,
}

/// Reads the profile fresh from the store. A deleted account yields
/// `NotFound` even while its session is still live.
pub async fn get_dashboard(state: &AppState, identity: &Identity) -> Result<Dashboard, Error> {
    let student = state
        .students
        .find_student(&identity.enrollment_number)
        .await?
        .ok_or_else(|| Error::not_found("Student not found"))?;
    let exams = state
        .exams
        .exams_for(&student.enrollment_number, DASHBOARD_EXAM_LIMIT)
        .await?;
    Ok(Dashboard {
        student: student.profile(),
        exams,
    })
}

pub async fn dashboard_handler(
    Extension(state): Extension<AppState>,
    Authenticated(identity): Authenticated,
) -> Result<Json<Dashboard>, Error> {
    get_dashboard(&state, &identity).await.map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Role, StudentAccount};

    async fn state() -> AppState {
        let state = AppState::in_memory(Config {
            password_hash_rounds: 1_000,
            ..Config::default()
        })
        .unwrap();
        let account = StudentAccount::new("ECE1", "Amit Kumar", "Electronics", "h".into(), Role::Student);
        state.students.insert_student(&account).await.unwrap();
        state
    }

    #[tokio::test]
    async fn shows_only_the_students_exams() {
        let state = state().await;
        state.exams.insert_exam(&ExamRecord::new("ECE1", "Signals", "202", "08", "B Block", "2026-02-16")).await.unwrap();
        state.exams.insert_exam(&ExamRecord::new("ME1", "Thermo", "401", "12", "C Block", "2026-02-17")).await.unwrap();

        let identity = state.students.find_student("ECE1").await.unwrap().unwrap().profile();
        let dashboard = get_dashboard(&state, &identity).await.unwrap();
        assert_eq!(dashboard.student, identity);
        assert_eq!(dashboard.exams.len(), 1);
        assert_eq!(dashboard.exams[0].exam_name, "Signals");
    }

    #[tokio::test]
    async fn exams_are_capped() {
        let state = state().await;
        for i in 0..(DASHBOARD_EXAM_LIMIT + 5) {
            let exam = ExamRecord::new("ECE1", format!("Exam {}", i), "1", "1", "A", "d");
            state.exams.insert_exam(&exam).await.unwrap();
        }
        let identity = state.students.find_student("ECE1").await.unwrap().unwrap().profile();
        let dashboard = get_dashboard(&state, &identity).await.unwrap();
        assert_eq!(dashboard.exams.len() as i64, DASHBOARD_EXAM_LIMIT);
    }

    #[tokio::test]
    async fn deleted_account_is_not_found() {
        let state = state().await;
        let identity = state.students.find_student("ECE1").await.unwrap().unwrap().profile();
        state.students.delete_student("ECE1").await.unwrap();
        let err = get_dashboard(&state, &identity).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "wrong error: {:?}", err);
    }
}
