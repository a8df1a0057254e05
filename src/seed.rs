use crate::err::Error;
use crate::models::{ExamRecord, Role, StudentAccount};
use crate::state::AppState;

pub const ADMIN_ENROLLMENT: &str = "ADMIN001";
pub const SAMPLE_PASSWORD: &str = "pass123";

const SAMPLE_STUDENTS: [(&str, &str, &str); 5] = [
    ("CSE2021001", "Rahul Sharma", "Computer Science"),
    ("CSE2021002", "Priya Patel", "Computer Science"),
    ("ECE2021001", "Amit Kumar", "Electronics"),
    ("ME2021001", "Sneha Gupta", "Mechanical"),
    ("EE2021001", "Vikram Singh", "Electrical"),
];

const SAMPLE_EXAMS: [[&str; 6]; 6] = [
    ["CSE2021001", "Data Structures Mid-Sem", "301", "15", "A Block", "2026-02-15"],
    ["CSE2021001", "Database Management Mid-Sem", "305", "22", "A Block", "2026-02-18"],
    ["CSE2021002", "Data Structures Mid-Sem", "301", "16", "A Block", "2026-02-15"],
    ["ECE2021001", "Signal Processing Mid-Sem", "202", "08", "B Block", "2026-02-16"],
    ["ME2021001", "Thermodynamics Mid-Sem", "401", "12", "C Block", "2026-02-17"],
    ["EE2021001", "Power Systems Mid-Sem", "203", "19", "B Block", "2026-02-19"],
];

/// Creates the administrator when none exists, and sample students with
/// exams when there are no students yet.
pub async fn seed_database(state: &AppState) -> Result<(), Error> {
    if state.students.count_with_role(Role::Admin).await? == 0 {
        let admin = StudentAccount::new(
            ADMIN_ENROLLMENT,
            "Admin User",
            "Administration",
            state.hasher.hash(&state.config.seed_admin_password).await?,
            Role::Admin,
        );
        state.students.insert_student(&admin).await?;
        log::info!("Admin user created: {}", ADMIN_ENROLLMENT);
    }

    if state.students.count_with_role(Role::Student).await? > 0 {
        return Ok(());
    }

    let mut inserted = 0;
    for (enrollment_number, name, branch) in SAMPLE_STUDENTS {
        let student = StudentAccount::new(
            enrollment_number,
            name,
            branch,
            state.hasher.hash(SAMPLE_PASSWORD).await?,
            Role::Student,
        );
        if state.students.insert_student(&student).await? {
            inserted += 1;
        }
    }
    log::info!("Inserted {} sample students", inserted);

    for [enrollment_number, exam_name, room, bench, block, date] in SAMPLE_EXAMS {
        let exam = ExamRecord::new(enrollment_number, exam_name, room, bench, block, date);
        state.exams.insert_exam(&exam).await?;
    }
    log::info!("Inserted {} sample exam records", SAMPLE_EXAMS.len());
    Ok(())
}
