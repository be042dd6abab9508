use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("invalid adjustment import: {0}")]
    InvalidImportFormat(String),

    #[error("unknown teacher {0}")]
    UnknownTeacher(String),

    #[error("{0} is not a school day")]
    NotASchoolDay(NaiveDate),

    #[error("teacher {teacher_id} has no vacant lesson at period index {period_index}")]
    UnknownGroup {
        teacher_id: String,
        period_index: usize,
    },

    #[error(
        "teacher {teacher_id} has several lessons at period index {period_index}, name a class"
    )]
    AmbiguousGroup {
        teacher_id: String,
        period_index: usize,
    },

    #[error("teacher {0} is not marked absent")]
    NotAbsent(String),

    #[error("no substitute plan found: {0}")]
    Solver(String),

    #[error("failed to encode adjustments: {0}")]
    Serialization(String),

    #[error("failed to read school data: {0}")]
    SchoolFile(String),

    #[error("desk state is unavailable")]
    Poisoned,
}
