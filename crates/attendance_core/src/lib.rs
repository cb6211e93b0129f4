//! Core domain logic for classroom attendance tracking.
//! This crate is the single source of truth for classroom invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attendance::{
    AttendanceRecord, AttendanceStatus, DailyAttendance, MonthlyStudentReport,
    StudentAttendanceSummary,
};
pub use model::classroom::{Classroom, ClassroomId, Note, Student};
pub use model::join_code::{generate_join_code, is_generated_join_code};
pub use repo::classroom_repo::{
    ClassroomRepository, RepoError, RepoResult, SqliteClassroomRepository,
};
pub use service::classroom_service::{
    ClassroomService, ClassroomServiceError, ClassroomServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
