//! Classroom aggregate service.
//!
//! # Responsibility
//! - Create classrooms, assigning a join-code when none is supplied.
//! - Resolve classrooms by id or join-code and apply enrollment, attendance
//!   and note mutations through the store's atomic update primitive.
//! - Derive attendance statistics for reporting.
//!
//! # Invariants
//! - `ClassroomNotFound` and `InvalidJoinCode` are the only failures raised
//!   by this layer itself; everything else is a propagated store error.
//! - Enrollment is idempotent by student id; the first submitted student
//!   wins.
//! - Attendance updates replace the list; note updates append.

use crate::model::attendance::{
    daily_attendance, monthly_report, records_for_student, summarize_attendance,
    AttendanceRecord, DailyAttendance, MonthlyStudentReport, StudentAttendanceSummary,
};
use crate::model::classroom::{Classroom, ClassroomId, Note, Student};
use crate::model::join_code::generate_join_code;
use crate::repo::classroom_repo::{ClassroomRepository, RepoError};
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for classroom use-cases.
#[derive(Debug)]
pub enum ClassroomServiceError {
    /// No classroom exists with the given id.
    ClassroomNotFound(ClassroomId),
    /// No classroom carries the given join-code.
    InvalidJoinCode(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ClassroomServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassroomNotFound(id) => write!(f, "classroom not found with id: {id}"),
            Self::InvalidJoinCode(code) => write!(f, "invalid classroom code: {code}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ClassroomServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::ClassroomNotFound(_) | Self::InvalidJoinCode(_) => None,
        }
    }
}

impl From<RepoError> for ClassroomServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ClassroomNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ClassroomServiceResult<T> = Result<T, ClassroomServiceError>;

/// Classroom facade over an injected store.
pub struct ClassroomService<R: ClassroomRepository> {
    repo: R,
}

impl<R: ClassroomRepository> ClassroomService<R> {
    /// Creates a service using the provided store implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every classroom.
    pub fn list_classrooms(&self) -> ClassroomServiceResult<Vec<Classroom>> {
        Ok(self.repo.find_all()?)
    }

    /// Persists a new classroom.
    ///
    /// # Contract
    /// - A blank join-code is replaced by a generated `EDU-XXXXXXXX` code.
    /// - An explicit join-code is stored unchanged.
    /// - Repeated student ids in the submitted list are dropped, first wins.
    /// - Returns the stored value, including an id assigned by the store.
    pub fn create_classroom(
        &mut self,
        mut classroom: Classroom,
    ) -> ClassroomServiceResult<Classroom> {
        let generated_code = !classroom.has_join_code();
        if generated_code {
            classroom.join_code = generate_join_code();
        }

        let dropped = classroom.dedupe_students();
        if dropped > 0 {
            warn!(
                "event=classroom_create module=service status=normalized dropped_duplicate_students={dropped}"
            );
        }

        let stored = self.repo.save(&classroom)?;
        info!(
            "event=classroom_create module=service status=ok classroom_id={} generated_code={generated_code}",
            stored.id
        );
        Ok(stored)
    }

    /// Gets one classroom by id.
    pub fn get_classroom(&self, id: &str) -> ClassroomServiceResult<Classroom> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| ClassroomServiceError::ClassroomNotFound(id.to_string()))
    }

    /// Replaces the full attendance list of a classroom.
    ///
    /// Records are stored as given; they are not checked against enrolled
    /// students and duplicate dates are kept.
    pub fn replace_attendance(
        &mut self,
        id: &str,
        records: Vec<AttendanceRecord>,
    ) -> ClassroomServiceResult<Classroom> {
        let count = records.len();
        let classroom = self.repo.update_classroom(id, |classroom| {
            classroom.replace_attendance(records);
            true
        })?;
        info!(
            "event=attendance_replace module=service status=ok classroom_id={id} records={count}"
        );
        Ok(classroom)
    }

    /// Appends one note to a classroom.
    pub fn add_note(&mut self, id: &str, note: Note) -> ClassroomServiceResult<Classroom> {
        let classroom = self.repo.update_classroom(id, |classroom| {
            classroom.append_note(note);
            true
        })?;
        info!(
            "event=note_add module=service status=ok classroom_id={id} notes={}",
            classroom.notes.len()
        );
        Ok(classroom)
    }

    /// Enrolls a student unless one with the same id is already enrolled.
    ///
    /// # Contract
    /// - Duplicate ids are a no-op: the incoming value is discarded and the
    ///   stored entry is left untouched.
    /// - Check and append run under one store transaction, so concurrent
    ///   calls on the same classroom cannot lose enrollments.
    pub fn add_student(&mut self, id: &str, student: Student) -> ClassroomServiceResult<Classroom> {
        self.enroll(id, student, "student_add")
    }

    /// Self-enrollment: enrolls `student` in the classroom carrying
    /// `join_code`.
    ///
    /// # Contract
    /// - The code must match exactly; blank or unknown codes fail with
    ///   `InvalidJoinCode`.
    /// - When several classrooms share the code, the earliest created wins.
    /// - Joining twice is a no-op, as with `add_student`.
    pub fn enroll_by_code(
        &mut self,
        join_code: &str,
        student: Student,
    ) -> ClassroomServiceResult<Classroom> {
        let target = if join_code.trim().is_empty() {
            None
        } else {
            self.repo.find_by_join_code(join_code)?
        };
        let Some(target) = target else {
            warn!("event=classroom_join module=service status=error reason=invalid_code");
            return Err(ClassroomServiceError::InvalidJoinCode(join_code.to_string()));
        };

        self.enroll(&target.id, student, "classroom_join")
    }

    fn enroll(
        &mut self,
        id: &str,
        student: Student,
        event: &str,
    ) -> ClassroomServiceResult<Classroom> {
        let student_id = student.id.clone();
        let mut enrolled = false;
        let classroom = self.repo.update_classroom(id, |classroom| {
            enrolled = classroom.enroll(student);
            enrolled
        })?;

        if enrolled {
            info!(
                "event={event} module=service status=ok classroom_id={id} student_id={student_id}"
            );
        } else {
            debug!(
                "event={event} module=service status=skipped reason=already_enrolled classroom_id={id} student_id={student_id}"
            );
        }
        Ok(classroom)
    }

    /// Returns presence statistics for every enrolled student.
    pub fn attendance_summary(
        &self,
        id: &str,
    ) -> ClassroomServiceResult<Vec<StudentAttendanceSummary>> {
        let classroom = self.get_classroom(id)?;
        Ok(summarize_attendance(&classroom))
    }

    /// Returns present/absent counts per marked date, ascending by date.
    pub fn daily_attendance(&self, id: &str) -> ClassroomServiceResult<Vec<DailyAttendance>> {
        let classroom = self.get_classroom(id)?;
        Ok(daily_attendance(&classroom))
    }

    /// Returns the report for one calendar month, one line per enrolled
    /// student.
    pub fn monthly_report(
        &self,
        id: &str,
        year: i32,
        month: u32,
    ) -> ClassroomServiceResult<Vec<MonthlyStudentReport>> {
        let classroom = self.get_classroom(id)?;
        Ok(monthly_report(&classroom, year, month))
    }

    /// Returns the attendance records of one student in stored order.
    ///
    /// Unknown student ids yield an empty list.
    pub fn student_attendance(
        &self,
        id: &str,
        student_id: &str,
    ) -> ClassroomServiceResult<Vec<AttendanceRecord>> {
        let classroom = self.get_classroom(id)?;
        Ok(records_for_student(&classroom, student_id).cloned().collect())
    }
}
