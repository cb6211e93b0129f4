//! Classroom aggregate root and embedded values.
//!
//! # Responsibility
//! - Define `Classroom`, `Student` and `Note` with their external JSON shape.
//! - Provide in-memory mutation helpers used by the classroom service.
//!
//! # Invariants
//! - `enroll` never creates a duplicate student id and never overwrites an
//!   already enrolled student.
//! - `replace_attendance` discards every previous record.
//! - `append_note` only appends; existing notes are never touched.

use crate::model::attendance::AttendanceRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier of a classroom. Either supplied by the caller or assigned by
/// the store on first save.
pub type ClassroomId = String;

/// Aggregate root holding students, attendance and notes.
///
/// Unknown or missing fields fall back to defaults on deserialization; the
/// core accepts payloads without schema checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Classroom {
    /// Blank until assigned.
    pub id: ClassroomId,
    pub name: String,
    pub subject: String,
    /// Identifier of the owning teacher.
    pub teacher_id: String,
    /// Short shareable code. Serialized as `qrCode` to match the client shape.
    #[serde(rename = "qrCode")]
    pub join_code: String,
    /// Enrolled students in enrollment order.
    pub students: Vec<Student>,
    pub attendance: Vec<AttendanceRecord>,
    /// Notes in upload order.
    pub notes: Vec<Note>,
}

/// Student embedded in a classroom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Avatar URL or asset reference.
    pub avatar: String,
    pub join_date: String,
    pub bio: Option<String>,
}

/// Note attached to a classroom.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub upload_date: String,
    pub author: String,
}

impl Classroom {
    /// Creates an unsaved classroom with empty sub-lists and no join-code.
    pub fn new(
        name: impl Into<String>,
        subject: impl Into<String>,
        teacher_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            teacher_id: teacher_id.into(),
            ..Self::default()
        }
    }

    /// Returns whether a non-blank join-code is present.
    pub fn has_join_code(&self) -> bool {
        !self.join_code.trim().is_empty()
    }

    /// Returns whether a student with `student_id` is enrolled.
    pub fn is_enrolled(&self, student_id: &str) -> bool {
        self.students.iter().any(|student| student.id == student_id)
    }

    /// Appends `student` unless the id is already enrolled.
    ///
    /// Returns `true` when the list changed. On a duplicate id the incoming
    /// value is dropped as-is; the existing entry is not merged or updated.
    pub fn enroll(&mut self, student: Student) -> bool {
        if self.is_enrolled(&student.id) {
            return false;
        }
        self.students.push(student);
        true
    }

    /// Replaces the whole attendance list.
    ///
    /// No check is made that records reference enrolled students.
    pub fn replace_attendance(&mut self, records: Vec<AttendanceRecord>) {
        self.attendance = records;
    }

    /// Appends `note` after all existing notes.
    pub fn append_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Drops later entries that repeat an earlier student id.
    ///
    /// Returns the number of dropped entries.
    pub fn dedupe_students(&mut self) -> usize {
        let before = self.students.len();
        let mut seen = HashSet::with_capacity(before);
        self.students.retain(|student| seen.insert(student.id.clone()));
        before - self.students.len()
    }
}

impl Student {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }
}
