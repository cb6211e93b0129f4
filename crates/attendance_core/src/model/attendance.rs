//! Attendance records and the statistics derived from them.
//!
//! # Invariants
//! - Per-student statistics cover enrolled students only, in enrollment
//!   order. Records referencing students that are not enrolled are ignored
//!   there but stay stored unchanged.
//! - Per-date statistics count every stored record.

use crate::model::classroom::Classroom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Attendance state of one student on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// One attendance mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default)]
    pub student_id: String,
    /// Free-form date string, typically `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn new(
        student_id: impl Into<String>,
        date: impl Into<String>,
        status: AttendanceStatus,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            date: date.into(),
            status,
        }
    }
}

/// Presence statistics for one enrolled student.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAttendanceSummary {
    pub student_id: String,
    pub student_name: String,
    pub present: u32,
    pub absent: u32,
    /// `present / (present + absent) * 100`, or `0.0` without records.
    pub presence_rate_percent: f64,
}

impl StudentAttendanceSummary {
    /// Total number of records counted for this student.
    pub fn total(&self) -> u32 {
        self.present + self.absent
    }
}

/// Present and absent counts recorded on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub date: String,
    pub present: u32,
    pub absent: u32,
}

/// One enrolled student's line in a monthly report.
///
/// Every distinct date marked in the month counts as one session; sessions
/// without a `present` mark count as absences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyStudentReport {
    pub student_id: String,
    pub student_name: String,
    pub sessions: u32,
    pub present: u32,
    pub absent: u32,
    pub presence_rate_percent: f64,
}

/// Builds one summary per enrolled student.
pub fn summarize_attendance(classroom: &Classroom) -> Vec<StudentAttendanceSummary> {
    classroom
        .students
        .iter()
        .map(|student| {
            let (present, absent) = classroom
                .attendance
                .iter()
                .filter(|record| record.student_id == student.id)
                .fold((0u32, 0u32), |(present, absent), record| match record.status {
                    AttendanceStatus::Present => (present + 1, absent),
                    AttendanceStatus::Absent => (present, absent + 1),
                });
            StudentAttendanceSummary {
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                present,
                absent,
                presence_rate_percent: presence_rate(present, absent),
            }
        })
        .collect()
}

/// Returns the records of one student in stored order.
pub fn records_for_student<'a>(
    classroom: &'a Classroom,
    student_id: &'a str,
) -> impl Iterator<Item = &'a AttendanceRecord> + 'a {
    classroom
        .attendance
        .iter()
        .filter(move |record| record.student_id == student_id)
}

/// Groups every record by date, ascending by date string.
pub fn daily_attendance(classroom: &Classroom) -> Vec<DailyAttendance> {
    let mut by_date: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for record in &classroom.attendance {
        let counts = by_date.entry(record.date.as_str()).or_default();
        match record.status {
            AttendanceStatus::Present => counts.0 += 1,
            AttendanceStatus::Absent => counts.1 += 1,
        }
    }

    by_date
        .into_iter()
        .map(|(date, (present, absent))| DailyAttendance {
            date: date.to_string(),
            present,
            absent,
        })
        .collect()
}

/// Builds the report for `year`/`month` (1-12), one line per enrolled
/// student.
///
/// Only records whose date starts with `YYYY-MM` matching the requested
/// month are considered; other date shapes are skipped.
pub fn monthly_report(classroom: &Classroom, year: i32, month: u32) -> Vec<MonthlyStudentReport> {
    let in_month: Vec<&AttendanceRecord> = classroom
        .attendance
        .iter()
        .filter(|record| year_month(&record.date) == Some((year, month)))
        .collect();
    let sessions = in_month
        .iter()
        .map(|record| record.date.as_str())
        .collect::<BTreeSet<_>>()
        .len() as u32;

    classroom
        .students
        .iter()
        .map(|student| {
            let present = in_month
                .iter()
                .filter(|record| {
                    record.student_id == student.id && record.status == AttendanceStatus::Present
                })
                .count() as u32;
            MonthlyStudentReport {
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                sessions,
                present,
                absent: sessions.saturating_sub(present),
                presence_rate_percent: if sessions == 0 {
                    0.0
                } else {
                    f64::from(present) / f64::from(sessions) * 100.0
                },
            }
        })
        .collect()
}

fn year_month(date: &str) -> Option<(i32, u32)> {
    let mut parts = date.split('-');
    let year = parts.next()?.trim().parse().ok()?;
    let month = parts.next()?.trim().parse().ok()?;
    Some((year, month))
}

fn presence_rate(present: u32, absent: u32) -> f64 {
    let total = present + absent;
    if total == 0 {
        return 0.0;
    }
    f64::from(present) / f64::from(total) * 100.0
}
