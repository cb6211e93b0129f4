//! Classroom repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the classroom aggregate as one row plus three ordered child
//!   tables (students, attendance, notes).
//! - Offer an atomic update primitive for load-mutate-save sequences.
//!
//! # Invariants
//! - `save` rewrites all child rows so stored order equals list order.
//! - `update_classroom` holds an immediate (writer) transaction from load
//!   to commit; concurrent updates of one classroom are serialized.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::classroom::{Classroom, ClassroomId, Note, Student};
use rusqlite::{params, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CLASSROOM_SELECT_SQL: &str = "SELECT
    id,
    name,
    subject,
    teacher_id,
    join_code
FROM classrooms";

const REQUIRED_TABLES: [&str; 4] = [
    "classrooms",
    "classroom_students",
    "classroom_attendance",
    "classroom_notes",
];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for classroom persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(ClassroomId),
    InvalidData(String),
    /// Connection was not migrated to the classroom schema.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "classroom not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted classroom data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store interface the classroom service is built on.
pub trait ClassroomRepository {
    /// Returns every classroom in insertion order.
    fn find_all(&self) -> RepoResult<Vec<Classroom>>;
    /// Loads one classroom by identifier.
    fn find_by_id(&self, id: &str) -> RepoResult<Option<Classroom>>;
    /// Loads the classroom carrying `join_code`.
    ///
    /// Codes are not unique; when several classrooms share one, the earliest
    /// inserted wins.
    fn find_by_join_code(&self, join_code: &str) -> RepoResult<Option<Classroom>>;
    /// Inserts or replaces a classroom by identifier and returns the stored
    /// value. A blank identifier is replaced by a fresh UUID.
    fn save(&mut self, classroom: &Classroom) -> RepoResult<Classroom>;
    /// Loads, mutates and writes back one classroom atomically.
    ///
    /// `mutate` returns whether it changed the aggregate; unchanged
    /// aggregates are not rewritten. Fails with `NotFound` for unknown ids.
    fn update_classroom<F>(&mut self, id: &str, mutate: F) -> RepoResult<Classroom>
    where
        F: FnOnce(&mut Classroom) -> bool;
}

/// SQLite-backed classroom repository.
pub struct SqliteClassroomRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteClassroomRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ClassroomRepository for SqliteClassroomRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Classroom>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CLASSROOM_SELECT_SQL} ORDER BY rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut classrooms = Vec::new();
        while let Some(row) = rows.next()? {
            let mut classroom = parse_classroom_row(row)?;
            load_children(self.conn, &mut classroom)?;
            classrooms.push(classroom);
        }
        Ok(classrooms)
    }

    fn find_by_id(&self, id: &str) -> RepoResult<Option<Classroom>> {
        load_classroom(self.conn, id)
    }

    fn find_by_join_code(&self, join_code: &str) -> RepoResult<Option<Classroom>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "{CLASSROOM_SELECT_SQL} WHERE join_code = ?1 ORDER BY rowid ASC LIMIT 1;"
        ))?;
        let mut rows = stmt.query([join_code])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut classroom = parse_classroom_row(row)?;
        load_children(self.conn, &mut classroom)?;
        Ok(Some(classroom))
    }

    fn save(&mut self, classroom: &Classroom) -> RepoResult<Classroom> {
        let mut stored = classroom.clone();
        if stored.id.trim().is_empty() {
            stored.id = Uuid::new_v4().to_string();
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        write_classroom(&tx, &stored)?;
        tx.commit()?;

        self.find_by_id(&stored.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("classroom `{}` missing after save", stored.id))
        })
    }

    fn update_classroom<F>(&mut self, id: &str, mutate: F) -> RepoResult<Classroom>
    where
        F: FnOnce(&mut Classroom) -> bool,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let Some(mut classroom) = load_classroom(&tx, id)? else {
            return Err(RepoError::NotFound(id.to_string()));
        };

        if mutate(&mut classroom) {
            write_classroom(&tx, &classroom)?;
        }
        tx.commit()?;

        Ok(classroom)
    }
}

fn load_classroom(conn: &Connection, id: &str) -> RepoResult<Option<Classroom>> {
    let mut stmt = conn.prepare_cached(&format!("{CLASSROOM_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut classroom = parse_classroom_row(row)?;
    load_children(conn, &mut classroom)?;
    Ok(Some(classroom))
}

fn parse_classroom_row(row: &Row<'_>) -> RepoResult<Classroom> {
    Ok(Classroom {
        id: row.get("id")?,
        name: row.get("name")?,
        subject: row.get("subject")?,
        teacher_id: row.get("teacher_id")?,
        join_code: row.get("join_code")?,
        ..Classroom::default()
    })
}

fn load_children(conn: &Connection, classroom: &mut Classroom) -> RepoResult<()> {
    classroom.students = load_students(conn, &classroom.id)?;
    classroom.attendance = load_attendance(conn, &classroom.id)?;
    classroom.notes = load_notes(conn, &classroom.id)?;
    Ok(())
}

fn load_students(conn: &Connection, classroom_id: &str) -> RepoResult<Vec<Student>> {
    let mut stmt = conn.prepare_cached(
        "SELECT student_id, name, email, avatar, join_date, bio
         FROM classroom_students
         WHERE classroom_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([classroom_id])?;
    let mut students = Vec::new();
    while let Some(row) = rows.next()? {
        students.push(Student {
            id: row.get("student_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            avatar: row.get("avatar")?,
            join_date: row.get("join_date")?,
            bio: row.get("bio")?,
        });
    }
    Ok(students)
}

fn load_attendance(conn: &Connection, classroom_id: &str) -> RepoResult<Vec<AttendanceRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT student_id, date, status
         FROM classroom_attendance
         WHERE classroom_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([classroom_id])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let status_text: String = row.get("status")?;
        let status = parse_attendance_status(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid attendance status `{status_text}` in classroom_attendance.status"
            ))
        })?;
        records.push(AttendanceRecord {
            student_id: row.get("student_id")?,
            date: row.get("date")?,
            status,
        });
    }
    Ok(records)
}

fn load_notes(conn: &Connection, classroom_id: &str) -> RepoResult<Vec<Note>> {
    let mut stmt = conn.prepare_cached(
        "SELECT note_id, title, content, summary, upload_date, author
         FROM classroom_notes
         WHERE classroom_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([classroom_id])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        notes.push(Note {
            id: row.get("note_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            summary: row.get("summary")?,
            upload_date: row.get("upload_date")?,
            author: row.get("author")?,
        });
    }
    Ok(notes)
}

/// Upserts the classroom row and rewrites its child rows.
///
/// Must run inside a transaction owned by the caller.
fn write_classroom(conn: &Connection, classroom: &Classroom) -> RepoResult<()> {
    let id = classroom.id.as_str();
    conn.execute(
        "INSERT INTO classrooms (id, name, subject, teacher_id, join_code)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            subject = excluded.subject,
            teacher_id = excluded.teacher_id,
            join_code = excluded.join_code,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            id,
            classroom.name.as_str(),
            classroom.subject.as_str(),
            classroom.teacher_id.as_str(),
            classroom.join_code.as_str(),
        ],
    )?;

    for table in ["classroom_students", "classroom_attendance", "classroom_notes"] {
        conn.execute(&format!("DELETE FROM {table} WHERE classroom_id = ?1;"), [id])?;
    }

    for (position, student) in classroom.students.iter().enumerate() {
        conn.execute(
            "INSERT INTO classroom_students
                (classroom_id, position, student_id, name, email, avatar, join_date, bio)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id,
                position as i64,
                student.id.as_str(),
                student.name.as_str(),
                student.email.as_str(),
                student.avatar.as_str(),
                student.join_date.as_str(),
                student.bio.as_deref(),
            ],
        )?;
    }

    for (position, record) in classroom.attendance.iter().enumerate() {
        conn.execute(
            "INSERT INTO classroom_attendance (classroom_id, position, student_id, date, status)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id,
                position as i64,
                record.student_id.as_str(),
                record.date.as_str(),
                attendance_status_to_db(record.status),
            ],
        )?;
    }

    for (position, note) in classroom.notes.iter().enumerate() {
        conn.execute(
            "INSERT INTO classroom_notes
                (classroom_id, position, note_id, title, content, summary, upload_date, author)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id,
                position as i64,
                note.id.as_str(),
                note.title.as_str(),
                note.content.as_str(),
                note.summary.as_deref(),
                note.upload_date.as_str(),
                note.author.as_str(),
            ],
        )?;
    }

    Ok(())
}

fn attendance_status_to_db(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "present",
        AttendanceStatus::Absent => "absent",
    }
}

fn parse_attendance_status(value: &str) -> Option<AttendanceStatus> {
    match value {
        "present" => Some(AttendanceStatus::Present),
        "absent" => Some(AttendanceStatus::Absent),
        _ => None,
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
