use attendance_core::db::migrations::latest_version;
use attendance_core::db::{open_db, open_db_in_memory, DbError};
use attendance_core::{Classroom, ClassroomRepository, SqliteClassroomRepository, Student};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "classrooms");
    assert_table_exists(&conn, "classroom_students");
    assert_table_exists(&conn, "classroom_attendance");
    assert_table_exists(&conn, "classroom_notes");
}

#[test]
fn reopening_populated_database_keeps_classrooms_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attendance.sqlite3");

    {
        let mut conn = open_db(&path).unwrap();
        let mut repo = SqliteClassroomRepository::try_new(&mut conn).unwrap();
        let mut classroom = Classroom::new("Algebra", "Math", "t1");
        classroom.id = "c1".to_string();
        classroom.join_code = "EDU-0A0B0C0D".to_string();
        classroom.students = vec![Student::new("s1", "Ada", "ada@example.com")];
        repo.save(&classroom).unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let repo = SqliteClassroomRepository::try_new(&mut conn).unwrap();
    let reloaded = repo.find_by_id("c1").unwrap().unwrap();
    assert_eq!(reloaded.join_code, "EDU-0A0B0C0D");
    assert_eq!(reloaded.students.len(), 1);
    assert_eq!(repo.find_all().unwrap().len(), 1);
}

#[test]
fn classroom_database_from_newer_binary_is_refused_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    let future_version = latest_version() + 1;

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO classrooms (id, name, subject, teacher_id, join_code)
             VALUES ('c1', 'Algebra', 'Math', 't1', 'EDU-0A0B0C0D');",
            [],
        )
        .unwrap();
        conn.execute_batch(&format!("PRAGMA user_version = {future_version};"))
            .unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(err.to_string().contains("classroom database schema version"));
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion { db_version, latest_supported }
            if db_version == future_version && latest_supported == latest_version()
    ));

    let raw = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&raw), future_version);
    let rows: i64 = raw
        .query_row("SELECT COUNT(*) FROM classrooms;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn failed_migration_reports_version_and_leaves_schema_unversioned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conflict.sqlite3");

    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE classrooms (legacy TEXT);")
            .unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Migration { version: 1, .. }));
    assert!(err.to_string().starts_with("classroom schema migration 1 failed"));

    let raw = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&raw), 0);
}

#[test]
fn opened_connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = conn.execute(
        "INSERT INTO classroom_notes
            (classroom_id, position, note_id, title, content, upload_date, author)
         VALUES ('missing', 0, 'n1', 't', 'c', 'd', 'a');",
        [],
    );
    assert!(orphan.is_err());
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
