//! `attendance` command-line entry point.
//!
//! # Responsibility
//! - Map subcommands onto `ClassroomService` operations.
//! - Read JSON input and print JSON output; no business rules live here.

mod config;

use anyhow::{Context, Result};
use attendance_core::db::open_db;
use attendance_core::{
    init_logging, AttendanceRecord, Classroom, ClassroomRepository, ClassroomService, Note,
    SqliteClassroomRepository, Student,
};
use clap::{Args, Parser, Subcommand};
use config::{Config, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
use log::info;
use serde_json::{to_value, Value};
use std::io::Read;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "attendance", version, about = "Classroom attendance store")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = DB_PATH_ENV, global = true)]
    db: Option<String>,
    /// trace|debug|info|warn|error
    #[arg(long, env = LOG_LEVEL_ENV, global = true)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files.
    #[arg(long, env = LOG_DIR_ENV, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every classroom.
    List,
    /// Create a classroom; a join-code is generated unless given.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        teacher_id: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        join_code: Option<String>,
    },
    /// Show one classroom.
    Get { id: String },
    /// Replace the attendance list with a JSON array read from a file or `-`.
    Attendance { id: String, records: String },
    /// Append a note.
    AddNote {
        id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        upload_date: String,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long)]
        note_id: Option<String>,
    },
    /// Enroll a student; repeating a student id is a no-op.
    AddStudent {
        id: String,
        #[command(flatten)]
        student: StudentArgs,
    },
    /// Enroll a student in the classroom carrying a join-code.
    Join {
        code: String,
        #[command(flatten)]
        student: StudentArgs,
    },
    /// Presence statistics per enrolled student.
    Summary { id: String },
    /// Present/absent counts per marked date.
    Daily { id: String },
    /// Per-student report for one calendar month.
    Monthly {
        id: String,
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,
    },
    /// Attendance records of one student.
    StudentAttendance { id: String, student_id: String },
}

#[derive(Debug, Args)]
struct StudentArgs {
    #[arg(long)]
    student_id: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    join_date: String,
    #[arg(long, default_value = "")]
    avatar: String,
    #[arg(long)]
    bio: Option<String>,
}

impl From<StudentArgs> for Student {
    fn from(args: StudentArgs) -> Self {
        Self {
            id: args.student_id,
            name: args.name,
            email: args.email,
            avatar: args.avatar,
            join_date: args.join_date,
            bio: args.bio,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.db, cli.log_level, cli.log_dir)?;

    // Logging is best-effort past config validation.
    let log_dir = config
        .log_dir
        .to_str()
        .context("log directory path is not valid UTF-8")?;
    match init_logging(&config.log_level, log_dir) {
        Ok(()) => {
            for key in &config.defaulted {
                info!("event=config_default module=cli status=ok key={key}");
            }
        }
        Err(err) => eprintln!("warning: logging disabled: {err}"),
    }

    let mut conn = open_db(&config.db_path).with_context(|| {
        format!(
            "failed to open classroom database `{}`",
            config.db_path.display()
        )
    })?;
    let repo = SqliteClassroomRepository::try_new(&mut conn)
        .context("classroom database is not ready")?;
    let mut service = ClassroomService::new(repo);

    let output = execute(&mut service, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute<R: ClassroomRepository>(
    service: &mut ClassroomService<R>,
    command: Command,
) -> Result<Value> {
    let output = match command {
        Command::List => to_value(service.list_classrooms()?)?,
        Command::Create {
            name,
            subject,
            teacher_id,
            id,
            join_code,
        } => {
            let mut classroom = Classroom::new(name, subject, teacher_id);
            classroom.id = id.unwrap_or_default();
            classroom.join_code = join_code.unwrap_or_default();
            to_value(service.create_classroom(classroom)?)?
        }
        Command::Get { id } => to_value(service.get_classroom(&id)?)?,
        Command::Attendance { id, records } => {
            let records = read_records(&records)?;
            to_value(service.replace_attendance(&id, records)?)?
        }
        Command::AddNote {
            id,
            title,
            content,
            author,
            upload_date,
            summary,
            note_id,
        } => {
            let note = Note {
                id: note_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                title,
                content,
                summary,
                upload_date,
                author,
            };
            to_value(service.add_note(&id, note)?)?
        }
        Command::AddStudent { id, student } => {
            to_value(service.add_student(&id, student.into())?)?
        }
        Command::Join { code, student } => {
            to_value(service.enroll_by_code(&code, student.into())?)?
        }
        Command::Summary { id } => to_value(service.attendance_summary(&id)?)?,
        Command::Daily { id } => to_value(service.daily_attendance(&id)?)?,
        Command::Monthly { id, year, month } => {
            to_value(service.monthly_report(&id, year, month)?)?
        }
        Command::StudentAttendance { id, student_id } => {
            to_value(service.student_attendance(&id, &student_id)?)?
        }
    };
    Ok(output)
}

fn read_records(source: &str) -> Result<Vec<AttendanceRecord>> {
    let raw = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read attendance records from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("failed to read attendance records from `{source}`"))?
    };
    serde_json::from_str(&raw)
        .context("attendance records must be a JSON array of {studentId, date, status}")
}

#[cfg(test)]
mod tests {
    use super::{execute, read_records, Cli, Command};
    use attendance_core::db::open_db_in_memory;
    use attendance_core::{AttendanceStatus, ClassroomService, SqliteClassroomRepository};
    use clap::Parser;

    fn parse(args: &[&str]) -> Command {
        let mut argv = vec!["attendance"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli =
            Cli::try_parse_from(["attendance", "get", "c1", "--db", "/tmp/x.sqlite3"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some("/tmp/x.sqlite3"));
        assert!(matches!(cli.command, Command::Get { id } if id == "c1"));
    }

    #[test]
    fn create_requires_name_subject_and_teacher() {
        assert!(Cli::try_parse_from(["attendance", "create", "--name", "Algebra"]).is_err());
    }

    #[test]
    fn commands_drive_the_classroom_service() {
        let mut conn = open_db_in_memory().unwrap();
        let mut service =
            ClassroomService::new(SqliteClassroomRepository::try_new(&mut conn).unwrap());

        let created = execute(
            &mut service,
            parse(&[
                "create",
                "--name",
                "Algebra",
                "--subject",
                "Math",
                "--teacher-id",
                "t1",
                "--id",
                "c1",
            ]),
        )
        .unwrap();
        assert_eq!(created["id"], "c1");
        assert!(created["qrCode"].as_str().unwrap().starts_with("EDU-"));

        let student_args = [
            "add-student",
            "c1",
            "--student-id",
            "s1",
            "--name",
            "Ada",
            "--email",
            "ada@example.com",
            "--join-date",
            "2024-09-01",
        ];
        execute(&mut service, parse(&student_args)).unwrap();
        let enrolled = execute(&mut service, parse(&student_args)).unwrap();
        assert_eq!(enrolled["students"].as_array().unwrap().len(), 1);

        let noted = execute(
            &mut service,
            parse(&[
                "add-note",
                "c1",
                "--title",
                "Week 1",
                "--content",
                "Linear equations",
                "--author",
                "t1",
                "--upload-date",
                "2024-09-02",
            ]),
        )
        .unwrap();
        let notes = noted["notes"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(!notes[0]["id"].as_str().unwrap().is_empty());

        let summary = execute(&mut service, parse(&["summary", "c1"])).unwrap();
        assert_eq!(summary[0]["studentId"], "s1");
        assert_eq!(summary[0]["present"], 0);
    }

    #[test]
    fn join_enrolls_by_code_and_reports_bad_codes() {
        let mut conn = open_db_in_memory().unwrap();
        let mut service =
            ClassroomService::new(SqliteClassroomRepository::try_new(&mut conn).unwrap());
        let created = execute(
            &mut service,
            parse(&[
                "create", "--name", "Algebra", "--subject", "Math", "--teacher-id", "t1",
            ]),
        )
        .unwrap();
        let code = created["qrCode"].as_str().unwrap().to_string();

        let join_args = |code: &str| {
            vec![
                "join".to_string(),
                code.to_string(),
                "--student-id".to_string(),
                "s1".to_string(),
                "--name".to_string(),
                "Ada".to_string(),
                "--email".to_string(),
                "ada@example.com".to_string(),
                "--join-date".to_string(),
                "2024-09-01".to_string(),
            ]
        };
        let args = join_args(&code);
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        execute(&mut service, parse(&argv)).unwrap();
        let joined = execute(&mut service, parse(&argv)).unwrap();
        assert_eq!(joined["id"], created["id"]);
        assert_eq!(joined["students"].as_array().unwrap().len(), 1);

        let args = join_args("EDU-00000000");
        let argv: Vec<&str> = args.iter().map(String::as_str).collect();
        let err = execute(&mut service, parse(&argv)).unwrap_err();
        assert!(err.to_string().contains("invalid classroom code: EDU-00000000"));
    }

    #[test]
    fn daily_and_monthly_print_reports() {
        let mut conn = open_db_in_memory().unwrap();
        let mut service =
            ClassroomService::new(SqliteClassroomRepository::try_new(&mut conn).unwrap());
        execute(
            &mut service,
            parse(&[
                "create", "--name", "Algebra", "--subject", "Math", "--teacher-id", "t1", "--id",
                "c1",
            ]),
        )
        .unwrap();

        let daily = execute(&mut service, parse(&["daily", "c1"])).unwrap();
        assert!(daily.as_array().unwrap().is_empty());
        let monthly = execute(
            &mut service,
            parse(&["monthly", "c1", "--year", "2024", "--month", "9"]),
        )
        .unwrap();
        assert!(monthly.as_array().unwrap().is_empty());
    }

    #[test]
    fn monthly_rejects_out_of_range_month() {
        assert!(Cli::try_parse_from([
            "attendance", "monthly", "c1", "--year", "2024", "--month", "13"
        ])
        .is_err());
    }

    #[test]
    fn unknown_classroom_surfaces_not_found_message() {
        let mut conn = open_db_in_memory().unwrap();
        let mut service =
            ClassroomService::new(SqliteClassroomRepository::try_new(&mut conn).unwrap());

        let err = execute(&mut service, parse(&["get", "missing"])).unwrap_err();
        assert!(err.to_string().contains("classroom not found with id: missing"));
    }

    #[test]
    fn read_records_parses_json_array_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(
            &path,
            r#"[{"studentId":"s1","date":"2024-09-02","status":"present"},
                {"studentId":"s2","date":"2024-09-02","status":"absent"}]"#,
        )
        .unwrap();

        let records = read_records(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].status, AttendanceStatus::Absent);
    }

    #[test]
    fn read_records_rejects_unknown_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, r#"[{"studentId":"s1","date":"d","status":"late"}]"#).unwrap();

        assert!(read_records(path.to_str().unwrap()).is_err());
    }
}
