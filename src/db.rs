use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::path::{Path, PathBuf};

use crate::models::{
    ActivityTotals, NewStudyEvent, NewSubject, StudyEvent, StudyMaterial, Subject, SubjectId,
    TIMESTAMP_FORMAT, User, UserId,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        username TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS subjects (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        code TEXT NOT NULL UNIQUE,
        goal_video_count INTEGER NOT NULL DEFAULT 0 CHECK (goal_video_count >= 0),
        goal_question_count INTEGER NOT NULL DEFAULT 0 CHECK (goal_question_count >= 0),
        image TEXT
    );

    CREATE TABLE IF NOT EXISTS study_events (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        subject_id INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
        material TEXT NOT NULL,
        video_count INTEGER NOT NULL DEFAULT 0 CHECK (video_count >= 0),
        solve_count INTEGER NOT NULL DEFAULT 0 CHECK (solve_count >= 0),
        minutes INTEGER NOT NULL DEFAULT 0 CHECK (minutes >= 0),
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_study_events_user ON study_events (user_id, subject_id);
";

/// default db file path
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("study-quest")
        .join("study_quest.db")
}

/// open db + init tables
pub fn init_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    tracing::debug!(path = %path.display(), "database ready");
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}

// -- users --

pub fn insert_user(conn: &Connection, username: &str) -> Result<User> {
    conn.execute("INSERT INTO users (username) VALUES (?1)", params![username])?;
    Ok(User {
        id: UserId(conn.last_insert_rowid()),
        username: username.to_string(),
    })
}

pub fn find_user_by_name(conn: &Connection, username: &str) -> Result<Option<User>> {
    conn.query_row(
        "SELECT id, username FROM users WHERE username = ?1",
        params![username],
        |row| {
            Ok(User {
                id: UserId(row.get(0)?),
                username: row.get(1)?,
            })
        },
    )
    .optional()
}

// -- subjects --

fn subject_from_row(row: &Row<'_>) -> Result<Subject> {
    Ok(Subject {
        id: SubjectId(row.get(0)?),
        name: row.get(1)?,
        code: row.get(2)?,
        goal_video_count: row.get(3)?,
        goal_question_count: row.get(4)?,
        image: row.get(5)?,
    })
}

/// insert or update keyed by code, returns true when a new row was created
pub fn upsert_subject(conn: &Connection, subject: &NewSubject) -> Result<bool> {
    let existed: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM subjects WHERE code = ?1)",
        params![subject.code],
        |row| row.get(0),
    )?;
    conn.execute(
        "INSERT INTO subjects (name, code, goal_video_count, goal_question_count, image)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (code) DO UPDATE
         SET name = excluded.name,
             goal_video_count = excluded.goal_video_count,
             goal_question_count = excluded.goal_question_count,
             image = excluded.image",
        params![
            subject.name,
            subject.code,
            subject.goal_video_count,
            subject.goal_question_count,
            subject.image,
        ],
    )?;
    Ok(!existed)
}

/// whole catalog, ordered by code
pub fn list_subjects(conn: &Connection) -> Result<Vec<Subject>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, code, goal_video_count, goal_question_count, image
         FROM subjects
         ORDER BY code, id",
    )?;
    let rows = stmt.query_map([], subject_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

// -- study events --

fn parse_timestamp(idx: usize, s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn event_from_row(row: &Row<'_>) -> Result<StudyEvent> {
    let material_str: String = row.get(3)?;
    let material = StudyMaterial::parse(&material_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            format!("unknown study material {material_str:?}").into(),
        )
    })?;
    let created_at_str: String = row.get(7)?;
    Ok(StudyEvent {
        id: row.get(0)?,
        user_id: UserId(row.get(1)?),
        subject_id: SubjectId(row.get(2)?),
        material,
        video_count: row.get(4)?,
        solve_count: row.get(5)?,
        minutes: row.get(6)?,
        created_at: parse_timestamp(7, &created_at_str)?,
    })
}

/// append one event
pub fn insert_event(
    conn: &Connection,
    user_id: UserId,
    event: &NewStudyEvent,
    created_at: NaiveDateTime,
) -> Result<StudyEvent> {
    conn.execute(
        "INSERT INTO study_events
         (user_id, subject_id, material, video_count, solve_count, minutes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id.0,
            event.subject_id.0,
            event.material.as_str(),
            event.video_count,
            event.solve_count,
            event.minutes,
            created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(StudyEvent {
        id: conn.last_insert_rowid(),
        user_id,
        subject_id: event.subject_id,
        material: event.material,
        video_count: event.video_count,
        solve_count: event.solve_count,
        minutes: event.minutes,
        created_at,
    })
}

/// newest stored timestamp across all events
pub fn latest_event_time(conn: &Connection) -> Result<Option<NaiveDateTime>> {
    let latest: Option<String> =
        conn.query_row("SELECT MAX(created_at) FROM study_events", [], |row| {
            row.get(0)
        })?;
    latest.map(|s| parse_timestamp(0, &s)).transpose()
}

/// all events of one user, oldest first
pub fn events_for_user(conn: &Connection, user_id: UserId) -> Result<Vec<StudyEvent>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, subject_id, material, video_count, solve_count, minutes, created_at
         FROM study_events
         WHERE user_id = ?1
         ORDER BY created_at, id",
    )?;
    let rows = stmt.query_map(params![user_id.0], event_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// video/solve/minute sums for one user
pub fn user_totals(conn: &Connection, user_id: UserId) -> Result<ActivityTotals> {
    conn.query_row(
        "SELECT COALESCE(SUM(video_count), 0), COALESCE(SUM(solve_count), 0), COALESCE(SUM(minutes), 0)
         FROM study_events WHERE user_id = ?1",
        params![user_id.0],
        |row| {
            let (videos, solves, minutes): (i64, i64, i64) = (row.get(0)?, row.get(1)?, row.get(2)?);
            Ok(ActivityTotals {
                video_count: videos.max(0) as u64,
                solve_count: solves.max(0) as u64,
                minutes: minutes.max(0) as u64,
            })
        },
    )
}

/// videos one user has logged against one subject
pub fn subject_video_total(conn: &Connection, user_id: UserId, subject_id: SubjectId) -> Result<u64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(video_count), 0) FROM study_events WHERE user_id = ?1 AND subject_id = ?2",
        params![user_id.0, subject_id.0],
        |row| row.get(0),
    )?;
    Ok(total.max(0) as u64)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn in_memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    pub(crate) fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    pub(crate) fn sample_subject(code: &str, goal_videos: u32, goal_questions: u32) -> NewSubject {
        NewSubject {
            name: format!("Subject {code}"),
            code: code.to_string(),
            goal_video_count: goal_videos,
            goal_question_count: goal_questions,
            image: None,
        }
    }

    pub(crate) fn insert_subject(conn: &Connection, subject: &NewSubject) -> Result<Subject> {
        conn.execute(
            "INSERT INTO subjects (name, code, goal_video_count, goal_question_count, image)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                subject.name,
                subject.code,
                subject.goal_video_count,
                subject.goal_question_count,
                subject.image,
            ],
        )?;
        Ok(Subject {
            id: SubjectId(conn.last_insert_rowid()),
            name: subject.name.clone(),
            code: subject.code.clone(),
            goal_video_count: subject.goal_video_count,
            goal_question_count: subject.goal_question_count,
            image: subject.image.clone(),
        })
    }

    pub(crate) fn log(subject_id: SubjectId, videos: u32, solves: u32, minutes: u32) -> NewStudyEvent {
        NewStudyEvent {
            subject_id,
            material: StudyMaterial::QuestionBank,
            video_count: videos,
            solve_count: solves,
            minutes,
        }
    }

    #[test]
    fn test_user_lookup() {
        let conn = in_memory_db();
        let alice = insert_user(&conn, "alice").unwrap();
        assert_eq!(find_user_by_name(&conn, "alice").unwrap(), Some(alice));
        assert_eq!(find_user_by_name(&conn, "bob").unwrap(), None);
        assert!(insert_user(&conn, "alice").is_err());
    }

    #[test]
    fn test_subjects_ordered_by_code() {
        let conn = in_memory_db();
        insert_subject(&conn, &sample_subject("PHY", 10, 50)).unwrap();
        insert_subject(&conn, &sample_subject("ANA", 20, 80)).unwrap();
        let codes: Vec<String> = list_subjects(&conn)
            .unwrap()
            .into_iter()
            .map(|s| s.code)
            .collect();
        assert_eq!(codes, vec!["ANA", "PHY"]);
    }

    #[test]
    fn test_upsert_updates_goals() {
        let conn = in_memory_db();
        assert!(upsert_subject(&conn, &sample_subject("ANA", 20, 80)).unwrap());
        assert!(!upsert_subject(&conn, &sample_subject("ANA", 25, 90)).unwrap());
        let subjects = list_subjects(&conn).unwrap();
        assert_eq!(subjects.len(), 1);
        assert_eq!(subjects[0].goal_video_count, 25);
        assert_eq!(subjects[0].goal_question_count, 90);
    }

    #[test]
    fn test_event_roundtrip() {
        let conn = in_memory_db();
        let user = insert_user(&conn, "alice").unwrap();
        let subject = insert_subject(&conn, &sample_subject("ANA", 20, 80)).unwrap();
        let stored = insert_event(&conn, user.id, &log(subject.id, 2, 5, 30), at(19, 10)).unwrap();

        let loaded = events_for_user(&conn, user.id).unwrap();
        assert_eq!(loaded, vec![stored]);
        assert_eq!(latest_event_time(&conn).unwrap(), Some(at(19, 10)));
    }

    #[test]
    fn test_unknown_subject_rejected() {
        let conn = in_memory_db();
        let user = insert_user(&conn, "alice").unwrap();
        let result = insert_event(&conn, user.id, &log(SubjectId(99), 1, 0, 0), at(19, 10));
        assert!(result.is_err());
    }

    #[test]
    fn test_totals_are_per_user() {
        let conn = in_memory_db();
        let alice = insert_user(&conn, "alice").unwrap();
        let bob = insert_user(&conn, "bob").unwrap();
        let ana = insert_subject(&conn, &sample_subject("ANA", 20, 80)).unwrap();
        let phy = insert_subject(&conn, &sample_subject("PHY", 10, 50)).unwrap();

        insert_event(&conn, alice.id, &log(ana.id, 2, 5, 30), at(18, 9)).unwrap();
        insert_event(&conn, alice.id, &log(phy.id, 1, 0, 10), at(19, 9)).unwrap();
        insert_event(&conn, bob.id, &log(ana.id, 7, 7, 7), at(19, 9)).unwrap();

        let totals = user_totals(&conn, alice.id).unwrap();
        assert_eq!(
            totals,
            ActivityTotals {
                video_count: 3,
                solve_count: 5,
                minutes: 40
            }
        );
        assert_eq!(subject_video_total(&conn, alice.id, ana.id).unwrap(), 2);
        assert_eq!(subject_video_total(&conn, bob.id, phy.id).unwrap(), 0);
    }

    #[test]
    fn test_empty_totals_are_zero() {
        let conn = in_memory_db();
        let user = insert_user(&conn, "alice").unwrap();
        assert_eq!(user_totals(&conn, user.id).unwrap(), ActivityTotals::default());
        assert_eq!(latest_event_time(&conn).unwrap(), None);
    }
}
