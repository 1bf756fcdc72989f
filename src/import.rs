use std::io::Read;

use rusqlite::Connection;
use serde::Deserialize;

use crate::db;
use crate::error::{Error, Result};
use crate::models::{NewSubject, SUBJECT_CODE_MAX, SUBJECT_NAME_MAX};

#[derive(Debug, Deserialize)]
struct SubjectRow {
    code: String,
    name: String,
    #[serde(alias = "total_video_count", default)]
    goal_video_count: u32,
    #[serde(alias = "total_question_count", default)]
    goal_question_count: u32,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub updated: usize,
}

pub fn check_subject(subject: &NewSubject) -> std::result::Result<(), String> {
    if subject.code.is_empty() {
        return Err("code is required".to_string());
    }
    if subject.code.chars().count() > SUBJECT_CODE_MAX {
        return Err(format!("code {:?} is longer than {SUBJECT_CODE_MAX} characters", subject.code));
    }
    if subject.name.is_empty() {
        return Err("name is required".to_string());
    }
    if subject.name.chars().count() > SUBJECT_NAME_MAX {
        return Err(format!("name is longer than {SUBJECT_NAME_MAX} characters"));
    }
    Ok(())
}

/// upsert subjects keyed by code; all rows or none
pub fn import_subjects<R: Read>(conn: &mut Connection, reader: R) -> Result<ImportReport> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let tx = conn.transaction()?;
    let mut report = ImportReport::default();

    for (idx, result) in csv_reader.deserialize::<SubjectRow>().enumerate() {
        let row = result?;
        let subject = NewSubject {
            name: row.name,
            code: row.code,
            goal_video_count: row.goal_video_count,
            goal_question_count: row.goal_question_count,
            image: row.image.filter(|s| !s.is_empty()),
        };
        // header is line 1
        check_subject(&subject).map_err(|reason| Error::InvalidSubject { row: idx + 2, reason })?;

        if db::upsert_subject(&tx, &subject)? {
            report.inserted += 1;
        } else {
            report.updated += 1;
        }
    }

    tx.commit()?;
    tracing::info!(inserted = report.inserted, updated = report.updated, "subjects imported");
    Ok(report)
}

pub fn import_subjects_file(conn: &mut Connection, path: &std::path::Path) -> Result<ImportReport> {
    let file = std::fs::File::open(path)?;
    import_subjects(conn, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::in_memory_db;
    use std::io::Write;

    const CSV: &str = "\
code,name,total_video_count,total_question_count,image
ANA, Anatomy ,40,300,enemies/skeleton.png
PHY,Physiology,25,200,
";

    #[test]
    fn imports_and_reimports_by_code() {
        let mut conn = in_memory_db();
        let report = import_subjects(&mut conn, CSV.as_bytes()).unwrap();
        assert_eq!(report, ImportReport { inserted: 2, updated: 0 });

        let again = import_subjects(&mut conn, CSV.as_bytes()).unwrap();
        assert_eq!(again, ImportReport { inserted: 0, updated: 2 });

        let subjects = db::list_subjects(&conn).unwrap();
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].name, "Anatomy");
        assert_eq!(subjects[0].image.as_deref(), Some("enemies/skeleton.png"));
        assert_eq!(subjects[1].image, None);
    }

    #[test]
    fn bad_row_rolls_back() {
        let mut conn = in_memory_db();
        let csv = "code,name,goal_video_count,goal_question_count\nANA,Anatomy,1,1\nTOOLONG,Oops,1,1\n";
        let err = import_subjects(&mut conn, csv.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidSubject { row: 3, .. }));
        assert!(db::list_subjects(&conn).unwrap().is_empty());
    }

    #[test]
    fn negative_goal_is_a_csv_error() {
        let mut conn = in_memory_db();
        let csv = "code,name,goal_video_count,goal_question_count\nANA,Anatomy,-1,1\n";
        assert!(matches!(import_subjects(&mut conn, csv.as_bytes()), Err(Error::Import(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut conn = in_memory_db();
        let err = import_subjects_file(&mut conn, &dir.path().join("subjects.csv")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let mut conn = in_memory_db();
        let report = import_subjects_file(&mut conn, file.path()).unwrap();
        assert_eq!(report.inserted, 2);
    }
}
