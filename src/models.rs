use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// stored timestamp format, server local time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub const SUBJECT_NAME_MAX: usize = 50;
pub const SUBJECT_CODE_MAX: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(pub i64);

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// study material the log was made with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyMaterial {
    QAssist,
    QuestionBank,
    Other,
}

impl StudyMaterial {
    pub const ALL: [StudyMaterial; 3] = [
        StudyMaterial::QAssist,
        StudyMaterial::QuestionBank,
        StudyMaterial::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StudyMaterial::QAssist => "Q-Assist",
            StudyMaterial::QuestionBank => "Question Bank",
            StudyMaterial::Other => "Other",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyMaterial::QAssist => "QA",
            StudyMaterial::QuestionBank => "QB",
            StudyMaterial::Other => "OTHER",
        }
    }

    /// accepts the stored code or the label, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        StudyMaterial::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s) || m.label().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for StudyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: String,
    pub goal_video_count: u32,
    pub goal_question_count: u32,
    pub image: Option<String>,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.name)
    }
}

/// subject as entered by an administrator, before it has an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    pub goal_video_count: u32,
    pub goal_question_count: u32,
    pub image: Option<String>,
}

/// one logged piece of study, append-only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyEvent {
    pub id: i64,
    pub user_id: UserId,
    pub subject_id: SubjectId,
    pub material: StudyMaterial,
    pub video_count: u32,
    pub solve_count: u32,
    pub minutes: u32,
    pub created_at: NaiveDateTime,
}

/// validated log input, not yet stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewStudyEvent {
    pub subject_id: SubjectId,
    pub material: StudyMaterial,
    pub video_count: u32,
    pub solve_count: u32,
    pub minutes: u32,
}

/// per-user sums used as the "before" side of milestone detection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityTotals {
    pub video_count: u64,
    pub solve_count: u64,
    pub minutes: u64,
}
