use std::fmt;

use serde::Serialize;

/// fields of the study log form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Subject,
    Material,
    VideoCount,
    SolveCount,
    Minutes,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::Subject => "Subject",
            Field::Material => "Material",
            Field::VideoCount => "Videos watched",
            Field::SolveCount => "Problems solved",
            Field::Minutes => "Minutes studied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// every problem found in one submission, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field.label(), e.message))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid study log: {0}")]
    Validation(ValidationErrors),

    #[error("not logged in")]
    Unauthenticated,

    #[error("username must not be blank")]
    BlankUsername,

    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("import error: {0}")]
    Import(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid subject row {row}: {reason}")]
    InvalidSubject { row: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
