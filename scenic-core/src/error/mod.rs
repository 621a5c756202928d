use std::fmt;

use thiserror::Error;

use crate::expressions::ExpressionError;

/// Anything that can go wrong while loading a case or config document.
#[derive(Debug, Error)]
pub enum ScenicError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("document is neither valid JSON nor valid YAML")]
    UnknownFormat,
}

/// Structural problems in a test case, collected exhaustively so the
/// author sees every problem in one pass. Display names the subject
/// and the first offending path; the full list stays available on the
/// `violations` field.
#[derive(Debug, Error)]
#[error(
    "`{subject}` failed validation with {} violation(s), first: {}",
    .violations.len(),
    .violations.first().map(|v| v.to_string()).unwrap_or_default()
)]
pub struct ValidationError {
    pub subject: String,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(subject: impl Into<String>, violations: Vec<Violation>) -> Self {
        Self {
            subject: subject.into(),
            violations,
        }
    }
}

/// One structural problem, addressed by a dotted path into the case
/// document (`steps[1].asserts[0].expected`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A violation caused by a malformed `{{ ... }}` expression inside
    /// the value at `path`.
    pub fn expression(path: impl Into<String>, err: &ExpressionError) -> Self {
        Self::new(path, format!("invalid expression: {err}"))
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}`: {}", self.path, self.message)
    }
}
