use scenic_core::expressions::ExpressionError;

/// Failure to resolve one `{{ ... }}` expression. Carries the offending
/// expression text and the field path it was found in; aborts only the
/// entry being resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot resolve `{{{{ {expression} }}}}` in `{field}`: {kind}")]
pub struct ResolutionError {
    pub expression: String,
    pub field: String,
    pub kind: ResolutionErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionErrorKind {
    #[error("`{0}` not found in step captures or globals")]
    UnknownRoot(String),
    #[error("step `{0}` has not executed")]
    UnexecutedStep(String),
    #[error("missing path segment `{0}`")]
    MissingSegment(String),
    #[error("index {0} out of bounds")]
    IndexOutOfBounds(usize),
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    #[error("function `{0}` failed: {1}")]
    Function(String, String),
    #[error("no host configured for relative path")]
    MissingHost,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Parse(#[from] ExpressionError),
}

impl ResolutionErrorKind {
    pub fn at(self, field: impl Into<String>, expression: impl Into<String>) -> ResolutionError {
        ResolutionError {
            expression: expression.into(),
            field: field.into(),
            kind: self,
        }
    }
}
