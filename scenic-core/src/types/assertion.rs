use crate::types::AnyValue;

/// Closed set of assertion kinds. Aliases cover the spellings found in
/// existing case files (`equal`, `status`, `exception`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssertionType {
    #[serde(alias = "status")]
    StatusCode,
    #[serde(alias = "equal")]
    Equals,
    #[serde(alias = "not_equal")]
    NotEquals,
    #[serde(alias = "contain")]
    Contains,
    Regex,
    Length,
    #[serde(alias = "exception")]
    Raises,
    IsNone,
    IsNotNone,
    CalledOnce,
    CalledWith,
}

impl AssertionType {
    /// Kinds that address a field inside the captured body.
    pub fn requires_field(self) -> bool {
        matches!(
            self,
            Self::Equals
                | Self::NotEquals
                | Self::Regex
                | Self::Length
                | Self::IsNone
                | Self::IsNotNone
        )
    }

    /// Kinds that compare against a declared expected value.
    pub fn requires_expected(self) -> bool {
        matches!(
            self,
            Self::StatusCode
                | Self::Equals
                | Self::NotEquals
                | Self::Contains
                | Self::Regex
                | Self::Length
                | Self::CalledWith
        )
    }
}

/// A declarative check against a captured result. `expected` may be a
/// literal or an expression resolved just before evaluation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assertion {
    #[serde(rename = "type")]
    pub kind: AssertionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<AnyValue>,
}
