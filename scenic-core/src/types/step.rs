use std::collections::BTreeMap;

use crate::types::{AnyValue, Assertion};

/// One network-call unit with a unique id within its scenario.
///
/// The definition is immutable; a fresh capture is produced each time
/// the step executes. Any string inside `path`, `headers`, `data`, or
/// `params` may embed `{{ ... }}` expressions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Step {
    pub id: String,

    pub path: String,

    pub method: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnyValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<AnyValue>,

    /// Multipart uploads: field name -> file path.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, String>,

    #[serde(
        default,
        rename = "asserts",
        alias = "assertions",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub asserts: Vec<Assertion>,
}
