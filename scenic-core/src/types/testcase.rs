use crate::types::{Step, Teardown};

/// One declared scenario: an ordered list of steps plus optional
/// teardowns that run unconditionally after the steps.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TestCase {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub project: String,

    /// Overrides the project config host when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default)]
    pub steps: Vec<Step>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teardowns: Vec<Teardown>,
}
