use crate::types::AnyValue;

/// Cleanup action run after a scenario's steps, unconditionally.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "operation_type", rename_all = "snake_case")]
pub enum Teardown {
    Api {
        id: String,
        path: String,
        #[serde(default = "default_method")]
        method: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        headers: Option<AnyValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<AnyValue>,
    },
    Db {
        id: String,
        query: String,
    },
}

impl Teardown {
    pub fn id(&self) -> &str {
        match self {
            Teardown::Api { id, .. } => id,
            Teardown::Db { id, .. } => id,
        }
    }
}

fn default_method() -> String {
    "GET".to_string()
}
