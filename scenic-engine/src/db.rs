use async_trait::async_trait;
use scenic_core::types::AnyValue;
use sqlx::{Column, Row};

#[derive(Debug, Clone, thiserror::Error)]
pub enum DbError {
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DbOutcome {
    /// Rows from a SELECT, each row as a JSON object.
    Rows(Vec<AnyValue>),
    /// Rows affected by a write.
    Affected(u64),
}

#[async_trait]
pub trait DatabaseClient: Send + Sync {
    async fn execute(&self, query: &str) -> Result<DbOutcome, DbError>;
}

pub struct MySqlClient {
    pool: sqlx::MySqlPool,
}

impl MySqlClient {
    pub fn new(pool: sqlx::MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = sqlx::MySqlPool::connect(url)
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn execute(&self, query: &str) -> Result<DbOutcome, DbError> {
        tracing::debug!(query, "executing teardown query");
        if query.trim_start().to_ascii_lowercase().starts_with("select") {
            let rows = sqlx::query(query)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DbError::Query(e.to_string()))?;
            Ok(DbOutcome::Rows(rows.iter().map(row_to_json).collect()))
        } else {
            let done = sqlx::query(query)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Query(e.to_string()))?;
            Ok(DbOutcome::Affected(done.rows_affected()))
        }
    }
}

/// Decode the common scalar column types; anything else comes back null.
fn row_to_json(row: &sqlx::mysql::MySqlRow) -> AnyValue {
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        let v = if let Ok(v) = row.try_get::<i64, _>(name) {
            AnyValue::Number(v.into())
        } else if let Ok(v) = row.try_get::<f64, _>(name) {
            serde_json::Number::from_f64(v)
                .map(AnyValue::Number)
                .unwrap_or(AnyValue::Null)
        } else if let Ok(v) = row.try_get::<bool, _>(name) {
            AnyValue::Bool(v)
        } else if let Ok(v) = row.try_get::<String, _>(name) {
            AnyValue::String(v)
        } else {
            AnyValue::Null
        };
        map.insert(name.to_string(), v);
    }
    AnyValue::Object(map)
}
