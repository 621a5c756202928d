use std::time::Duration;

use scenic_core::types::Teardown;

use crate::context::ExecutionContext;
use crate::db::{DatabaseClient, DbError, DbOutcome};
use crate::error::ResolutionError;
use crate::functions::FunctionRegistry;
use crate::http::{HttpError, RequestClient, RequestParts};
use crate::request::{build_url, headers_to_map, scalar_string};
use crate::resolver::Resolver;

#[derive(Debug, Clone, thiserror::Error)]
pub enum TeardownError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("no database client configured")]
    NoDatabase,
}

#[derive(Debug, Clone)]
pub struct TeardownResult {
    pub id: String,
    pub error: Option<TeardownError>,
}

impl TeardownResult {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs cleanup entries after a scenario. Every entry is attempted and
/// reported regardless of earlier teardown failures.
pub struct TeardownExecutor<'a> {
    http: &'a dyn RequestClient,
    db: Option<&'a dyn DatabaseClient>,
    functions: &'a FunctionRegistry,
    timeout: Duration,
}

impl<'a> TeardownExecutor<'a> {
    pub fn new(
        http: &'a dyn RequestClient,
        db: Option<&'a dyn DatabaseClient>,
        functions: &'a FunctionRegistry,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            db,
            functions,
            timeout,
        }
    }

    pub async fn run_all(
        &self,
        teardowns: &[Teardown],
        ctx: &mut ExecutionContext,
    ) -> Vec<TeardownResult> {
        let mut results = Vec::with_capacity(teardowns.len());
        for t in teardowns {
            results.push(self.run_one(t, ctx).await);
        }
        results
    }

    pub async fn run_one(&self, teardown: &Teardown, ctx: &mut ExecutionContext) -> TeardownResult {
        let error = match self.dispatch(teardown, ctx).await {
            Ok(()) => None,
            Err(e) => {
                tracing::debug!(id = %teardown.id(), error = %e, "teardown failed");
                Some(e)
            }
        };
        TeardownResult {
            id: teardown.id().to_string(),
            error,
        }
    }

    async fn dispatch(
        &self,
        teardown: &Teardown,
        ctx: &mut ExecutionContext,
    ) -> Result<(), TeardownError> {
        match teardown {
            Teardown::Api {
                id,
                path,
                method,
                headers,
                data,
            } => {
                let resolver = Resolver::new(ctx, self.functions);
                let path_str = scalar_string(&resolver.resolve_string("path", path)?);
                let host = ctx.get_global("host").and_then(|v| v.as_str().map(String::from));
                let url =
                    build_url(host.as_deref(), &path_str).map_err(|k| k.at("path", path.as_str()))?;
                let resolved_headers = match headers {
                    Some(h) => Some(resolver.resolve_field("headers", h)?),
                    None => None,
                };
                let resolved_data = match data {
                    Some(d) => Some(resolver.resolve_field("data", d)?),
                    None => None,
                };

                let response = self
                    .http
                    .send(
                        RequestParts {
                            method: method.clone(),
                            url,
                            headers: headers_to_map(resolved_headers.as_ref()),
                            data: resolved_data,
                            params: Vec::new(),
                            files: Default::default(),
                        },
                        self.timeout,
                    )
                    .await?;

                // Teardown responses are captured too so later entries
                // can reference them. No assertions run against them.
                ctx.record(id, response.status, response.body_json());
                Ok(())
            }
            Teardown::Db { id, query } => {
                let resolver = Resolver::new(ctx, self.functions);
                let sql = scalar_string(&resolver.resolve_string("query", query)?);
                let db = self.db.ok_or(TeardownError::NoDatabase)?;
                let outcome = db.execute(&sql).await?;
                let captured = match outcome {
                    DbOutcome::Rows(rows) => serde_json::json!({ "rows": rows }),
                    DbOutcome::Affected(n) => serde_json::json!({ "affected": n }),
                };
                ctx.record_value(id, captured);
                Ok(())
            }
        }
    }
}
