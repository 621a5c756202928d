use std::time::Duration;

use scenic_core::types::{Assertion, Step};

use crate::assertions::{evaluate_assertions, AssertionFailure, StepCapture};
use crate::auth::AuthError;
use crate::context::ExecutionContext;
use crate::error::ResolutionError;
use crate::functions::FunctionRegistry;
use crate::http::{HttpError, RequestClient, RequestParts};
use crate::request::{build_url, headers_to_map, params_to_pairs, scalar_string};
use crate::resolver::Resolver;

/// A step that never produced a capture: either its inputs could not be
/// resolved, the request never completed, or login failed before any
/// step ran.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error("login failed: {0}")]
    Auth(AuthError),
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub step_id: String,
    pub capture: Option<StepCapture>,
    pub assertion_failures: Vec<AssertionFailure>,
    pub execution_error: Option<ExecutionError>,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.execution_error.is_none() && self.assertion_failures.is_empty()
    }

    pub(crate) fn errored(step_id: &str, error: ExecutionError) -> Self {
        Self {
            step_id: step_id.to_string(),
            capture: None,
            assertion_failures: Vec::new(),
            execution_error: Some(error),
        }
    }
}

/// Executes one step at a time against a shared HTTP client. The
/// context is exclusive to the running scenario.
pub struct StepExecutor<'a> {
    http: &'a dyn RequestClient,
    functions: &'a FunctionRegistry,
    timeout: Duration,
}

impl<'a> StepExecutor<'a> {
    pub fn new(
        http: &'a dyn RequestClient,
        functions: &'a FunctionRegistry,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            functions,
            timeout,
        }
    }

    pub async fn execute(&self, step: &Step, ctx: &mut ExecutionContext) -> StepResult {
        let parts = match self.resolve_request(step, ctx) {
            Ok(p) => p,
            Err(e) => return StepResult::errored(&step.id, e.into()),
        };

        tracing::debug!(step_id = %step.id, url = %parts.url, "executing step");
        let response = match self.http.send(parts, self.timeout).await {
            Ok(r) => r,
            Err(e) => return StepResult::errored(&step.id, e.into()),
        };

        let capture = StepCapture {
            status: response.status,
            headers: response.headers.clone(),
            body: response.body_json(),
            invocation: None,
        };

        // Record before touching the assertions so later steps, and
        // this step's own expected values, can reference the capture.
        ctx.record(&step.id, capture.status, capture.body.clone());

        let asserts = match self.resolve_asserts(step, ctx) {
            Ok(a) => a,
            Err(e) => {
                return StepResult {
                    step_id: step.id.clone(),
                    capture: Some(capture),
                    assertion_failures: Vec::new(),
                    execution_error: Some(e.into()),
                }
            }
        };
        let assertion_failures = evaluate_assertions(&asserts, &capture);

        StepResult {
            step_id: step.id.clone(),
            capture: Some(capture),
            assertion_failures,
            execution_error: None,
        }
    }

    fn resolve_request(
        &self,
        step: &Step,
        ctx: &ExecutionContext,
    ) -> Result<RequestParts, ResolutionError> {
        let resolver = Resolver::new(ctx, self.functions);

        let path = scalar_string(&resolver.resolve_string("path", &step.path)?);
        let host = ctx.get_global("host").and_then(|v| v.as_str().map(String::from));
        let url =
            build_url(host.as_deref(), &path).map_err(|k| k.at("path", step.path.as_str()))?;

        let headers = match &step.headers {
            Some(h) => Some(resolver.resolve_field("headers", h)?),
            None => None,
        };
        let data = match &step.data {
            Some(d) => Some(resolver.resolve_field("data", d)?),
            None => None,
        };
        let params = match &step.params {
            Some(p) => Some(resolver.resolve_field("params", p)?),
            None => None,
        };

        Ok(RequestParts {
            method: step.method.clone(),
            url,
            headers: headers_to_map(headers.as_ref()),
            data,
            params: params_to_pairs(params.as_ref()),
            files: step.files.clone(),
        })
    }

    /// Expected values resolve after the capture is recorded, so an
    /// assertion may reference the step's own response.
    fn resolve_asserts(
        &self,
        step: &Step,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Assertion>, ResolutionError> {
        let resolver = Resolver::new(ctx, self.functions);
        let mut asserts = Vec::with_capacity(step.asserts.len());
        for (i, a) in step.asserts.iter().enumerate() {
            let expected = match &a.expected {
                Some(e) => Some(resolver.resolve_field(&format!("asserts[{i}].expected"), e)?),
                None => None,
            };
            asserts.push(Assertion {
                kind: a.kind,
                field: a.field.clone(),
                expected,
            });
        }
        Ok(asserts)
    }
}
