use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use scenic_core::types::{RunConfig, TestCase};
use serde_json::json;
use uuid::Uuid;

use crate::auth::{AuthKey, AuthManager};
use crate::context::ExecutionContext;
use crate::db::DatabaseClient;
use crate::events::{Event, EventSink};
use crate::functions::FunctionRegistry;
use crate::http::RequestClient;
use crate::step::{ExecutionError, StepExecutor, StepResult};
use crate::teardown::{TeardownExecutor, TeardownResult};

/// Lifecycle of one scenario run. Teardowns run from every terminal
/// execution state, including errored runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Passed,
    Failed,
    Errored,
    TornDown,
    Done,
}

pub fn transition_allowed(from: RunState, to: RunState) -> bool {
    matches!(
        (from, to),
        (RunState::Pending, RunState::Running)
            | (RunState::Running, RunState::Passed)
            | (RunState::Running, RunState::Failed)
            | (RunState::Running, RunState::Errored)
            | (RunState::Passed, RunState::TornDown)
            | (RunState::Failed, RunState::TornDown)
            | (RunState::Errored, RunState::TornDown)
            | (RunState::TornDown, RunState::Done)
    )
}

fn advance(state: &mut RunState, to: RunState) {
    debug_assert!(transition_allowed(*state, to), "bad transition");
    *state = to;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStatus {
    Passed,
    Failed,
    Errored,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Passed => "passed",
            CaseStatus::Failed => "failed",
            CaseStatus::Errored => "errored",
        }
    }
}

#[derive(Debug)]
pub struct TestCaseReport {
    pub run_id: Uuid,
    pub name: String,
    pub status: CaseStatus,
    pub steps: Vec<StepResult>,
    pub teardowns: Vec<TeardownResult>,
    pub message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Shared collaborators, cloned into every runner. All are `Arc`s so a
/// scheduler can fan out runs across tasks.
#[derive(Clone)]
pub struct RunnerDeps {
    pub config: Arc<RunConfig>,
    pub auth: Arc<AuthManager>,
    pub http: Arc<dyn RequestClient>,
    pub db: Option<Arc<dyn DatabaseClient>>,
    pub functions: Arc<FunctionRegistry>,
    pub events: Arc<dyn EventSink>,
}

pub struct TestCaseRunner {
    env: String,
    timeout: Duration,
    deps: RunnerDeps,
}

impl TestCaseRunner {
    pub fn new(env: impl Into<String>, timeout: Duration, deps: RunnerDeps) -> Self {
        Self {
            env: env.into(),
            timeout,
            deps,
        }
    }

    /// Drive one scenario start to finish. Never returns an error and
    /// never panics; every failure mode lands in the report.
    pub async fn run(&self, case: &TestCase) -> TestCaseReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = RunState::Pending;

        self.deps
            .events
            .emit(Event::CaseStarted {
                run_id,
                name: case.name.clone(),
            })
            .await;
        advance(&mut state, RunState::Running);

        let mut ctx = ExecutionContext::new();
        let login_error = self.seed_context(case, &mut ctx).await;

        let steps = match login_error {
            // Login failed: no step can execute, every step reports the
            // same auth error, but teardowns still run below.
            Some(err) => case
                .steps
                .iter()
                .map(|s| StepResult::errored(&s.id, ExecutionError::Auth(err.clone())))
                .collect(),
            None => self.run_steps(run_id, case, &mut ctx).await,
        };

        let any_errored = steps.iter().any(|s| s.execution_error.is_some());
        let any_failed = steps.iter().any(|s| !s.assertion_failures.is_empty());
        let status = if any_errored {
            CaseStatus::Errored
        } else if any_failed {
            CaseStatus::Failed
        } else {
            CaseStatus::Passed
        };
        advance(
            &mut state,
            match status {
                CaseStatus::Passed => RunState::Passed,
                CaseStatus::Failed => RunState::Failed,
                CaseStatus::Errored => RunState::Errored,
            },
        );

        let teardowns = self.run_teardowns(run_id, case, &mut ctx).await;
        advance(&mut state, RunState::TornDown);

        self.deps
            .events
            .emit(Event::CaseFinished {
                run_id,
                name: case.name.clone(),
                status,
            })
            .await;
        advance(&mut state, RunState::Done);

        TestCaseReport {
            run_id,
            name: case.name.clone(),
            status,
            steps,
            teardowns,
            message: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Seed host, project vars, and (when configured) the login token.
    /// Returns the auth error when login was required but failed.
    async fn seed_context(
        &self,
        case: &TestCase,
        ctx: &mut ExecutionContext,
    ) -> Option<crate::auth::AuthError> {
        let pe = self.deps.config.project_env(&case.project, &self.env);

        let host = case
            .host
            .clone()
            .or_else(|| pe.map(|pe| pe.host.clone()));
        if let Some(host) = host {
            ctx.set_global("host", json!(host));
        }

        if let Some(pe) = pe {
            for (k, v) in &pe.vars {
                ctx.update_global(&case.project, k, v.clone());
            }

            if pe.is_need_login && pe.login.is_some() {
                let key = AuthKey::new(case.project.clone(), self.env.clone());
                match self.deps.auth.get_token(&key).await {
                    Ok(token) => {
                        ctx.update_global(&case.project, "token", json!(token.expose()));
                    }
                    Err(e) => return Some(e),
                }
            }
        }
        None
    }

    async fn run_steps(
        &self,
        run_id: Uuid,
        case: &TestCase,
        ctx: &mut ExecutionContext,
    ) -> Vec<StepResult> {
        let executor = StepExecutor::new(
            self.deps.http.as_ref(),
            self.deps.functions.as_ref(),
            self.timeout,
        );
        let mut results = Vec::with_capacity(case.steps.len());
        for step in &case.steps {
            self.deps
                .events
                .emit(Event::StepStarted {
                    run_id,
                    step_id: step.id.clone(),
                })
                .await;

            let result = executor.execute(step, ctx).await;
            let event = match &result.execution_error {
                Some(e) => Event::StepErrored {
                    run_id,
                    step_id: step.id.clone(),
                    error: e.to_string(),
                },
                None => Event::StepFinished {
                    run_id,
                    step_id: step.id.clone(),
                    passed: result.passed(),
                },
            };
            self.deps.events.emit(event).await;
            results.push(result);
        }
        results
    }

    async fn run_teardowns(
        &self,
        run_id: Uuid,
        case: &TestCase,
        ctx: &mut ExecutionContext,
    ) -> Vec<TeardownResult> {
        let executor = TeardownExecutor::new(
            self.deps.http.as_ref(),
            self.deps.db.as_deref(),
            self.deps.functions.as_ref(),
            self.timeout,
        );
        let mut results = Vec::with_capacity(case.teardowns.len());
        for teardown in &case.teardowns {
            self.deps
                .events
                .emit(Event::TeardownStarted {
                    run_id,
                    teardown_id: teardown.id().to_string(),
                })
                .await;

            let result = executor.run_one(teardown, ctx).await;
            self.deps
                .events
                .emit(Event::TeardownFinished {
                    run_id,
                    teardown_id: result.id.clone(),
                    succeeded: result.succeeded(),
                })
                .await;
            results.push(result);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teardown_is_reachable_from_every_terminal_state() {
        for s in [RunState::Passed, RunState::Failed, RunState::Errored] {
            assert!(transition_allowed(s, RunState::TornDown));
        }
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!transition_allowed(RunState::Pending, RunState::Passed));
        assert!(!transition_allowed(RunState::Running, RunState::Done));
        assert!(!transition_allowed(RunState::Done, RunState::Running));
    }
}
