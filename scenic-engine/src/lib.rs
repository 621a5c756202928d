#![forbid(unsafe_code)]

//! Execution engine for scenic test cases.
//!
//! `scenic-core` owns the declarative model and the expression parser;
//! this crate evaluates expressions against run state, drives each
//! scenario's steps and teardowns, and coordinates the process-wide
//! auth token cache across concurrent runs.

pub mod assertions;
pub mod auth;
pub mod context;
pub mod db;
pub mod error;
pub mod events;
pub mod functions;
pub mod http;
mod request;
pub mod resolver;
pub mod runner;
pub mod scheduler;
pub mod step;
pub mod teardown;

pub use crate::assertions::{evaluate_assertions, AssertionFailure, Invocation, StepCapture};
pub use crate::auth::{AuthError, AuthKey, AuthManager, AuthToken, HttpLoginClient, LoginClient};
pub use crate::context::ExecutionContext;
pub use crate::db::{DatabaseClient, DbError, DbOutcome, MySqlClient};
pub use crate::error::{ResolutionError, ResolutionErrorKind};
pub use crate::events::{CompositeEventSink, Event, EventSink, NoOpEventSink, StdoutEventSink};
pub use crate::functions::{FunctionRegistry, ToolArgs};
pub use crate::http::{HttpError, ReqwestClient, RequestClient, RequestParts, ResponseParts};
pub use crate::resolver::Resolver;
pub use crate::runner::{CaseStatus, RunState, RunnerDeps, TestCaseReport, TestCaseRunner};
pub use crate::scheduler::{Scheduler, SchedulerConfig, ShutdownSignal};
pub use crate::step::{ExecutionError, StepExecutor, StepResult};
pub use crate::teardown::{TeardownError, TeardownExecutor, TeardownResult};
