mod assertion;
mod common;
mod config;
mod step;
mod teardown;
mod testcase;

pub use assertion::{Assertion, AssertionType};
pub use common::AnyValue;
pub use config::{DbConfig, LoginConfig, ProjectEnvConfig, RunConfig};
pub use step::Step;
pub use teardown::Teardown;
pub use testcase::TestCase;
