#![forbid(unsafe_code)]

pub mod error;
pub mod expressions;
pub mod parser;
pub mod types;
pub mod validate;

pub use crate::error::{ParseError, ScenicError, ValidationError, Violation};
pub use crate::parser::{parse_config_str, parse_testcase_str, DocumentFormat};
pub use crate::types::TestCase;
pub use crate::validate::{validate_testcase, Validate};
