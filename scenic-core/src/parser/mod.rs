use crate::error::ParseError;
use crate::types::{RunConfig, TestCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
    Auto,
}

pub fn parse_testcase_str(input: &str, format: DocumentFormat) -> Result<TestCase, ParseError> {
    parse_str(input, format)
}

pub fn parse_config_str(input: &str, format: DocumentFormat) -> Result<RunConfig, ParseError> {
    parse_str(input, format)
}

fn parse_str<T: serde::de::DeserializeOwned>(
    input: &str,
    format: DocumentFormat,
) -> Result<T, ParseError> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_str(input)?),
        DocumentFormat::Yaml => Ok(serde_yaml::from_str(input)?),
        DocumentFormat::Auto => parse_auto(input),
    }
}

fn parse_auto<T: serde::de::DeserializeOwned>(input: &str) -> Result<T, ParseError> {
    // Heuristic: JSON always starts with `{` or `[` after trimming.
    let trimmed = input.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        match serde_json::from_str(input) {
            Ok(v) => Ok(v),
            Err(e) => match serde_yaml::from_str(input) {
                Ok(v) => Ok(v),
                // Report the JSON error since we tried JSON first.
                Err(_) => Err(ParseError::Json(e)),
            },
        }
    } else {
        match serde_yaml::from_str(input) {
            Ok(v) => Ok(v),
            Err(e) => match serde_json::from_str(input) {
                Ok(v) => Ok(v),
                Err(_) => Err(ParseError::Yaml(e)),
            },
        }
    }
}
