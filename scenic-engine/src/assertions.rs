use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scenic_core::types::{AnyValue, Assertion, AssertionType};
use serde_json::json;

use crate::request::scalar_string;

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z_]\w*)\[(\d+)\]|([A-Za-z_]\w*)").expect("valid regex")
});

/// Captured result of one step execution.
#[derive(Debug, Clone, Default)]
pub struct StepCapture {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: AnyValue,
    /// Mock invocation record, present only for function-level checks
    /// (raises / called_once / called_with).
    pub invocation: Option<Invocation>,
}

#[derive(Debug, Clone, Default)]
pub struct Invocation {
    pub calls: Vec<AnyValue>,
    pub exception: Option<String>,
}

/// One structured mismatch. Collected, never thrown.
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionFailure {
    pub kind: AssertionType,
    pub field: Option<String>,
    pub expected: Option<AnyValue>,
    pub actual: AnyValue,
}

/// Evaluate every assertion against the capture, collecting all
/// failures in one pass. This function never panics and never
/// short-circuits; a malformed field path becomes a failure entry with
/// actual `"not found"`.
pub fn evaluate_assertions(asserts: &[Assertion], capture: &StepCapture) -> Vec<AssertionFailure> {
    asserts.iter().filter_map(|a| check(a, capture)).collect()
}

fn check(a: &Assertion, cap: &StepCapture) -> Option<AssertionFailure> {
    match a.kind {
        AssertionType::StatusCode => {
            let actual = json!(cap.status);
            expect_eq(a, &actual)
        }
        AssertionType::Equals => match extract(a, cap) {
            Some(actual) => expect_eq(a, &actual),
            None => Some(not_found(a)),
        },
        AssertionType::NotEquals => match extract(a, cap) {
            Some(actual) => {
                let expected = a.expected.as_ref()?;
                if json_eq(&actual, expected) {
                    Some(fail(a, actual))
                } else {
                    None
                }
            }
            None => Some(not_found(a)),
        },
        AssertionType::Contains => {
            let expected = a.expected.as_ref()?;
            let haystack = match &a.field {
                Some(_) => match extract(a, cap) {
                    Some(v) => v,
                    None => return Some(not_found(a)),
                },
                None => cap.body.clone(),
            };
            if contains_value(&haystack, expected) {
                None
            } else {
                Some(fail(a, haystack))
            }
        }
        AssertionType::Regex => {
            let pattern = a.expected.as_ref().map(scalar_string)?;
            let actual = match extract(a, cap) {
                Some(v) => v,
                None => return Some(not_found(a)),
            };
            let text = scalar_string(&actual);
            match Regex::new(&pattern) {
                Ok(re) if re.is_match(&text) => None,
                Ok(_) => Some(fail(a, actual)),
                Err(e) => Some(fail(a, json!(format!("invalid pattern: {e}")))),
            }
        }
        AssertionType::Length => {
            let actual = match extract(a, cap) {
                Some(v) => v,
                None => return Some(not_found(a)),
            };
            let len = match &actual {
                AnyValue::Array(v) => Some(v.len()),
                AnyValue::Object(m) => Some(m.len()),
                AnyValue::String(s) => Some(s.chars().count()),
                _ => None,
            };
            match len {
                Some(len) => expect_eq(a, &json!(len)),
                None => Some(fail(a, json!("no length"))),
            }
        }
        AssertionType::Raises => {
            let exception = cap.invocation.as_ref().and_then(|i| i.exception.as_deref());
            match exception {
                Some(msg) => {
                    // Optional expected value narrows to a substring match.
                    if let Some(expected) = &a.expected {
                        if !msg.contains(&scalar_string(expected)) {
                            return Some(fail(a, json!(msg)));
                        }
                    }
                    None
                }
                None => Some(not_found(a)),
            }
        }
        AssertionType::IsNone => match extract(a, cap) {
            None | Some(AnyValue::Null) => None,
            Some(actual) => Some(fail(a, actual)),
        },
        AssertionType::IsNotNone => match extract(a, cap) {
            None | Some(AnyValue::Null) => Some(not_found(a)),
            Some(_) => None,
        },
        AssertionType::CalledOnce => {
            let count = cap.invocation.as_ref().map(|i| i.calls.len()).unwrap_or(0);
            if count == 1 {
                None
            } else {
                Some(fail(a, json!(count)))
            }
        }
        AssertionType::CalledWith => {
            let expected = a.expected.as_ref()?;
            match cap.invocation.as_ref().and_then(|i| i.calls.last()) {
                Some(last) if json_eq(last, expected) => None,
                Some(last) => Some(fail(a, last.clone())),
                None => Some(not_found(a)),
            }
        }
    }
}

/// Dotted-path extraction with array-index support, e.g.
/// `data.items[1].id`. Returns None when any hop is missing.
pub fn extract_field(body: &AnyValue, path: &str) -> Option<AnyValue> {
    let mut value = body;
    for caps in FIELD_RE.captures_iter(path) {
        if let (Some(field), Some(idx)) = (caps.get(1), caps.get(2)) {
            value = value.get(field.as_str())?;
            value = value.get(idx.as_str().parse::<usize>().ok()?)?;
        } else if let Some(simple) = caps.get(3) {
            value = value.get(simple.as_str())?;
        }
    }
    Some(value.clone())
}

fn extract(a: &Assertion, cap: &StepCapture) -> Option<AnyValue> {
    let path = a.field.as_deref()?;
    extract_field(&cap.body, path)
}

fn expect_eq(a: &Assertion, actual: &AnyValue) -> Option<AssertionFailure> {
    let expected = a.expected.as_ref()?;
    if json_eq(actual, expected) {
        None
    } else {
        Some(fail(a, actual.clone()))
    }
}

fn fail(a: &Assertion, actual: AnyValue) -> AssertionFailure {
    AssertionFailure {
        kind: a.kind,
        field: a.field.clone(),
        expected: a.expected.clone(),
        actual,
    }
}

fn not_found(a: &Assertion) -> AssertionFailure {
    fail(a, json!("not found"))
}

/// Substring on strings, membership on arrays, recursive containment on
/// objects, equality on other scalars.
fn contains_value(obj: &AnyValue, target: &AnyValue) -> bool {
    match obj {
        AnyValue::Object(map) => map.values().any(|v| contains_value(v, target)),
        AnyValue::Array(arr) => arr
            .iter()
            .any(|v| json_eq(v, target) || contains_value(v, target)),
        AnyValue::String(s) => s.contains(&scalar_string(target)),
        other => json_eq(other, target),
    }
}

/// Deep equality with int/float-tolerant number comparison.
pub(crate) fn json_eq(a: &AnyValue, b: &AnyValue) -> bool {
    match (a, b) {
        (AnyValue::Null, AnyValue::Null) => true,
        (AnyValue::Bool(a), AnyValue::Bool(b)) => a == b,
        (AnyValue::Number(a), AnyValue::Number(b)) => a.as_f64() == b.as_f64(),
        (AnyValue::String(a), AnyValue::String(b)) => a == b,
        (AnyValue::Array(a), AnyValue::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| json_eq(x, y))
        }
        (AnyValue::Object(a), AnyValue::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map(|bv| json_eq(v, bv)).unwrap_or(false))
        }
        _ => false,
    }
}
