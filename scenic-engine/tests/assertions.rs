use scenic_core::types::{Assertion, AssertionType};
use scenic_engine::{evaluate_assertions, Invocation, StepCapture};
use serde_json::json;

fn capture() -> StepCapture {
    StepCapture {
        status: 201,
        headers: Default::default(),
        body: json!({
            "code": 0,
            "message": "created",
            "data": {
                "id": 42,
                "name": "widget",
                "tags": ["a", "b", "c"],
                "deleted_at": null
            }
        }),
        invocation: None,
    }
}

fn assertion(kind: AssertionType, field: Option<&str>, expected: Option<serde_json::Value>) -> Assertion {
    Assertion {
        kind,
        field: field.map(String::from),
        expected,
    }
}

#[test]
fn passing_assertions_produce_no_failures() {
    let asserts = vec![
        assertion(AssertionType::StatusCode, None, Some(json!(201))),
        assertion(AssertionType::Equals, Some("data.id"), Some(json!(42))),
        assertion(AssertionType::NotEquals, Some("data.name"), Some(json!("gadget"))),
        assertion(AssertionType::Contains, Some("data.tags"), Some(json!("b"))),
        assertion(AssertionType::Regex, Some("message"), Some(json!("^cre"))),
        assertion(AssertionType::Length, Some("data.tags"), Some(json!(3))),
        assertion(AssertionType::IsNone, Some("data.deleted_at"), None),
        assertion(AssertionType::IsNotNone, Some("data.id"), None),
    ];
    assert!(evaluate_assertions(&asserts, &capture()).is_empty());
}

#[test]
fn all_failures_are_collected_not_just_the_first() {
    let asserts = vec![
        assertion(AssertionType::StatusCode, None, Some(json!(200))),
        assertion(AssertionType::Equals, Some("data.id"), Some(json!(7))),
        assertion(AssertionType::IsNotNone, Some("data.deleted_at"), None),
    ];
    let failures = evaluate_assertions(&asserts, &capture());
    assert_eq!(failures.len(), 3);
    assert_eq!(failures[0].actual, json!(201));
    assert_eq!(failures[1].actual, json!(42));
}

#[test]
fn integer_and_float_forms_of_a_number_compare_equal() {
    let asserts = vec![assertion(
        AssertionType::Equals,
        Some("data.id"),
        Some(json!(42.0)),
    )];
    assert!(evaluate_assertions(&asserts, &capture()).is_empty());
}

#[test]
fn missing_field_paths_fail_with_not_found() {
    let asserts = vec![assertion(
        AssertionType::Equals,
        Some("data.nope.deep"),
        Some(json!(1)),
    )];
    let failures = evaluate_assertions(&asserts, &capture());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].actual, json!("not found"));
}

#[test]
fn indexed_paths_reach_into_arrays() {
    let asserts = vec![assertion(
        AssertionType::Equals,
        Some("data.tags[1]"),
        Some(json!("b")),
    )];
    assert!(evaluate_assertions(&asserts, &capture()).is_empty());
}

#[test]
fn contains_searches_object_values_when_field_is_omitted() {
    let asserts = vec![assertion(
        AssertionType::Contains,
        None,
        Some(json!("created")),
    )];
    assert!(evaluate_assertions(&asserts, &capture()).is_empty());
}

#[test]
fn contains_on_strings_is_a_substring_check() {
    let asserts = vec![assertion(
        AssertionType::Contains,
        Some("message"),
        Some(json!("eat")),
    )];
    assert!(evaluate_assertions(&asserts, &capture()).is_empty());
}

#[test]
fn invalid_regex_patterns_fail_instead_of_panicking() {
    let asserts = vec![assertion(
        AssertionType::Regex,
        Some("message"),
        Some(json!("([unclosed")),
    )];
    let failures = evaluate_assertions(&asserts, &capture());
    assert_eq!(failures.len(), 1);
}

#[test]
fn length_applies_to_strings_too() {
    let asserts = vec![assertion(
        AssertionType::Length,
        Some("data.name"),
        Some(json!(6)),
    )];
    assert!(evaluate_assertions(&asserts, &capture()).is_empty());
}

#[test]
fn invocation_checks_inspect_the_recorded_calls() {
    let mut cap = capture();
    cap.invocation = Some(Invocation {
        calls: vec![json!({"to": "a@test.com"})],
        exception: None,
    });

    let pass = vec![
        assertion(AssertionType::CalledOnce, None, None),
        assertion(
            AssertionType::CalledWith,
            None,
            Some(json!({"to": "a@test.com"})),
        ),
    ];
    assert!(evaluate_assertions(&pass, &cap).is_empty());

    let fail = vec![assertion(
        AssertionType::CalledWith,
        None,
        Some(json!({"to": "b@test.com"})),
    )];
    assert_eq!(evaluate_assertions(&fail, &cap).len(), 1);
}

#[test]
fn raises_checks_the_recorded_exception() {
    let mut cap = capture();
    cap.invocation = Some(Invocation {
        calls: vec![],
        exception: Some("quota exceeded".to_string()),
    });

    let pass = vec![
        assertion(AssertionType::Raises, None, None),
        assertion(AssertionType::Raises, None, Some(json!("quota"))),
    ];
    assert!(evaluate_assertions(&pass, &cap).is_empty());

    let wrong_message = vec![assertion(AssertionType::Raises, None, Some(json!("disk")))];
    assert_eq!(evaluate_assertions(&wrong_message, &cap).len(), 1);

    let no_exception = vec![assertion(AssertionType::Raises, None, None)];
    assert_eq!(evaluate_assertions(&no_exception, &capture()).len(), 1);
}

#[test]
fn called_once_with_zero_calls_reports_the_count() {
    let asserts = vec![assertion(AssertionType::CalledOnce, None, None)];
    let failures = evaluate_assertions(&asserts, &capture());
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].actual, json!(0));
}
