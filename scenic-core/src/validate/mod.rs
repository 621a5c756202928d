use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ValidationError, Violation};
use crate::expressions::{parse_template, validate_value_expressions};
use crate::types::{AnyValue, Step, Teardown, TestCase};

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid regex"));

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for TestCase {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_testcase(self)
    }
}

pub fn validate_testcase(case: &TestCase) -> Result<(), ValidationError> {
    let mut v = Validator::new();
    v.validate_testcase(case);
    v.finish(&case.name)
}

struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn new() -> Self {
        Self {
            violations: Vec::new(),
        }
    }

    fn finish(self, subject: &str) -> Result<(), ValidationError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(subject, self.violations))
        }
    }

    fn push(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn validate_testcase(&mut self, case: &TestCase) {
        if case.name.trim().is_empty() {
            self.push("name", "must not be empty");
        }
        if case.project.trim().is_empty() {
            self.push("project", "must not be empty");
        }

        let mut seen = HashSet::new();
        for (i, step) in case.steps.iter().enumerate() {
            let path = format!("steps[{i}]");
            if !seen.insert(step.id.as_str()) {
                self.push(format!("{path}.id"), format!("duplicate step id: {}", step.id));
            }
            self.validate_step(&path, step);
        }

        let mut seen = HashSet::new();
        for (i, td) in case.teardowns.iter().enumerate() {
            let path = format!("teardowns[{i}]");
            if !seen.insert(td.id()) {
                self.push(
                    format!("{path}.id"),
                    format!("duplicate teardown id: {}", td.id()),
                );
            }
            self.validate_teardown(&path, td);
        }
    }

    fn validate_step(&mut self, path: &str, step: &Step) {
        if !ID_RE.is_match(&step.id) {
            self.push(format!("{path}.id"), "must match [A-Za-z0-9_-]+");
        }
        if step.method.trim().is_empty() {
            self.push(format!("{path}.method"), "must not be empty");
        }
        if step.path.trim().is_empty() {
            self.push(format!("{path}.path"), "must not be empty");
        }

        self.check_expr_string(&format!("{path}.path"), &step.path);
        self.check_expr_value(&format!("{path}.headers"), step.headers.as_ref());
        self.check_expr_value(&format!("{path}.data"), step.data.as_ref());
        self.check_expr_value(&format!("{path}.params"), step.params.as_ref());

        for (j, a) in step.asserts.iter().enumerate() {
            let apath = format!("{path}.asserts[{j}]");
            if a.kind.requires_field() && a.field.as_deref().unwrap_or("").trim().is_empty() {
                self.push(format!("{apath}.field"), "must not be empty for this type");
            }
            if a.kind.requires_expected() && a.expected.is_none() {
                self.push(format!("{apath}.expected"), "must be set for this type");
            }
            if let Some(expected) = &a.expected {
                self.check_expr_value(&format!("{apath}.expected"), Some(expected));
            }
        }
    }

    fn validate_teardown(&mut self, path: &str, td: &Teardown) {
        if !ID_RE.is_match(td.id()) {
            self.push(format!("{path}.id"), "must match [A-Za-z0-9_-]+");
        }
        match td {
            Teardown::Api {
                path: api_path,
                method,
                headers,
                data,
                ..
            } => {
                if method.trim().is_empty() {
                    self.push(format!("{path}.method"), "must not be empty");
                }
                self.check_expr_string(&format!("{path}.path"), api_path);
                self.check_expr_value(&format!("{path}.headers"), headers.as_ref());
                self.check_expr_value(&format!("{path}.data"), data.as_ref());
            }
            Teardown::Db { query, .. } => {
                if query.trim().is_empty() {
                    self.push(format!("{path}.query"), "must not be empty");
                }
                self.check_expr_string(&format!("{path}.query"), query);
            }
        }
    }

    fn check_expr_string(&mut self, path: &str, s: &str) {
        if let Err(e) = parse_template(s) {
            self.violations.push(Violation::expression(path, &e));
        }
    }

    fn check_expr_value(&mut self, path: &str, v: Option<&AnyValue>) {
        if let Some(v) = v {
            if let Err(e) = validate_value_expressions(v) {
                self.violations.push(Violation::expression(path, &e));
            }
        }
    }
}
