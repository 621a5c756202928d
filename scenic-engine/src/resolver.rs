use std::collections::HashMap;

use scenic_core::expressions::{
    parse_template, ArgValue, CallExpr, Expr, PathExpr, PathSegment, Segment,
};
use scenic_core::types::AnyValue;

use crate::context::ExecutionContext;
use crate::error::{ResolutionError, ResolutionErrorKind};
use crate::functions::{FunctionRegistry, ToolArgs};
use crate::request::scalar_string;

/// Evaluates `{{ ... }}` expressions against run-scoped state.
///
/// Borrowed per resolution pass; the context itself stays mutable in
/// the executor between passes.
pub struct Resolver<'a> {
    context: &'a ExecutionContext,
    functions: &'a FunctionRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(context: &'a ExecutionContext, functions: &'a FunctionRegistry) -> Self {
        Self { context, functions }
    }

    /// Resolve every expression embedded in `value`, preserving container
    /// shape and key order. `field` names where the value came from
    /// (e.g. `headers.Authorization`) for error attribution.
    pub fn resolve_field(&self, field: &str, value: &AnyValue) -> Result<AnyValue, ResolutionError> {
        match value {
            AnyValue::Null | AnyValue::Bool(_) | AnyValue::Number(_) => Ok(value.clone()),
            AnyValue::String(s) => self.resolve_string(field, s),
            AnyValue::Array(arr) => {
                let mut out = Vec::with_capacity(arr.len());
                for (i, v) in arr.iter().enumerate() {
                    out.push(self.resolve_field(&format!("{field}[{i}]"), v)?);
                }
                Ok(AnyValue::Array(out))
            }
            AnyValue::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_field(&format!("{field}.{k}"), v)?);
                }
                Ok(AnyValue::Object(out))
            }
        }
    }

    /// Resolve a single string. Exactly one whole expression keeps the
    /// resolved value's native type; anything mixed with literal text is
    /// string-interpolated.
    pub fn resolve_string(&self, field: &str, s: &str) -> Result<AnyValue, ResolutionError> {
        if !s.contains("{{") {
            return Ok(AnyValue::String(s.to_string()));
        }
        let tpl = parse_template(s).map_err(|e| ResolutionErrorKind::from(e).at(field, s))?;

        if let Some((expr, raw)) = tpl.as_single_expr() {
            return self.eval(expr).map_err(|k| k.at(field, raw));
        }

        let mut out = String::new();
        for seg in &tpl.segments {
            match seg {
                Segment::Literal(l) => out.push_str(l),
                Segment::Expr { expr, raw } => {
                    let v = self.eval(expr).map_err(|k| k.at(field, raw.as_str()))?;
                    out.push_str(&scalar_string(&v));
                }
            }
        }
        Ok(AnyValue::String(out))
    }

    fn eval(&self, expr: &Expr) -> Result<AnyValue, ResolutionErrorKind> {
        match expr {
            Expr::Path(p) => self.eval_path(p),
            Expr::Call(c) => self.eval_call(c),
        }
    }

    fn eval_path(&self, p: &PathExpr) -> Result<AnyValue, ResolutionErrorKind> {
        let mut segments = p.segments.iter();
        let root = match segments.next() {
            Some(PathSegment::Key(k)) => k,
            _ => return Err(ResolutionErrorKind::UnknownRoot(String::new())),
        };

        // Step captures shadow globals unless the `Global.` prefix was
        // used; an id that is neither is an unknown root.
        let mut cur = if p.global {
            self.context
                .get_global(root)
                .ok_or_else(|| ResolutionErrorKind::UnknownRoot(root.clone()))?
        } else if self.context.has_step(root) {
            self.context.get_step(root)?
        } else if let Some(v) = self.context.get_global(root) {
            v
        } else {
            return Err(ResolutionErrorKind::UnknownRoot(root.clone()));
        };

        for seg in segments {
            cur = match seg {
                PathSegment::Key(k) => cur
                    .get(k.as_str())
                    .ok_or_else(|| ResolutionErrorKind::MissingSegment(k.clone()))?,
                PathSegment::Index(i) => cur
                    .get(*i)
                    .ok_or(ResolutionErrorKind::IndexOutOfBounds(*i))?,
            };
        }
        Ok(cur.clone())
    }

    fn eval_call(&self, c: &CallExpr) -> Result<AnyValue, ResolutionErrorKind> {
        let qualified = format!("{}.{}", c.module, c.name);
        let f = self
            .functions
            .get(&c.module, &c.name)
            .ok_or_else(|| ResolutionErrorKind::UnknownFunction(qualified.clone()))?;

        // Arguments are themselves resolved before invocation.
        let mut args = HashMap::with_capacity(c.args.len());
        for arg in &c.args {
            let v = match &arg.value {
                ArgValue::Literal(v) => v.clone(),
                ArgValue::Path(p) => self.eval_path(p)?,
            };
            args.insert(arg.name.clone(), v);
        }

        f(&ToolArgs::new(args)).map_err(|msg| ResolutionErrorKind::Function(qualified, msg))
    }
}
