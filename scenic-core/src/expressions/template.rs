use super::expr::{parse_expression, Expr, ExpressionError};

/// A string split into literal runs and embedded `{{ ... }}` expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Literal(String),
    /// Parsed expression plus its raw inner text, kept for error
    /// attribution in resolution failures.
    Expr { expr: Expr, raw: String },
}

impl Template {
    /// A template that is exactly one whole expression with no
    /// surrounding literal text resolves to the expression's native
    /// type instead of being string-interpolated.
    pub fn as_single_expr(&self) -> Option<(&Expr, &str)> {
        match self.segments.as_slice() {
            [Segment::Expr { expr, raw }] => Some((expr, raw)),
            _ => None,
        }
    }

    pub fn has_expressions(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Expr { .. }))
    }
}

pub fn parse_template(input: &str) -> Result<Template, ExpressionError> {
    let mut segments = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("{{") {
        let (lit, after) = rest.split_at(start);
        if !lit.is_empty() {
            segments.push(Segment::Literal(lit.to_string()));
        }
        let after = &after[2..];
        let Some(end) = after.find("}}") else {
            return Err(ExpressionError::Unclosed);
        };
        let raw = after[..end].trim();
        let expr = parse_expression(raw)?;
        segments.push(Segment::Expr {
            expr,
            raw: raw.to_string(),
        });
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Template { segments })
}
