mod expr;
mod template;

pub use expr::{
    parse_expression, ArgValue, CallArg, CallExpr, Expr, ExpressionError, PathExpr, PathSegment,
};
pub use template::{parse_template, Segment, Template};

use crate::types::AnyValue;

/// Validate that every `{{ ... }}` expression embedded anywhere inside
/// a value is syntactically valid.
pub fn validate_value_expressions(value: &AnyValue) -> Result<(), ExpressionError> {
    match value {
        AnyValue::Null | AnyValue::Bool(_) | AnyValue::Number(_) => Ok(()),
        AnyValue::String(s) => parse_template(s).map(|_| ()),
        AnyValue::Array(arr) => {
            for v in arr {
                validate_value_expressions(v)?;
            }
            Ok(())
        }
        AnyValue::Object(map) => {
            for (_k, v) in map {
                validate_value_expressions(v)?;
            }
            Ok(())
        }
    }
}
