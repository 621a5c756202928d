use std::sync::LazyLock;

use regex::Regex;

use crate::types::AnyValue;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("valid regex"));

/// One parsed `{{ ... }}` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Global or step reference, e.g. `merchant.token`, `step1.data.items[1].id`.
    Path(PathExpr),
    /// Whitelisted function call, e.g. `tools.random_int(min=1, max=100)`.
    Call(CallExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathExpr {
    /// Set when the path carried an explicit `Global.`/`GLOBAL.` prefix
    /// (the prefix itself is consumed).
    pub global: bool,
    pub segments: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub module: String,
    pub name: String,
    pub args: Vec<CallArg>,
}

/// Named call argument. Values are scalar literals or nested path
/// references resolved before invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub name: String,
    pub value: ArgValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Literal(AnyValue),
    Path(PathExpr),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,
    #[error("unsupported expression format: {0}")]
    Unsupported(String),
    #[error("invalid identifier: {0}")]
    InvalidIdent(String),
    #[error("invalid array index in: {0}")]
    InvalidIndex(String),
    #[error("malformed function call: {0}")]
    MalformedCall(String),
    #[error("invalid call argument: {0}")]
    InvalidArgument(String),
    #[error("unclosed expression (missing '}}')")]
    Unclosed,
}

pub fn parse_expression(input: &str) -> Result<Expr, ExpressionError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ExpressionError::Empty);
    }
    if s.contains('(') {
        return parse_call(s).map(Expr::Call);
    }
    parse_path(s).map(Expr::Path)
}

fn parse_path(s: &str) -> Result<PathExpr, ExpressionError> {
    let (global, rest) = if let Some(r) = s.strip_prefix("Global.") {
        (true, r)
    } else if let Some(r) = s.strip_prefix("GLOBAL.") {
        (true, r)
    } else {
        (false, s)
    };

    let mut segments = Vec::new();
    for part in rest.split('.') {
        if part.is_empty() {
            return Err(ExpressionError::Unsupported(s.to_string()));
        }
        let (name, indexes) = split_indexes(part)?;
        if name.is_empty() || !IDENT_RE.is_match(name) {
            return Err(ExpressionError::InvalidIdent(name.to_string()));
        }
        segments.push(PathSegment::Key(name.to_string()));
        for idx in indexes {
            segments.push(PathSegment::Index(idx));
        }
    }

    // A bare word is not a reference; references always navigate into
    // a namespace or a captured step result.
    if !global && segments.len() < 2 {
        return Err(ExpressionError::Unsupported(s.to_string()));
    }
    if segments.is_empty() {
        return Err(ExpressionError::Empty);
    }

    Ok(PathExpr { global, segments })
}

/// Split `items[1][2]` into the field name and its trailing indexes.
fn split_indexes(part: &str) -> Result<(&str, Vec<usize>), ExpressionError> {
    let Some(pos) = part.find('[') else {
        return Ok((part, Vec::new()));
    };
    let name = &part[..pos];
    let mut indexes = Vec::new();
    let mut rest = &part[pos..];
    while let Some(r) = rest.strip_prefix('[') {
        let Some(end) = r.find(']') else {
            return Err(ExpressionError::InvalidIndex(part.to_string()));
        };
        let idx: usize = r[..end]
            .trim()
            .parse()
            .map_err(|_| ExpressionError::InvalidIndex(part.to_string()))?;
        indexes.push(idx);
        rest = &r[end + 1..];
    }
    if !rest.is_empty() {
        return Err(ExpressionError::InvalidIndex(part.to_string()));
    }
    Ok((name, indexes))
}

fn parse_call(s: &str) -> Result<CallExpr, ExpressionError> {
    let open = s.find('(').ok_or_else(|| ExpressionError::MalformedCall(s.to_string()))?;
    if !s.ends_with(')') {
        return Err(ExpressionError::MalformedCall(s.to_string()));
    }
    let head = &s[..open];
    let args_str = &s[open + 1..s.len() - 1];

    let (module, name) = head
        .split_once('.')
        .ok_or_else(|| ExpressionError::MalformedCall(s.to_string()))?;
    if !IDENT_RE.is_match(module) || !IDENT_RE.is_match(name) {
        return Err(ExpressionError::MalformedCall(s.to_string()));
    }

    let args = parse_args(args_str)?;
    Ok(CallExpr {
        module: module.to_string(),
        name: name.to_string(),
        args,
    })
}

fn parse_args(args_str: &str) -> Result<Vec<CallArg>, ExpressionError> {
    let mut args = Vec::new();
    for part in split_top_level(args_str) {
        let part = part.trim();
        if part.is_empty() {
            return Err(ExpressionError::InvalidArgument(args_str.to_string()));
        }
        let (name, value) = part
            .split_once('=')
            .ok_or_else(|| ExpressionError::InvalidArgument(part.to_string()))?;
        let name = name.trim();
        if !IDENT_RE.is_match(name) {
            return Err(ExpressionError::InvalidArgument(part.to_string()));
        }
        args.push(CallArg {
            name: name.to_string(),
            value: parse_arg_value(value)?,
        });
    }
    Ok(args)
}

/// Split on commas that are not inside a quoted string.
fn split_top_level(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    for ch in s.chars() {
        match quote {
            Some(q) => {
                buf.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    buf.push(ch);
                }
                ',' => parts.push(std::mem::take(&mut buf)),
                _ => buf.push(ch),
            },
        }
    }
    if !buf.trim().is_empty() {
        parts.push(buf);
    }
    parts
}

fn parse_arg_value(s: &str) -> Result<ArgValue, ExpressionError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ExpressionError::InvalidArgument(s.to_string()));
    }

    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        return Ok(ArgValue::Literal(AnyValue::String(
            s[1..s.len() - 1].to_string(),
        )));
    }
    if s == "true" {
        return Ok(ArgValue::Literal(AnyValue::Bool(true)));
    }
    if s == "false" {
        return Ok(ArgValue::Literal(AnyValue::Bool(false)));
    }
    if s == "null" || s == "None" {
        return Ok(ArgValue::Literal(AnyValue::Null));
    }
    if let Ok(n) = s.parse::<i64>() {
        return Ok(ArgValue::Literal(AnyValue::Number(n.into())));
    }
    if let Ok(f) = s.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(f) {
            return Ok(ArgValue::Literal(AnyValue::Number(num)));
        }
    }

    // Anything else must be a reference resolved at call time.
    parse_path(s)
        .map(ArgValue::Path)
        .map_err(|_| ExpressionError::InvalidArgument(s.to_string()))
}
