//! Shared helpers for turning resolved values into request parts.

use std::collections::BTreeMap;

use scenic_core::types::AnyValue;

use crate::error::ResolutionErrorKind;

/// String form used for interpolation, header values, and query params:
/// bare content for strings, JSON text for containers, empty for null.
pub(crate) fn scalar_string(v: &AnyValue) -> String {
    match v {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.clone(),
        AnyValue::Bool(b) => b.to_string(),
        AnyValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn headers_to_map(v: Option<&AnyValue>) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    if let Some(AnyValue::Object(map)) = v {
        for (k, val) in map {
            out.insert(k.clone(), scalar_string(val));
        }
    }
    out
}

pub(crate) fn params_to_pairs(v: Option<&AnyValue>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if let Some(AnyValue::Object(map)) = v {
        for (k, val) in map {
            out.push((k.clone(), scalar_string(val)));
        }
    }
    out
}

/// Join the run host and a step path into an absolute URL. Paths that
/// are already absolute URLs are used as-is.
pub(crate) fn build_url(host: Option<&str>, path: &str) -> Result<String, ResolutionErrorKind> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }
    let host = host.ok_or(ResolutionErrorKind::MissingHost)?;
    let base = url::Url::parse(host).map_err(|e| ResolutionErrorKind::InvalidUrl(e.to_string()))?;
    base.join(path)
        .map(|u| u.to_string())
        .map_err(|e| ResolutionErrorKind::InvalidUrl(e.to_string()))
}
