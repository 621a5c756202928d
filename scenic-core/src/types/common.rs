/// Arbitrary nested data carried through step definitions and captures.
///
/// Step `data`/`params`/`headers` and captured response bodies are all
/// free-form trees; strings anywhere inside them may embed `{{ ... }}`
/// expressions.
pub type AnyValue = serde_json::Value;
