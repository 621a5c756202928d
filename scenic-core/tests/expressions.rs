use scenic_core::expressions::{
    parse_expression, parse_template, ArgValue, Expr, ExpressionError, PathSegment, Segment,
};
use serde_json::json;

#[test]
fn parses_step_reference_with_index() {
    let expr = parse_expression("step1.data.items[1].id").unwrap();
    let Expr::Path(p) = expr else {
        panic!("expected path")
    };
    assert!(!p.global);
    assert_eq!(
        p.segments,
        vec![
            PathSegment::Key("step1".into()),
            PathSegment::Key("data".into()),
            PathSegment::Key("items".into()),
            PathSegment::Index(1),
            PathSegment::Key("id".into()),
        ]
    );
}

#[test]
fn parses_explicit_global_prefix() {
    let expr = parse_expression("Global.merchant.token").unwrap();
    let Expr::Path(p) = expr else {
        panic!("expected path")
    };
    assert!(p.global);
    assert_eq!(p.segments.len(), 2);

    // Upper-case spelling is accepted too.
    let Expr::Path(p) = parse_expression("GLOBAL.merchant.token").unwrap() else {
        panic!("expected path")
    };
    assert!(p.global);
}

#[test]
fn bare_word_is_not_an_expression() {
    assert!(matches!(
        parse_expression("token"),
        Err(ExpressionError::Unsupported(_))
    ));
}

#[test]
fn parses_function_call_with_mixed_args() {
    let expr = parse_expression(r#"tools.demo_func(a=3, b="x,y", c=step1.data.id)"#).unwrap();
    let Expr::Call(c) = expr else {
        panic!("expected call")
    };
    assert_eq!(c.module, "tools");
    assert_eq!(c.name, "demo_func");
    assert_eq!(c.args.len(), 3);
    assert_eq!(c.args[0].value, ArgValue::Literal(json!(3)));
    assert_eq!(c.args[1].value, ArgValue::Literal(json!("x,y")));
    assert!(matches!(c.args[2].value, ArgValue::Path(_)));
}

#[test]
fn parses_call_without_args() {
    let expr = parse_expression("tools.timestamp()").unwrap();
    let Expr::Call(c) = expr else {
        panic!("expected call")
    };
    assert!(c.args.is_empty());
}

#[test]
fn rejects_malformed_calls() {
    assert!(matches!(
        parse_expression("demo_func(a=1)"),
        Err(ExpressionError::MalformedCall(_))
    ));
    assert!(matches!(
        parse_expression("tools.demo_func(a=1"),
        Err(ExpressionError::MalformedCall(_))
    ));
}

#[test]
fn template_splits_literals_and_expressions() {
    let t = parse_template("/goods/detail/{{ tools.demo_get_id() }}/x").unwrap();
    assert_eq!(t.segments.len(), 3);
    assert!(matches!(&t.segments[0], Segment::Literal(s) if s == "/goods/detail/"));
    assert!(matches!(&t.segments[1], Segment::Expr { .. }));
    assert!(matches!(&t.segments[2], Segment::Literal(s) if s == "/x"));
}

#[test]
fn template_keeps_raw_text_for_attribution() {
    let t = parse_template("{{step1.data.orderNo}}").unwrap();
    let (_, raw) = t.as_single_expr().unwrap();
    assert_eq!(raw, "step1.data.orderNo");
}

#[test]
fn whitespace_inside_braces_is_ignored() {
    let a = parse_template("{{ s1.data.id }}").unwrap();
    let b = parse_template("{{s1.data.id}}").unwrap();
    assert_eq!(a.as_single_expr().unwrap().1, b.as_single_expr().unwrap().1);
}
