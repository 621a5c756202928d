use scenic_engine::{
    ExecutionContext, FunctionRegistry, ResolutionErrorKind, Resolver,
};
use serde_json::json;

fn ctx_with_step() -> ExecutionContext {
    let mut ctx = ExecutionContext::new();
    ctx.record("s1", 200, json!({"data": {"id": 7, "items": ["a", "b"]}}));
    ctx.update_global("merchant", "token", json!("tok-123"));
    ctx
}

#[test]
fn whole_expression_keeps_native_type() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let v = r.resolve_string("data.id", "{{ s1.data.id }}").unwrap();
    assert_eq!(v, json!(7));
}

#[test]
fn mixed_text_interpolates_as_string() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let v = r.resolve_string("path", "id-{{ s1.data.id }}").unwrap();
    assert_eq!(v, json!("id-7"));
}

#[test]
fn status_code_is_reachable_through_the_capture() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let v = r.resolve_string("x", "{{ s1._status_code }}").unwrap();
    assert_eq!(v, json!(200));
}

#[test]
fn index_navigation_works() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let v = r.resolve_string("x", "{{ s1.data.items[1] }}").unwrap();
    assert_eq!(v, json!("b"));
}

#[test]
fn global_prefix_bypasses_step_shadowing() {
    let mut ctx = ctx_with_step();
    // A step capture named like the global namespace shadows it.
    ctx.record("merchant", 200, json!({"token": "from-step"}));
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);

    let shadowed = r.resolve_string("x", "{{ merchant.token }}").unwrap();
    assert_eq!(shadowed, json!("from-step"));

    let global = r.resolve_string("x", "{{ Global.merchant.token }}").unwrap();
    assert_eq!(global, json!("tok-123"));
}

#[test]
fn unexecuted_reference_is_an_error_not_a_panic() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let err = r
        .resolve_string("headers.X-Id", "{{ later_step.data.id }}")
        .unwrap_err();
    assert_eq!(err.field, "headers.X-Id");
    assert_eq!(
        err.kind,
        ResolutionErrorKind::UnknownRoot("later_step".to_string())
    );
}

#[test]
fn missing_segment_names_the_segment() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let err = r.resolve_string("x", "{{ s1.data.nope }}").unwrap_err();
    assert_eq!(
        err.kind,
        ResolutionErrorKind::MissingSegment("nope".to_string())
    );
}

#[test]
fn builtin_function_calls_resolve() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::with_builtins();
    let r = Resolver::new(&ctx, &funcs);
    let v = r
        .resolve_string("data.code", "{{ tools.random_int(min=5, max=5) }}")
        .unwrap();
    assert_eq!(v, json!(5));
}

#[test]
fn unknown_function_is_reported_by_qualified_name() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::with_builtins();
    let r = Resolver::new(&ctx, &funcs);
    let err = r.resolve_string("x", "{{ tools.bogus() }}").unwrap_err();
    assert_eq!(
        err.kind,
        ResolutionErrorKind::UnknownFunction("tools.bogus".to_string())
    );
}

#[test]
fn call_arguments_may_reference_captures() {
    let mut ctx = ctx_with_step();
    ctx.update_global("merchant", "count", json!(3));
    let mut funcs = FunctionRegistry::new();
    funcs.register("tools", "double", |args| {
        let n = args.i64_named(&["n"], 0)?;
        Ok(json!(n * 2))
    });
    let r = Resolver::new(&ctx, &funcs);
    let v = r
        .resolve_string("x", "{{ tools.double(n=merchant.count) }}")
        .unwrap();
    assert_eq!(v, json!(6));
}

#[test]
fn resolution_preserves_container_shape_and_key_order() {
    let ctx = ctx_with_step();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let input = json!({
        "zebra": "{{ s1.data.id }}",
        "alpha": ["x", "{{ s1.data.items[0] }}"],
        "nested": {"id": "{{ s1.data.id }}"}
    });
    let out = r.resolve_field("data", &input).unwrap();
    assert_eq!(
        out,
        json!({
            "zebra": 7,
            "alpha": ["x", "a"],
            "nested": {"id": 7}
        })
    );
    // serde_json with preserve_order keeps insertion order, so the
    // first key must still be "zebra".
    let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
    assert_eq!(keys[0], "zebra");
}

#[test]
fn plain_strings_pass_through_untouched() {
    let ctx = ExecutionContext::new();
    let funcs = FunctionRegistry::new();
    let r = Resolver::new(&ctx, &funcs);
    let v = r.resolve_string("path", "/api/orders").unwrap();
    assert_eq!(v, json!("/api/orders"));
}
