use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use scenic_core::types::Teardown;
use scenic_engine::{
    DatabaseClient, DbError, DbOutcome, ExecutionContext, FunctionRegistry, HttpError,
    RequestClient, RequestParts, ResponseParts, TeardownError, TeardownExecutor,
};
use serde_json::json;

struct OkHttp {
    seen: Mutex<Vec<RequestParts>>,
}

#[async_trait]
impl RequestClient for OkHttp {
    async fn send(&self, req: RequestParts, _timeout: Duration) -> Result<ResponseParts, HttpError> {
        let fail = req.url.contains("/broken");
        self.seen.lock().unwrap().push(req);
        if fail {
            return Err(HttpError::Timeout);
        }
        Ok(ResponseParts {
            status: 200,
            headers: Default::default(),
            body: br#"{"code":0}"#.to_vec(),
        })
    }
}

struct FakeDb {
    queries: Mutex<Vec<String>>,
}

#[async_trait]
impl DatabaseClient for FakeDb {
    async fn execute(&self, query: &str) -> Result<DbOutcome, DbError> {
        self.queries.lock().unwrap().push(query.to_string());
        if query.trim_start().to_ascii_lowercase().starts_with("select") {
            Ok(DbOutcome::Rows(vec![json!({"id": 1})]))
        } else {
            Ok(DbOutcome::Affected(2))
        }
    }
}

fn api(id: &str, path: &str) -> Teardown {
    Teardown::Api {
        id: id.to_string(),
        path: path.to_string(),
        method: "POST".to_string(),
        headers: None,
        data: None,
    }
}

fn ctx() -> ExecutionContext {
    let mut ctx = ExecutionContext::new();
    ctx.set_global("host", json!("https://pre.example.com"));
    ctx.record("create", 200, json!({"data": {"id": 42}}));
    ctx
}

#[tokio::test]
async fn every_entry_runs_even_when_one_fails() {
    let http = OkHttp {
        seen: Mutex::new(Vec::new()),
    };
    let funcs = FunctionRegistry::new();
    let exec = TeardownExecutor::new(&http, None, &funcs, Duration::from_secs(5));
    let mut ctx = ctx();

    let results = exec
        .run_all(
            &[
                api("t1", "/api/cleanup/a"),
                api("t2", "/broken"),
                api("t3", "/api/cleanup/c"),
            ],
            &mut ctx,
        )
        .await;

    assert_eq!(results.len(), 3);
    assert!(results[0].succeeded());
    assert!(matches!(results[1].error, Some(TeardownError::Transport(_))));
    assert!(results[2].succeeded());
    assert_eq!(http.seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn api_teardowns_resolve_expressions_against_captures() {
    let http = OkHttp {
        seen: Mutex::new(Vec::new()),
    };
    let funcs = FunctionRegistry::new();
    let exec = TeardownExecutor::new(&http, None, &funcs, Duration::from_secs(5));
    let mut ctx = ctx();

    let t = Teardown::Api {
        id: "cancel".to_string(),
        path: "/api/orders/{{ create.data.id }}/cancel".to_string(),
        method: "POST".to_string(),
        headers: None,
        data: None,
    };
    let result = exec.run_one(&t, &mut ctx).await;
    assert!(result.succeeded());
    let seen = http.seen.lock().unwrap();
    assert!(seen[0].url.ends_with("/api/orders/42/cancel"));
}

#[tokio::test]
async fn db_teardowns_resolve_and_execute_queries() {
    let http = OkHttp {
        seen: Mutex::new(Vec::new()),
    };
    let db = FakeDb {
        queries: Mutex::new(Vec::new()),
    };
    let funcs = FunctionRegistry::new();
    let exec = TeardownExecutor::new(&http, Some(&db), &funcs, Duration::from_secs(5));
    let mut ctx = ctx();

    let t = Teardown::Db {
        id: "purge".to_string(),
        query: "DELETE FROM orders WHERE id = {{ create.data.id }}".to_string(),
    };
    let result = exec.run_one(&t, &mut ctx).await;
    assert!(result.succeeded());
    assert_eq!(
        db.queries.lock().unwrap()[0],
        "DELETE FROM orders WHERE id = 42"
    );
}

#[tokio::test]
async fn db_teardown_without_a_client_reports_no_database() {
    let http = OkHttp {
        seen: Mutex::new(Vec::new()),
    };
    let funcs = FunctionRegistry::new();
    let exec = TeardownExecutor::new(&http, None, &funcs, Duration::from_secs(5));
    let mut ctx = ctx();

    let t = Teardown::Db {
        id: "purge".to_string(),
        query: "DELETE FROM orders".to_string(),
    };
    let result = exec.run_one(&t, &mut ctx).await;
    assert!(matches!(result.error, Some(TeardownError::NoDatabase)));
}

#[tokio::test]
async fn unresolvable_teardown_reports_resolution_error_and_sends_nothing() {
    let http = OkHttp {
        seen: Mutex::new(Vec::new()),
    };
    let funcs = FunctionRegistry::new();
    let exec = TeardownExecutor::new(&http, None, &funcs, Duration::from_secs(5));
    let mut ctx = ctx();

    let t = api("t1", "/api/{{ never_ran.data.id }}");
    let result = exec.run_one(&t, &mut ctx).await;
    assert!(matches!(result.error, Some(TeardownError::Resolution(_))));
    assert!(http.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn later_teardowns_can_reference_earlier_teardown_captures() {
    let http = OkHttp {
        seen: Mutex::new(Vec::new()),
    };
    let funcs = FunctionRegistry::new();
    let exec = TeardownExecutor::new(&http, None, &funcs, Duration::from_secs(5));
    let mut ctx = ctx();

    let results = exec
        .run_all(
            &[
                api("first", "/api/cleanup/a"),
                api("second", "/api/echo/{{ first.code }}"),
            ],
            &mut ctx,
        )
        .await;
    assert!(results.iter().all(|r| r.succeeded()));
    let seen = http.seen.lock().unwrap();
    assert!(seen[1].url.ends_with("/api/echo/0"));
}
