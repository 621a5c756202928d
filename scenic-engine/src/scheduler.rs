use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use scenic_core::types::TestCase;
use tokio::sync::{watch, Semaphore};
use uuid::Uuid;

use crate::runner::{CaseStatus, TestCaseReport, TestCaseRunner};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrent_cases: usize,
    /// Per-request timeout, handed to the runner this scheduler wraps.
    pub request_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_cases: 4,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Flip the flag to stop admitting new cases. Cases already running
/// finish normally, teardowns included.
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Fans scenarios out over tokio tasks under a global concurrency cap.
pub struct Scheduler {
    runner: Arc<TestCaseRunner>,
    limit: Arc<Semaphore>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(runner: Arc<TestCaseRunner>, config: &SchedulerConfig) -> (Self, ShutdownSignal) {
        let (tx, shutdown_rx) = watch::channel(false);
        (
            Self {
                runner,
                limit: Arc::new(Semaphore::new(config.max_concurrent_cases)),
                shutdown_rx,
            },
            ShutdownSignal { tx },
        )
    }

    /// Run every case, returning reports in input order.
    pub async fn run_all(&self, cases: Vec<TestCase>) -> Vec<TestCaseReport> {
        let mut handles = Vec::with_capacity(cases.len());
        let names: Vec<String> = cases.iter().map(|c| c.name.clone()).collect();

        for case in cases {
            let runner = self.runner.clone();
            let limit = self.limit.clone();
            let shutdown = self.shutdown_rx.clone();
            handles.push(tokio::spawn(async move {
                // Acquire fails only if the semaphore is closed, which
                // we never do.
                let _permit = limit.acquire_owned().await.unwrap_or_else(|_| {
                    panic!("scheduler semaphore closed unexpectedly. This is a bug - please report it.");
                });
                if *shutdown.borrow() {
                    return skipped_report(&case.name);
                }
                runner.run(&case).await
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(names)
            .map(|(r, name)| r.unwrap_or_else(|e| panicked_report(&name, e)))
            .collect()
    }
}

fn skipped_report(name: &str) -> TestCaseReport {
    let now = Utc::now();
    TestCaseReport {
        run_id: Uuid::new_v4(),
        name: name.to_string(),
        status: CaseStatus::Errored,
        steps: Vec::new(),
        teardowns: Vec::new(),
        message: Some("skipped: shutdown requested".to_string()),
        started_at: now,
        finished_at: now,
    }
}

fn panicked_report(name: &str, e: tokio::task::JoinError) -> TestCaseReport {
    let now = Utc::now();
    TestCaseReport {
        run_id: Uuid::new_v4(),
        name: name.to_string(),
        status: CaseStatus::Errored,
        steps: Vec::new(),
        teardowns: Vec::new(),
        message: Some(format!("case task failed: {e}")),
        started_at: now,
        finished_at: now,
    }
}
