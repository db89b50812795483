//! End-to-end dispatcher tests with in-process operations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use netfan::config::{Credentials, ProbeTarget, RunConfig};
use netfan::coordinator::{RunCoordinator, RunState};
use netfan::dispatch::{Queued, ResultSink, TaskQueue, WorkerPool};
use netfan::error::{Error, OperationError, PreflightError};
use netfan::preflight::{NoPreflight, Preflight};
use rand::Rng;
use tokio_util::sync::CancellationToken;

fn creds() -> Arc<Credentials> {
    Arc::new(Credentials::password("admin", "pw"))
}

fn config(pool_size: usize) -> RunConfig {
    RunConfig::builder().pool_size(pool_size).build().unwrap()
}

fn targets(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("sw{i:04}")).collect()
}

struct RejectingPreflight;

impl Preflight for RejectingPreflight {
    async fn validate(
        &self,
        credentials: &Arc<Credentials>,
        _probe: &ProbeTarget,
    ) -> Result<(), PreflightError> {
        Err(PreflightError::Auth {
            user: credentials.username().to_string(),
        })
    }
}

#[tokio::test]
async fn every_item_yields_one_outcome() {
    let op = |host: String| async move {
        let n: usize = host[2..].parse().unwrap();
        if n % 3 == 0 {
            Err(OperationError::failed("busy"))
        } else {
            Ok(())
        }
    };
    let mut coordinator = RunCoordinator::new(config(7), creds(), NoPreflight, op);

    let report = coordinator.run(targets(250)).await.unwrap();
    assert_eq!(report.success_count + report.failure_count, 250);
    assert_eq!(report.failure_count, 84);
}

#[tokio::test]
async fn always_succeed_has_no_failures_for_any_pool_size() {
    for pool_size in [1, 10, 100] {
        let op = |_host: String| async { Ok::<_, OperationError>(()) };
        let mut coordinator = RunCoordinator::new(config(pool_size), creds(), NoPreflight, op);

        let report = coordinator.run(targets(120)).await.unwrap();
        assert_eq!(report.failure_count, 0, "pool size {pool_size}");
        assert_eq!(report.success_count, 120);
        assert!(report.is_success());
    }
}

#[tokio::test]
async fn always_fail_reports_each_target_once() {
    let op = |host: String| async move { Err::<(), _>(OperationError::failed(format!("{host} unreachable"))) };
    let mut coordinator = RunCoordinator::new(config(10), creds(), NoPreflight, op);

    let items = targets(50);
    let report = coordinator.run(items.clone()).await.unwrap();

    assert_eq!(report.success_count, 0);
    let reported: Vec<&str> = report.failures.iter().map(|f| f.target.as_str()).collect();
    assert_eq!(reported, items.iter().map(String::as_str).collect::<Vec<_>>());
    for failure in &report.failures {
        assert_eq!(failure.error.to_string(), format!("{} unreachable", failure.target));
    }
}

#[tokio::test]
async fn preflight_rejection_prevents_any_operation_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let op = {
        let calls = calls.clone();
        move |_host: String| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, OperationError>(())
            }
        }
    };
    let mut coordinator = RunCoordinator::new(config(10), creds(), RejectingPreflight, op);

    let err = coordinator.run(targets(20)).await.unwrap_err();
    assert!(matches!(err, Error::Preflight(PreflightError::Auth { ref user }) if user == "admin"));
    assert_eq!(coordinator.state(), RunState::Aborted);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn skip_preflight_bypasses_probe() {
    let op = |_host: String| async { Ok::<_, OperationError>(()) };
    let config = RunConfig::builder().skip_preflight(true).build().unwrap();
    let mut coordinator = RunCoordinator::new(config, creds(), RejectingPreflight, op);

    let report = coordinator.run(targets(3)).await.unwrap();
    assert_eq!(report.success_count, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn drain_waits_for_last_item() {
    let mut rng = rand::thread_rng();
    let delays: HashMap<String, u64> = targets(1000)
        .into_iter()
        .map(|t| (t, rng.gen_range(0..5)))
        .collect();
    let delays = Arc::new(delays);
    let finished = Arc::new(AtomicUsize::new(0));

    let op = {
        let delays = delays.clone();
        let finished = finished.clone();
        move |host: String| {
            let delay = delays[&host];
            let finished = finished.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.fetch_add(1, Ordering::SeqCst);
                Ok::<_, OperationError>(())
            }
        }
    };

    let queue: Arc<TaskQueue<Queued<String>>> = Arc::new(TaskQueue::new());
    let sink = ResultSink::new();
    let pool = WorkerPool::start(
        100,
        queue.clone(),
        Arc::new(op),
        sink.clone(),
        Duration::from_secs(10),
        CancellationToken::new(),
    );
    for (seq, item) in targets(1000).into_iter().enumerate() {
        queue.enqueue(Queued { seq, item }).unwrap();
    }

    queue.await_drain().await;

    // Shutdown joins the workers, so these must hold before it.
    assert_eq!(finished.load(Ordering::SeqCst), 1000);
    assert_eq!(queue.pending(), 0);
    assert_eq!(queue.in_flight(), 0);
    assert_eq!(sink.len(), 1000);

    pool.shutdown().await;
}

#[tokio::test]
async fn repeated_runs_do_not_interfere() {
    let op = |_host: String| async { Ok::<_, OperationError>(()) };
    let mut coordinator = RunCoordinator::new(config(5), creds(), NoPreflight, op);

    let first = coordinator.run(targets(40)).await.unwrap();
    let second = coordinator.run(targets(40)).await.unwrap();
    assert_eq!(first.success_count, 40);
    assert_eq!(second.success_count, 40);
    assert_eq!(second.processed(), 40);
}

#[tokio::test]
async fn one_rejected_target_scenario() {
    let op = |host: String| async move {
        if host == "b" {
            Err(OperationError::failed("config rejected"))
        } else {
            Ok(())
        }
    };
    let mut coordinator = RunCoordinator::new(config(3), creds(), NoPreflight, op);

    let report = coordinator.run(["a", "b", "c"].map(String::from)).await.unwrap();
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failure_count, 1);
    let failures: Vec<(String, String)> = report
        .failures
        .iter()
        .map(|f| (f.target.clone(), f.error.to_string()))
        .collect();
    assert_eq!(failures, vec![("b".to_string(), "config rejected".to_string())]);
    assert_eq!(coordinator.state(), RunState::Reported);
}

#[tokio::test]
async fn slow_item_times_out_without_stalling_others() {
    let op = |host: String| async move {
        if host == "stuck" {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok::<_, OperationError>(())
    };
    let config = RunConfig::builder()
        .pool_size(2)
        .operation_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let mut coordinator = RunCoordinator::new(config, creds(), NoPreflight, op);

    let items = ["stuck", "a", "b", "c"].map(String::from);
    let report = coordinator.run(items).await.unwrap();
    assert_eq!(report.success_count, 3);
    assert_eq!(report.failures[0].target, "stuck");
    assert_eq!(
        report.failures[0].error,
        OperationError::Timeout(Duration::from_millis(50))
    );
}

#[tokio::test]
async fn cancellation_reports_unstarted_items() {
    let token = CancellationToken::new();
    let started = Arc::new(Mutex::new(Vec::new()));

    let op = {
        let token = token.clone();
        let started = started.clone();
        move |host: String| {
            let token = token.clone();
            let started = started.clone();
            async move {
                started.lock().unwrap().push(host.clone());
                if host == "sw0001" {
                    token.cancel();
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok::<_, OperationError>(())
            }
        }
    };
    let mut coordinator =
        RunCoordinator::new(config(1), creds(), NoPreflight, op).with_shutdown(token);

    let report = coordinator.run(targets(10)).await.unwrap();
    let started = started.lock().unwrap().clone();

    assert_eq!(report.processed(), 10);
    assert_eq!(report.success_count, started.len());
    assert!(report
        .failures
        .iter()
        .all(|f| f.error == OperationError::Cancelled && !started.contains(&f.target)));
    assert!(report.failure_count >= 1);
    assert_eq!(coordinator.state(), RunState::Reported);
}
