//! End-to-end gate behaviour on a paused Tokio runtime.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use throttle_core::{Dispatch, ThrottleGate};
use throttle_runtime::{TokioClock, TokioScheduler, bind_to_lifecycle, throttle_on_current};
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

type Seen = Arc<Mutex<Vec<&'static str>>>;

fn gate(interval_ms: u64) -> (ThrottleGate<&'static str>, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let gate = throttle_on_current(
        move |value: &'static str| sink.lock().unwrap().push(value),
        Duration::from_millis(interval_ms),
    )
    .unwrap();
    (gate, seen)
}

/// Let runtime time pass and give woken timer tasks a chance to run.
async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    tokio::task::yield_now().await;
}

fn seen(log: &Seen) -> Vec<&'static str> {
    log.lock().unwrap().clone()
}

#[tokio::test(start_paused = true)]
async fn rapid_calls_collapse_into_one_trailing_run() {
    let (gate, log) = gate(1000);

    assert_eq!(gate.invoke("A"), Ok(Dispatch::Executed));
    assert_ok!(gate.invoke("B"));
    assert_eq!(seen(&log), vec!["A"]);

    advance(1001).await;
    assert_eq!(seen(&log), vec!["A", "B"]);
}

#[tokio::test(start_paused = true)]
async fn trailing_run_waits_for_rest_of_window() {
    let (gate, log) = gate(500);

    gate.invoke("A").unwrap();
    advance(300).await;
    assert_eq!(
        gate.invoke("B"),
        Ok(Dispatch::Scheduled {
            remaining: Duration::from_millis(200)
        })
    );

    advance(150).await;
    assert_eq!(seen(&log), vec!["A"]);

    advance(60).await;
    assert_eq!(seen(&log), vec!["A", "B"]);
}

#[tokio::test(start_paused = true)]
async fn last_arguments_win() {
    let (gate, log) = gate(200);

    for value in ["first", "second", "third", "fourth"] {
        assert_ok!(gate.invoke(value));
    }

    advance(250).await;
    assert_eq!(seen(&log), vec!["first", "fourth"]);
}

#[tokio::test(start_paused = true)]
async fn lifecycle_teardown_cancels_pending_run() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let gate = Arc::new(ThrottleGate::new(
        move |value: &'static str| sink.lock().unwrap().push(value),
        Duration::from_millis(1000),
        Arc::new(TokioClock::new()),
        Arc::new(TokioScheduler::current().unwrap()),
    ));
    let token = CancellationToken::new();
    let binding = bind_to_lifecycle(Arc::clone(&gate), token.clone()).unwrap();

    gate.invoke("A").unwrap();
    gate.invoke("B").unwrap();
    token.cancel();
    binding.await.unwrap();

    advance(5000).await;
    assert_eq!(*seen.lock().unwrap(), vec!["A"]);
}

#[tokio::test(start_paused = true)]
async fn deferred_panic_does_not_wedge_the_gate() {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let gate = throttle_on_current(
        move |value: &'static str| {
            assert_ne!(value, "boom", "action rejected input");
            sink.lock().unwrap().push(value);
        },
        Duration::from_millis(100),
    )
    .unwrap();

    gate.invoke("A").unwrap();
    gate.invoke("boom").unwrap();
    advance(150).await;
    assert!(!gate.is_pending());

    // The panicking run at t=100 still opened a new window.
    assert!(matches!(gate.invoke("C"), Ok(Dispatch::Scheduled { .. })));
    // C fires at t=200; D at t=350 is past its window.
    advance(200).await;
    assert_eq!(gate.invoke("D"), Ok(Dispatch::Executed));
    assert_eq!(*seen.lock().unwrap(), vec!["A", "C", "D"]);
}
