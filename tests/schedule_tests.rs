use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sea_battle::TurnDelay;
use tokio::time::{sleep, Duration, Instant};

const THINK: Duration = Duration::from_millis(1_000);

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn add(counter: &Arc<AtomicUsize>, n: usize) -> impl FnOnce() + Send + 'static {
    let counter = Arc::clone(counter);
    move || {
        counter.fetch_add(n, Ordering::SeqCst);
    }
}

#[tokio::test(start_paused = true)]
async fn callback_runs_after_the_delay() {
    let hits = counter();
    let mut delay = TurnDelay::new(THINK);
    let started = Instant::now();
    delay.schedule(add(&hits, 1));
    assert!(delay.is_pending());
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    assert!(delay.wait().await);
    assert!(started.elapsed() >= THINK);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!delay.is_pending());
    assert!(!delay.wait().await);
}

#[tokio::test(start_paused = true)]
async fn cancelled_callback_never_runs() {
    let hits = counter();
    let mut delay = TurnDelay::new(THINK);
    delay.schedule(add(&hits, 1));
    assert!(delay.cancel());
    assert!(!delay.cancel());
    assert!(!delay.is_pending());

    sleep(THINK * 3).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn rescheduling_replaces_the_pending_callback() {
    let hits = counter();
    let mut delay = TurnDelay::new(THINK);
    delay.schedule(add(&hits, 1));
    sleep(THINK / 2).await;
    delay.schedule(add(&hits, 10));

    assert!(delay.wait().await);
    sleep(THINK * 3).await;
    assert_eq!(hits.load(Ordering::SeqCst), 10);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_delay_cancels_it() {
    let hits = counter();
    {
        let mut delay = TurnDelay::new(THINK);
        delay.schedule(add(&hits, 1));
    }
    sleep(THINK * 3).await;
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}
