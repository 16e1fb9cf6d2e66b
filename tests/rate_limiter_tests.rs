use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use http_output::rate_limiter::{RateLimiter, TimeProvider};
use rstest::rstest;

fn mock_time_provider(time: Arc<AtomicU64>) -> TimeProvider {
    Arc::new(move || time.load(Ordering::Relaxed))
}

#[rstest]
fn throttles_attempts_inside_interval() {
    let time = Arc::new(AtomicU64::new(1_000));
    let limiter = RateLimiter::new(
        Some(Duration::from_millis(1200)),
        mock_time_provider(Arc::clone(&time)),
    );

    // First attempt always passes
    assert!(limiter.try_acquire());

    // Still inside the interval
    time.store(2_199, Ordering::Relaxed);
    assert!(!limiter.try_acquire());

    // Exactly one interval later
    time.store(2_200, Ordering::Relaxed);
    assert!(limiter.try_acquire());

    // Interval restarts from the last allowed attempt, not the dropped one
    time.store(3_000, Ordering::Relaxed);
    assert!(!limiter.try_acquire());
    time.store(3_400, Ordering::Relaxed);
    assert!(limiter.try_acquire());
}

#[rstest]
fn throttled_attempts_do_not_extend_the_window() {
    let time = Arc::new(AtomicU64::new(0));
    let limiter = RateLimiter::new(
        Some(Duration::from_millis(100)),
        mock_time_provider(Arc::clone(&time)),
    );
    assert!(limiter.try_acquire());
    for t in [10, 50, 99] {
        time.store(t, Ordering::Relaxed);
        assert!(!limiter.try_acquire());
    }
    time.store(100, Ordering::Relaxed);
    assert!(limiter.try_acquire());
}

#[rstest]
fn clock_going_backwards_is_throttled() {
    let time = Arc::new(AtomicU64::new(5_000));
    let limiter = RateLimiter::new(
        Some(Duration::from_millis(100)),
        mock_time_provider(Arc::clone(&time)),
    );
    assert!(limiter.try_acquire());
    time.store(4_000, Ordering::Relaxed);
    assert!(!limiter.try_acquire());
}

#[rstest]
fn concurrent_callers_admit_one_attempt_per_interval() {
    let limiter = Arc::new(RateLimiter::new(
        Some(Duration::from_secs(60)),
        Arc::new(|| 42),
    ));
    let admitted = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            let admitted = Arc::clone(&admitted);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if limiter.try_acquire() {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread panicked");
    }

    assert_eq!(admitted.load(Ordering::SeqCst), 1);
}

#[rstest]
fn independent_limiters_do_not_interfere() {
    let time = Arc::new(AtomicU64::new(0));
    let a = RateLimiter::new(
        Some(Duration::from_secs(1)),
        mock_time_provider(Arc::clone(&time)),
    );
    let b = RateLimiter::new(
        Some(Duration::from_secs(1)),
        mock_time_provider(Arc::clone(&time)),
    );
    assert!(a.try_acquire());
    assert!(b.try_acquire());
    assert!(!a.try_acquire());
}
