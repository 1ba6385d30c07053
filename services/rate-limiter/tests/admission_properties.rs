mod common;

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use rate_limiter::{
    AdmissionEngine, AdmissionError, ConfigStore, Decision, MemoryConfigStore, MemoryCounterStore,
};
use tokio::sync::Barrier;
use tokio::time::{advance, sleep};

use common::{memory_engine, quota};

#[test]
fn first_limit_checks_are_admitted_and_next_is_denied() {
    let engine = memory_engine();
    engine.create(quota("client-a", 4, 60)).unwrap();

    for expected in 1..=4 {
        assert_eq!(
            engine.check("client-a").unwrap(),
            Decision::Admitted {
                count: expected,
                limit: 4
            }
        );
    }
    assert!(matches!(
        engine.check("client-a").unwrap(),
        Decision::Denied { count: 4, limit: 4, .. }
    ));
}

#[tokio::test(start_paused = true)]
async fn count_restarts_at_one_after_window_elapses() {
    let engine = memory_engine();
    engine.create(quota("client-a", 2, 5)).unwrap();
    engine.check("client-a").unwrap();
    engine.check("client-a").unwrap();
    assert!(!engine.check("client-a").unwrap().is_admitted());

    advance(Duration::from_secs(6)).await;

    assert_eq!(
        engine.check("client-a").unwrap(),
        Decision::Admitted { count: 1, limit: 2 }
    );
}

#[tokio::test(start_paused = true)]
async fn denied_check_reports_time_until_reset() {
    let engine = memory_engine();
    engine.create(quota("client-a", 1, 10)).unwrap();
    engine.check("client-a").unwrap();

    advance(Duration::from_secs(3)).await;
    match engine.check("client-a").unwrap() {
        Decision::Denied { retry_after, .. } => assert_eq!(retry_after, Duration::from_secs(7)),
        other => panic!("expected denial, got {other:?}"),
    }
}

#[test]
fn unknown_id_is_not_found_and_creates_no_counter() {
    let engine = memory_engine();

    assert!(matches!(
        engine.check("ghost"),
        Err(AdmissionError::NotFound(_))
    ));
    assert!(matches!(
        engine.usage("ghost"),
        Err(AdmissionError::NotFound(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_checks_never_over_admit() {
    let engine = memory_engine();
    engine.create(quota("burst", 5, 60)).unwrap();

    let callers = 50;
    let barrier = Arc::new(Barrier::new(callers));
    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                engine.check("burst").expect("check should not fail")
            })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.expect("check task panicked").is_admitted() {
            admitted += 1;
        }
    }

    assert_eq!(admitted, 5);
    assert_eq!(engine.usage("burst").unwrap().denied_requests, 45);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_cold_path_checks_share_one_window() {
    // Configured durably but never cached, so every caller races through hydration.
    let config_store = Arc::new(MemoryConfigStore::new());
    config_store.save(&quota("cold", 3, 60)).unwrap();
    let engine = AdmissionEngine::new(config_store, Arc::new(MemoryCounterStore::new()));

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let engine = engine.clone();
            tokio::task::spawn_blocking(move || engine.check("cold").unwrap())
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        if handle.await.unwrap().is_admitted() {
            admitted += 1;
        }
    }
    assert_eq!(admitted, 3);
}

#[tokio::test(start_paused = true)]
async fn raised_limit_applies_to_following_checks() {
    let engine = memory_engine();
    engine.create(quota("client-a", 5, 30)).unwrap();
    for _ in 0..5 {
        assert!(engine.check("client-a").unwrap().is_admitted());
    }
    assert!(!engine.check("client-a").unwrap().is_admitted());

    engine.update("client-a", quota("client-a", 10, 30)).unwrap();
    assert_eq!(
        engine.check("client-a").unwrap(),
        Decision::Admitted { count: 6, limit: 10 }
    );

    advance(Duration::from_secs(31)).await;
    for _ in 0..10 {
        assert!(engine.check("client-a").unwrap().is_admitted());
    }
    assert!(!engine.check("client-a").unwrap().is_admitted());
}

#[test]
fn deleted_config_is_not_found() {
    let engine = memory_engine();
    engine.create(quota("client-a", 5, 60)).unwrap();
    engine.check("client-a").unwrap();

    assert!(engine.delete("client-a").unwrap());
    assert!(matches!(
        engine.check("client-a"),
        Err(AdmissionError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn create_check_wait_round_trip() {
    let engine = memory_engine();
    engine.create(quota("x", 3, 2)).unwrap();

    for _ in 0..3 {
        assert!(engine.check("x").unwrap().is_admitted());
    }
    assert!(!engine.check("x").unwrap().is_admitted());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(
        engine.check("x").unwrap(),
        Decision::Admitted { count: 1, limit: 3 }
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sequential_checks_admit_exactly_min_of_limit_and_calls(limit in 1u64..20, calls in 0usize..60) {
        let engine = memory_engine();
        engine.create(quota("prop", limit, 3_600)).unwrap();

        let admitted = (0..calls)
            .filter(|_| engine.check("prop").unwrap().is_admitted())
            .count() as u64;

        prop_assert_eq!(admitted, limit.min(calls as u64));
        let usage = engine.usage("prop").unwrap();
        prop_assert!(usage.current_requests <= limit);
        prop_assert_eq!(usage.current_requests + usage.denied_requests, calls as u64);
    }

    #[test]
    fn ids_do_not_share_quota(limit_a in 1u64..10, limit_b in 1u64..10) {
        let engine = memory_engine();
        engine.create(quota("a", limit_a, 3_600)).unwrap();
        engine.create(quota("b", limit_b, 3_600)).unwrap();

        let admitted_a = (0..20).filter(|_| engine.check("a").unwrap().is_admitted()).count() as u64;
        let admitted_b = (0..20).filter(|_| engine.check("b").unwrap().is_admitted()).count() as u64;

        prop_assert_eq!(admitted_a, limit_a);
        prop_assert_eq!(admitted_b, limit_b);
    }
}
