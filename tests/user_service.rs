mod common;

use common::{InMemoryStore, TEST_TTL, TestContext, abc123, wait_until};
use std::time::Duration;
use user_lookup::domain::entities::UserRecord;
use user_lookup::domain::lookup::{LookupError, LookupOutcome};

const BUDGET: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_miss_then_hit_after_repopulation() {
    let ctx = TestContext::new(InMemoryStore::with_users([abc123()]), BUDGET);

    let first = ctx.service.get_user("abc123").await;
    assert_eq!(
        first.into_parts(),
        (Some(abc123()), false, true, None)
    );

    let cache = ctx.cache.clone();
    assert!(wait_until(Duration::from_secs(1), || cache.contains("abc123")).await);
    assert_eq!(ctx.cache.ttl_of("abc123"), Some(TEST_TTL));

    let second = ctx.service.get_user("abc123").await;
    assert_eq!(
        second.into_parts(),
        (Some(abc123()), true, true, None)
    );
    assert_eq!(ctx.store.queries(), 1);
}

#[tokio::test]
async fn test_missing_user_is_not_cached() {
    let ctx = TestContext::new(InMemoryStore::default(), BUDGET);

    let outcome = ctx.service.get_user("missing1").await;
    assert_eq!(outcome, LookupOutcome::NotFound);

    let again = ctx.service.get_user("missing1").await;
    assert_eq!(again, LookupOutcome::NotFound);
    assert_eq!(ctx.store.queries(), 2);

    let (_, cache) = ctx.drain_writer().await;
    assert_eq!(cache.sets(), 0);
}

#[tokio::test]
async fn test_cache_failure_falls_back_to_store() {
    let ctx = TestContext::new(InMemoryStore::with_users([abc123()]), BUDGET);
    ctx.cache.set_failing(true);

    let outcome = ctx.service.get_user("abc123").await;

    assert!(outcome.is_found());
    assert!(!outcome.cache_hit());
    assert!(outcome.error().is_none());
    assert_eq!(ctx.store.queries(), 1);

    // The failed repopulation is attempted and swallowed.
    let (_, cache) = ctx.drain_writer().await;
    assert_eq!(cache.sets(), 1);
    assert!(!cache.contains("abc123"));
}

#[tokio::test]
async fn test_store_failure_is_reported_and_not_cached() {
    let ctx = TestContext::new(InMemoryStore::with_users([abc123()]), BUDGET);
    ctx.store.set_failing(true);

    let outcome = ctx.service.get_user("abc123").await;

    match outcome.error() {
        Some(LookupError::Store { user_id, .. }) => assert_eq!(user_id, "abc123"),
        other => panic!("expected store error, got {other:?}"),
    }
    assert!(outcome.user().is_none());
    assert!(!outcome.cache_hit());

    let (_, cache) = ctx.drain_writer().await;
    assert_eq!(cache.sets(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_misses_share_one_query() {
    let hot = UserRecord::new("hot1", "app://hot", "Hot deal");
    let ctx = TestContext::new(InMemoryStore::with_users([hot.clone()]), BUDGET);
    ctx.store.set_latency(Duration::from_millis(50));

    let lookups: Vec<_> = (0..50)
        .map(|_| {
            let service = ctx.service.clone();
            tokio::spawn(async move { service.get_user("hot1").await })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(lookups.len());
    for lookup in lookups {
        outcomes.push(lookup.await.unwrap());
    }

    assert_eq!(ctx.store.queries(), 1);
    assert!(outcomes.iter().all(|o| o.user() == Some(&hot)));
    assert!(outcomes.iter().all(|o| !o.cache_hit()));
    assert_eq!(ctx.gate.in_flight(), 0);

    // One episode, one repopulation.
    let (_, cache) = ctx.drain_writer().await;
    assert_eq!(cache.sets(), 1);
}

#[tokio::test]
async fn test_misses_for_different_users_are_not_coalesced() {
    let users = [
        UserRecord::new("u1", "d1", "p1"),
        UserRecord::new("u2", "d2", "p2"),
    ];
    let ctx = TestContext::new(InMemoryStore::with_users(users), BUDGET);
    ctx.store.set_latency(Duration::from_millis(20));

    let (a, b) = tokio::join!(ctx.service.get_user("u1"), ctx.service.get_user("u2"));

    assert_eq!(a.user().map(|u| u.deeplink.as_str()), Some("d1"));
    assert_eq!(b.user().map(|u| u.deeplink.as_str()), Some("d2"));
    assert_eq!(ctx.store.queries(), 2);
}

#[tokio::test]
async fn test_slow_store_hits_request_deadline() {
    let ctx = TestContext::new(
        InMemoryStore::with_users([abc123()]),
        Duration::from_millis(50),
    );
    ctx.store.set_latency(Duration::from_millis(500));

    let outcome = ctx.service.get_user("abc123").await;

    assert!(matches!(
        outcome,
        LookupOutcome::Failed(LookupError::DeadlineExceeded { ref user_id }) if user_id == "abc123"
    ));
    assert_eq!(ctx.gate.in_flight(), 0);
}

#[tokio::test]
async fn test_caller_deadline_tighter_than_budget_wins() {
    let ctx = TestContext::new(InMemoryStore::with_users([abc123()]), BUDGET);
    ctx.store.set_latency(Duration::from_millis(500));

    let deadline = tokio::time::Instant::now() + Duration::from_millis(30);
    let outcome = ctx.service.lookup("abc123", Some(deadline)).await;

    assert!(matches!(
        outcome.error(),
        Some(LookupError::DeadlineExceeded { .. })
    ));
}

#[tokio::test]
async fn test_waiter_survives_cancelled_owner() {
    let ctx = TestContext::new(InMemoryStore::with_users([abc123()]), BUDGET);
    ctx.store.set_latency(Duration::from_millis(100));

    let service = ctx.service.clone();
    let owner = tokio::spawn(async move { service.get_user("abc123").await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    let service = ctx.service.clone();
    let waiter = tokio::spawn(async move { service.get_user("abc123").await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    owner.abort();
    let outcome = waiter.await.unwrap();

    assert_eq!(outcome.user(), Some(&abc123()));
    assert_eq!(ctx.store.queries(), 1);
}

#[tokio::test]
async fn test_new_episode_after_previous_completed() {
    let ctx = TestContext::new(InMemoryStore::default(), BUDGET);

    assert_eq!(ctx.service.get_user("late1").await, LookupOutcome::NotFound);
    assert_eq!(ctx.service.get_user("late1").await, LookupOutcome::NotFound);

    // A finished episode is never replayed to later callers.
    assert_eq!(ctx.store.queries(), 2);
    assert_eq!(ctx.gate.in_flight(), 0);
}
