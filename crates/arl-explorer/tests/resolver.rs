//! Task metadata resolution under concurrency

use arl_explorer::{group_and_resolve, TaskMetaResolver};
use arl_test_utils::{mixed_result_items, task_record, Method, ScriptedTransport};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

fn slow_backend() -> Arc<ScriptedTransport> {
    let transport = Arc::new(ScriptedTransport::new().with_delay(Duration::from_millis(50)));
    transport.with_task_records(vec![
        task_record("t1", "Recon A", "example.com"),
        task_record("t2", "Recon B", "example.org"),
    ]);
    transport
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_lookup() {
    let transport = slow_backend();
    let resolver = TaskMetaResolver::new(transport.clone());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let resolver = resolver.clone();
            tokio::spawn(async move { resolver.resolve("t1").await })
        })
        .collect();

    for handle in handles {
        let meta = handle.await.unwrap().unwrap();
        assert_eq!(meta.name.as_deref(), Some("Recon A"));
    }
    assert_eq!(transport.lookups("task/", "_id", "t1"), 1);
}

#[tokio::test]
async fn batch_skips_duplicates_and_sentinels() {
    let transport = slow_backend();
    let resolver = TaskMetaResolver::new(transport.clone());

    let metas = resolver.resolve_many(["t1", "t1", "unknown", ""]).await;

    assert_eq!(metas.len(), 1);
    assert_eq!(metas["t1"].target.as_deref(), Some("example.com"));
    assert_eq!(transport.call_count(Method::Get, "task/"), 1);
}

#[tokio::test]
async fn batches_overlapping_in_flight_lookups_coalesce() {
    let transport = slow_backend();
    let resolver = TaskMetaResolver::new(transport.clone());

    let batches = join_all([
        resolver.resolve_many(["t1", "t2"]),
        resolver.resolve_many(["t2", "t1"]),
    ])
    .await;

    assert!(batches.iter().all(|metas| metas.len() == 2));
    assert_eq!(transport.lookups("task/", "_id", "t1"), 1);
    assert_eq!(transport.lookups("task/", "_id", "t2"), 1);
}

#[tokio::test]
async fn cached_answers_survive_backend_outage() {
    let transport = slow_backend();
    let resolver = TaskMetaResolver::new(transport.clone());

    assert!(resolver.resolve("t1").await.is_some());
    assert!(resolver.resolve("missing").await.is_none());
    resolver.sync().await;
    assert_eq!(resolver.entry_count(), 2);

    transport.set_unreachable(true);
    assert!(resolver.resolve("t1").await.is_some());
    assert!(resolver.resolve("missing").await.is_none());
    assert_eq!(transport.call_count(Method::Get, "task/"), 2);
}

#[tokio::test]
async fn failed_lookup_is_not_retried() {
    let transport = slow_backend();
    transport.set_unreachable(true);
    let resolver = TaskMetaResolver::new(transport.clone());

    assert!(resolver.resolve("t1").await.is_none());
    transport.set_unreachable(false);
    assert!(resolver.resolve("t1").await.is_none());
    assert_eq!(transport.lookups("task/", "_id", "t1"), 1);
}

#[tokio::test]
async fn grouped_records_are_titled() {
    let transport = slow_backend();
    let resolver = TaskMetaResolver::new(transport.clone());

    let groups = group_and_resolve(&resolver, &mixed_result_items()).await;

    let headings: Vec<(&str, &str, usize)> = groups
        .iter()
        .map(|g| (g.title.as_str(), g.subtitle.as_str(), g.count))
        .collect();
    assert_eq!(
        headings,
        vec![
            ("Recon A", "Target: example.com · ID: t1", 2),
            ("Unknown task", "No task ID found", 1),
        ]
    );
    assert_eq!(transport.call_count(Method::Get, "task/"), 1);
}
