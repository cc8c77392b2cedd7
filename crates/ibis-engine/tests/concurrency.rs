//! Per-author serialization under concurrent load

use ibis_engine::harness::{run_serialization_stress, SerializationStressConfig};
use ibis_engine::CreationError;
use ibis_test_utils::{engine, issue_request, FaultyRepository};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_author_near_duplicates_yield_exactly_one_node() {
    for round in 0..20 {
        let repo = Arc::new(FaultyRepository::new());
        repo.delay_inserts(Duration::from_millis(3));
        let engine = engine(repo.clone());

        let a = tokio::spawn({
            let engine = engine.clone();
            async move { engine.create_node(issue_request("Budget Reform Now", "alice")).await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            async move { engine.create_node(issue_request("budget reform now!!", "alice")).await }
        });

        let results = [a.await.unwrap(), b.await.unwrap()];
        let created = results.iter().filter(|r| r.is_ok()).count();
        let duplicates = results
            .iter()
            .filter(|r| matches!(r, Err(CreationError::Duplicate { .. })))
            .count();

        assert_eq!((created, duplicates), (1, 1), "round {round}: {results:?}");
        assert_eq!(repo.inner().node_count(), 1, "round {round}");
        assert_eq!(engine.pending_authors(), 0, "round {round}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_authors_are_not_deduplicated_against_each_other() {
    let repo = Arc::new(FaultyRepository::new());
    repo.delay_inserts(Duration::from_millis(2));
    let engine = engine(repo.clone());

    let tasks: Vec<_> = ["alice", "bob", "carol", "dave"]
        .into_iter()
        .map(|author| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.create_node(issue_request("Budget Reform Now", author)).await })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_ok());
    }
    assert_eq!(repo.inner().node_count(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lock_table_drains_after_mixed_outcomes() {
    let repo = Arc::new(FaultyRepository::new());
    let engine = engine(repo.clone());

    let tasks: Vec<_> = (0..40)
        .map(|i| {
            let engine = engine.clone();
            let author = format!("author-{}", i % 5);
            // Every author submits the same title several times; most fail.
            tokio::spawn(async move { engine.create_node(issue_request("Repave the plaza", &author)).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 5);
    assert_eq!(engine.pending_authors(), 0);
}

#[tokio::test]
async fn dropped_caller_does_not_cancel_the_run() {
    let repo = Arc::new(FaultyRepository::new());
    repo.delay_inserts(Duration::from_millis(20));
    let engine = engine(repo.clone());

    let pending = engine.create_node(issue_request("Skate park", "alice"));
    // Give up on the call while the insert is still sleeping.
    let _ = tokio::time::timeout(Duration::from_millis(5), pending).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(repo.inner().node_count(), 1);
    assert_eq!(engine.pending_authors(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn harness_stress_passes() {
    let report = run_serialization_stress(&SerializationStressConfig {
        authors: 6,
        submissions_per_author: 5,
        latency: Duration::from_millis(1),
        ..SerializationStressConfig::default()
    })
    .await;

    assert!(report.passed(), "{report:?}");
    assert_eq!(report.created, 6);
    assert_eq!(report.duplicates, 24);
}
