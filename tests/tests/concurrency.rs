//! Independent managers never see each other's pending entities.

use std::sync::{Arc, Barrier};
use std::thread;

use postcommit_tests::prelude::*;
use pretty_assertions::assert_eq;

const PER_THREAD: u64 = 25;

#[test]
fn test_concurrent_transactions_are_isolated() {
    // GIVEN one registry and log shared by two workers
    let log = EventLog::default();
    let registry = Arc::new(fixture_registry(&log));
    let barrier = Arc::new(Barrier::new(2));

    // WHEN both record while the other is mid-transaction; one commits,
    // the other rolls back
    let workers: Vec<_> = [(0u64, true), (1000u64, false)]
        .into_iter()
        .map(|(base, commit)| {
            let registry = registry.clone();
            let log = log.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut h = Harness::with_registry(registry, log, DispatchConfig::default());
                h.begin().unwrap();
                for id in base..base + PER_THREAD {
                    h.create(Article::new(id, "t")).unwrap();
                }
                barrier.wait();
                let report = if commit { h.commit() } else { h.rollback() };
                report.unwrap().unwrap()
            })
        })
        .collect();
    let reports: Vec<DispatchReport> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    // THEN each pass saw only its own entities
    assert_eq!(reports[0].pass, DispatchPass::Commit);
    assert_eq!(reports[0].entities, PER_THREAD as usize);
    assert_eq!(reports[1].pass, DispatchPass::Rollback);
    assert_eq!(reports[1].entities, PER_THREAD as usize);

    let committed = log.with_prefix("after_commit:");
    let rolled_back = log.with_prefix("after_rollback:");
    assert_eq!(committed.len(), PER_THREAD as usize);
    assert_eq!(rolled_back.len(), PER_THREAD as usize);
    for id in 0..PER_THREAD {
        assert_eq!(log.count(&format!("after_commit:Article#{}", id)), 1);
    }
    for id in 1000..1000 + PER_THREAD {
        assert_eq!(log.count(&format!("after_rollback:Article#{}", id)), 1);
    }
}

#[test]
fn test_managers_on_one_thread_are_independent() {
    let log = EventLog::default();
    let registry = Arc::new(fixture_registry(&log));
    let mut first = Harness::with_registry(registry.clone(), log.clone(), DispatchConfig::default());
    let mut second = Harness::with_registry(registry, log.clone(), DispatchConfig::default());

    first.begin().unwrap();
    second.begin().unwrap();
    first.create(Article::new(1, "first")).unwrap();
    second.create(Article::new(2, "second")).unwrap();

    first.commit().unwrap();

    assert_eq!(
        log.take(),
        vec![
            "after_commit_on_create:Article#1",
            "after_commit:Article#1",
        ]
    );
    assert_eq!(second.manager().pending().len(), 1);
    assert!(second.manager().is_active());
}
