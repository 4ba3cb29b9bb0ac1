//! Rollback path: only after_rollback fires; kind buckets are discarded.

use postcommit_tests::prelude::*;
use pretty_assertions::assert_eq;

#[test]
fn test_destroy_then_rollback() {
    // GIVEN C destroyed in a transaction
    let mut h = Harness::new();
    let c = h.entity(Article::new(3, "doomed"));
    h.begin().unwrap();
    h.destroy(&c).unwrap();

    // WHEN
    let report = h.rollback().unwrap().unwrap();

    // THEN
    assert_eq!(h.log().take(), vec!["after_rollback:Article#3"]);
    assert_eq!(report.pass, DispatchPass::Rollback);
    assert_eq!(report.entities, 1);
    assert_eq!(report.discarded, 1);
}

#[test]
fn test_rollback_fires_once_per_entity() {
    let mut h = Harness::new();
    h.begin().unwrap();
    let a = h.create(Article::new(1, "a")).unwrap();
    h.update(&a).unwrap();
    h.create(Comment::new(5, 1, "c")).unwrap();

    let report = h.rollback().unwrap().unwrap();

    assert_eq!(
        h.log().take(),
        vec!["after_rollback:Article#1", "after_rollback:Comment#5"]
    );
    assert_eq!(report.discarded, 3);
}

#[test]
fn test_rollback_restores_rows() {
    let mut h = Harness::new();
    h.begin().unwrap();
    let kept = h.create(Article::new(1, "kept")).unwrap();
    h.commit().unwrap();

    h.begin().unwrap();
    let added = h.create(Article::new(2, "added")).unwrap();
    h.destroy(&kept).unwrap();
    h.rollback().unwrap();

    assert!(h.persisted(&kept));
    assert!(!h.persisted(&added));
}

#[test]
fn test_pending_cleared_after_rollback() {
    let mut h = Harness::new();
    h.begin().unwrap();
    h.create(Article::new(1, "a")).unwrap();

    h.rollback().unwrap();

    assert!(h.manager().pending().is_empty());
    assert_eq!(h.manager().state(), TransactionState::Inactive);

    // the rolled-back entity does not leak into the next commit
    h.log().take();
    h.begin().unwrap();
    h.commit().unwrap();
    assert!(h.log().is_empty());
}

#[test]
fn test_failed_commit_then_rollback() {
    // GIVEN a commit the store refuses
    let mut h = Harness::new();
    h.begin().unwrap();
    h.create(Article::new(1, "a")).unwrap();
    h.manager_mut().store_mut().fail_next_commit("serialization failure");
    assert!(h.commit().is_err());

    // WHEN the caller gives up
    h.rollback().unwrap();

    // THEN only the rollback notification fires
    assert_eq!(h.log().take(), vec!["after_rollback:Article#1"]);
}

#[test]
fn test_store_rollback_failure_still_dispatches() {
    let mut h = Harness::new();
    h.begin().unwrap();
    let a = h.create(Article::new(1, "a")).unwrap();
    h.manager_mut().store_mut().fail_next_rollback("connection lost");

    let result = h.rollback();

    assert!(matches!(result, Err(TransactionError::Store(StoreError::Injected(_)))));
    assert_eq!(h.log().take(), vec!["after_rollback:Article#1"]);
    assert!(!h.persisted(&a));
    assert_eq!(h.manager().state(), TransactionState::Inactive);
}
