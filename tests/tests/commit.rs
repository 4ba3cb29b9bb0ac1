//! Commit path: kind-specific then generic handlers, after the store commits.

use postcommit_tests::prelude::*;

mod ordering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_and_update_then_commit() {
        // GIVEN A created and B updated in one transaction
        let mut h = Harness::new();
        let b = h.entity(Article::new(2, "draft"));
        h.begin().unwrap();
        h.create(Article::new(1, "hello")).unwrap();
        h.update(&b).unwrap();

        // WHEN
        let report = h.commit().unwrap().unwrap();

        // THEN kind buckets fire before the generic bucket, each once
        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Article#1",
                "after_commit_on_update:Article#2",
                "after_commit:Article#1",
                "after_commit:Article#2",
            ]
        );
        assert_eq!(report.pass, DispatchPass::Commit);
        assert_eq!(report.entities, 2);
        assert_eq!(report.invoked, 4);
        assert!(report.is_clean());
    }

    #[test]
    fn test_buckets_fire_create_update_destroy() {
        let mut h = Harness::new();
        let updated = h.entity(Comment::new(10, 1, "first"));
        let destroyed = h.entity(Comment::new(11, 1, "spam"));
        h.begin().unwrap();
        h.destroy(&destroyed).unwrap();
        h.update(&updated).unwrap();
        h.create(Comment::new(12, 1, "new")).unwrap();

        h.commit().unwrap();

        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Comment#12",
                "after_commit_on_update:Comment#10",
                "after_commit_on_destroy:Comment#11",
                "after_commit:Comment#11",
                "after_commit:Comment#10",
                "after_commit:Comment#12",
            ]
        );
    }

    #[test]
    fn test_insertion_order_within_bucket() {
        let mut h = Harness::new();
        h.begin().unwrap();
        for id in [3, 1, 2] {
            h.create(Article::new(id, "a")).unwrap();
        }

        h.commit().unwrap();

        assert_eq!(
            h.log().with_prefix("after_commit_on_create"),
            vec![
                "after_commit_on_create:Article#3",
                "after_commit_on_create:Article#1",
                "after_commit_on_create:Article#2",
            ]
        );
    }
}

mod kinds {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_then_destroy_fires_both() {
        // GIVEN D created and destroyed in the same transaction
        let mut h = Harness::new();
        h.begin().unwrap();
        let d = h.create(Article::new(4, "ephemeral")).unwrap();
        h.destroy(&d).unwrap();

        // WHEN
        h.commit().unwrap();

        // THEN neither kind cancels the other
        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Article#4",
                "after_commit_on_destroy:Article#4",
                "after_commit:Article#4",
            ]
        );
        assert!(!h.persisted(&d));
    }

    #[test]
    fn test_repeated_update_fires_once() {
        let mut h = Harness::new();
        h.begin().unwrap();
        let a = h.create(Article::new(1, "v1")).unwrap();
        h.update(&a).unwrap();
        h.update(&a).unwrap();

        h.commit().unwrap();

        assert_eq!(h.log().count("after_commit_on_create:Article#1"), 1);
        assert_eq!(h.log().count("after_commit_on_update:Article#1"), 1);
        assert_eq!(h.log().count("after_commit:Article#1"), 1);
    }

    #[test]
    fn test_repeated_update_without_dedup() {
        let mut h = Harness::with_config(DispatchConfig::new().with_dedup(false));
        h.begin().unwrap();
        let a = h.create(Article::new(1, "v1")).unwrap();
        h.update(&a).unwrap();
        h.update(&a).unwrap();

        h.commit().unwrap();

        assert_eq!(h.log().count("after_commit_on_update:Article#1"), 2);
        assert_eq!(h.log().count("after_commit:Article#1"), 3);
    }

    #[test]
    fn test_before_handlers_never_fire() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(Article::new(1, "a")).unwrap();

        h.commit().unwrap();

        assert!(h.log().with_prefix("before_").is_empty());
    }

    #[test]
    fn test_inherited_handlers_run_first() {
        // GIVEN a Featured article, which extends Article
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(Featured {
            article: Article::new(7, "front"),
            slot: 1,
        })
        .unwrap();

        // WHEN
        h.commit().unwrap();

        // THEN Article's handlers see the parent view, then Featured's own
        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Article#7",
                "after_commit:Article#7",
                "after_commit:Featured#7",
            ]
        );
    }
}

mod lifecycle {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pending_cleared_after_commit() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(Article::new(1, "a")).unwrap();
        assert_eq!(h.manager().pending().len(), 1);

        h.commit().unwrap();

        assert!(h.manager().pending().is_empty());
        assert_eq!(h.manager().state(), TransactionState::Inactive);
    }

    #[test]
    fn test_next_transaction_starts_clean() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(Article::new(1, "a")).unwrap();
        h.commit().unwrap();
        h.log().take();

        h.begin().unwrap();
        h.create(Article::new(2, "b")).unwrap();
        h.commit().unwrap();

        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Article#2",
                "after_commit:Article#2",
            ]
        );
    }

    #[test]
    fn test_empty_commit_dispatches_nothing() {
        let mut h = Harness::new();
        h.begin().unwrap();

        let report = h.commit().unwrap().unwrap();

        assert_eq!(report.entities, 0);
        assert_eq!(report.invoked, 0);
        assert!(h.log().is_empty());
    }

    #[test]
    fn test_rows_persist_after_commit() {
        let mut h = Harness::new();
        h.begin().unwrap();
        let a = h.create(Article::new(1, "a")).unwrap();

        h.commit().unwrap();

        assert!(h.persisted(&a));
        assert!(!h.store().in_transaction());
    }

    #[test]
    fn test_store_commit_failure_defers_dispatch() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(Article::new(1, "a")).unwrap();
        h.manager_mut().store_mut().fail_next_commit("disk full");

        let result = h.commit();

        assert!(matches!(result, Err(TransactionError::Store(StoreError::Injected(_)))));
        assert!(h.log().is_empty());
        assert!(h.manager().is_active());
        assert_eq!(h.manager().pending().len(), 1);

        h.commit().unwrap();
        assert_eq!(h.log().count("after_commit:Article#1"), 1);
    }

    #[test]
    fn test_record_outside_transaction_is_rejected() {
        let mut h = Harness::new();

        let result = h.create(Article::new(1, "a"));

        assert!(matches!(result, Err(TransactionError::NoActiveTransaction)));
        assert!(h.manager().pending().is_empty());
    }
}
