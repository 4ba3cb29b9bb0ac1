//! Handler failures are isolated and reported, never propagated.

use std::panic::{self, AssertUnwindSafe};

use postcommit_core::HandlerError;
use postcommit_tests::prelude::*;

fn flaky(id: u64, panics: bool) -> Flaky {
    Flaky { id, panics }
}

mod errors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_failing_handler_does_not_stop_siblings() {
        // GIVEN an entity whose first handler per event fails
        let mut h = Harness::new();
        h.begin().unwrap();
        let f = h.create(flaky(1, false)).unwrap();

        // WHEN
        let report = h.commit().unwrap().unwrap();

        // THEN later handlers on the same entity still ran
        assert_eq!(
            h.log().take(),
            vec!["after_commit_on_create:Flaky#1", "after_commit:Flaky#1"]
        );
        assert_eq!(report.invoked, 6);
        assert_eq!(report.failed(), 2);
        assert_eq!(report.succeeded(), 4);

        let first = &report.failures[0];
        assert_eq!(first.event, LifecycleEvent::AfterCommitOnCreate);
        assert_eq!(first.entity_type, "Flaky");
        assert_eq!(first.entity, f.key());
        assert_eq!(first.handler_index, 0);
        assert_eq!(
            first.cause,
            FailureCause::Error(HandlerError::failed(
                "after_commit_on_create refused by Flaky#1"
            ))
        );
    }

    #[test]
    fn test_failure_does_not_stop_other_entities_or_buckets() {
        // GIVEN a failing entity ahead of healthy ones in every bucket
        let mut h = Harness::new();
        let updated = h.entity(Article::new(2, "b"));
        h.begin().unwrap();
        h.create(flaky(1, false)).unwrap();
        h.create(Article::new(3, "c")).unwrap();
        h.update(&updated).unwrap();

        // WHEN
        h.commit().unwrap();

        // THEN
        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Flaky#1",
                "after_commit_on_create:Article#3",
                "after_commit_on_update:Article#2",
                "after_commit:Flaky#1",
                "after_commit:Article#3",
                "after_commit:Article#2",
            ]
        );
    }

    #[test]
    fn test_failure_in_rollback_pass_is_isolated() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(flaky(1, false)).unwrap();
        h.create(Comment::new(2, 0, "c")).unwrap();

        let report = h.rollback().unwrap().unwrap();

        assert_eq!(
            h.log().take(),
            vec!["after_rollback:Flaky#1", "after_rollback:Comment#2"]
        );
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].event, LifecycleEvent::AfterRollback);
    }

    #[test]
    fn test_sink_receives_failures_and_reports() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(flaky(1, false)).unwrap();

        let report = h.commit().unwrap().unwrap();

        assert_eq!(h.sink().failures(), report.failures);
        assert_eq!(h.sink().reports(), vec![report]);
    }

    #[test]
    fn test_next_transaction_starts_clean_after_failure() {
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(flaky(1, true)).unwrap();
        h.commit().unwrap();
        h.log().take();

        h.begin().unwrap();
        h.create(Article::new(2, "b")).unwrap();
        let report = h.commit().unwrap().unwrap();

        assert!(report.is_clean());
        assert_eq!(
            h.log().take(),
            vec![
                "after_commit_on_create:Article#2",
                "after_commit:Article#2",
            ]
        );
    }
}

mod panics {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_panicking_handler_is_caught() {
        // GIVEN
        let mut h = Harness::new();
        h.begin().unwrap();
        h.create(flaky(9, true)).unwrap();
        h.create(Article::new(1, "a")).unwrap();

        // WHEN
        let report = h.commit().unwrap().unwrap();

        // THEN each event saw one error and one panic; the loggers still ran
        assert_eq!(report.failed(), 4);
        assert_eq!(
            report.failures[1].cause,
            FailureCause::Panic("Flaky#9 panicked".to_string())
        );
        assert_eq!(h.log().count("after_commit:Flaky#9"), 1);
        assert_eq!(h.log().count("after_commit:Article#1"), 1);
        assert_eq!(h.manager().state(), TransactionState::Inactive);
    }

    #[test]
    fn test_uncaught_panic_still_resets_transaction() {
        // GIVEN panics are allowed to escape
        let mut h = Harness::with_config(DispatchConfig::new().with_catch_panics(false));
        h.begin().unwrap();
        h.create(flaky(1, true)).unwrap();

        // WHEN
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| h.commit()));

        // THEN the panic escaped, but the manager is usable again
        assert!(outcome.is_err());
        assert_eq!(h.manager().state(), TransactionState::Inactive);
        assert!(h.manager().pending().is_empty());

        h.begin().unwrap();
        h.create(Article::new(2, "b")).unwrap();
        assert!(h.commit().unwrap().unwrap().is_clean());
    }
}
