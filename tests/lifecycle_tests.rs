//! Integration tests for the request lifecycle against an in-memory store.

use swarmdesk::db::{Database, now_ms};
use swarmdesk::error::LifecycleError;
use swarmdesk::types::{
    Entitlement, Priority, RequestStatus, SkillGroup, Submission, SupportTier,
};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn sample_submission() -> Submission {
    Submission {
        ticket: "T-1".to_string(),
        entitlement: "enterprise_premier".to_string(),
        skill_group: "data".to_string(),
        support_tier: "general_usage".to_string(),
        priority: "high".to_string(),
        issue_description: "x".to_string(),
        help_required: "y".to_string(),
    }
}

/// Create a request and attach `key` as its announcement id.
fn announced(db: &Database, key: &str) -> i64 {
    let request = db
        .create_request(&sample_submission(), "U1", "C1")
        .expect("Failed to create request");
    db.attach_correlation_key(request.id, key)
        .expect("Failed to attach key");
    request.id
}

mod creation_tests {
    use super::*;

    #[test]
    fn create_assigns_id_and_opens() {
        let db = setup_db();

        let request = db.create_request(&sample_submission(), "U1", "C1").unwrap();

        assert_eq!(request.id, 1);
        assert_eq!(request.status, RequestStatus::Open);
        assert!(request.created_at > 0);
        assert_eq!(request.updated_at, request.created_at);
        assert!(request.correlation_key.is_none());
        assert!(request.resolved_at.is_none());
        assert!(request.discarded_at.is_none());
    }

    #[test]
    fn create_then_lookup_returns_all_fields_intact() {
        let db = setup_db();
        let created = db.create_request(&sample_submission(), "U1", "C1").unwrap();

        let found = db.get_request(created.id).unwrap().expect("request exists");

        assert_eq!(found.ticket, "T-1");
        assert_eq!(found.entitlement, Entitlement::EnterprisePremier);
        assert_eq!(found.skill_group, SkillGroup::Data);
        assert_eq!(found.support_tier, SupportTier::GeneralUsage);
        assert_eq!(found.priority, Priority::High);
        assert_eq!(found.issue_description, "x");
        assert_eq!(found.help_required, "y");
        assert_eq!(found.user_id, "U1");
        assert_eq!(found.channel_id, "C1");
        assert_eq!(found.status, RequestStatus::Open);
    }

    #[test]
    fn create_trims_text_fields() {
        let db = setup_db();
        let submission = Submission {
            ticket: "  T-9  ".to_string(),
            ..sample_submission()
        };

        let request = db.create_request(&submission, "U1", "C1").unwrap();

        assert_eq!(request.ticket, "T-9");
    }

    #[test]
    fn create_rejects_missing_ticket() {
        let db = setup_db();
        let submission = Submission {
            ticket: "   ".to_string(),
            ..sample_submission()
        };

        let err = db.create_request(&submission, "U1", "C1").unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::MissingField { field: "ticket" }
        ));
    }

    #[test]
    fn create_rejects_unknown_enum_value() {
        let db = setup_db();
        let submission = Submission {
            entitlement: "enterprise_platinum".to_string(),
            ..sample_submission()
        };

        let err = db.create_request(&submission, "U1", "C1").unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::InvalidField {
                field: "entitlement",
                ..
            }
        ));
    }

    #[test]
    fn create_rejects_empty_description() {
        let db = setup_db();
        let submission = Submission {
            issue_description: String::new(),
            ..sample_submission()
        };

        let err = db.create_request(&submission, "U1", "C1").unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::MissingField {
                field: "issue_description"
            }
        ));
    }

    #[test]
    fn create_rejects_empty_requester() {
        let db = setup_db();

        let err = db
            .create_request(&sample_submission(), "", "C1")
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::MissingField { field: "user_id" }
        ));
    }

    #[test]
    fn invalid_submission_persists_nothing() {
        let db = setup_db();
        let submission = Submission {
            priority: "p0".to_string(),
            ..sample_submission()
        };

        let _ = db.create_request(&submission, "U1", "C1");

        assert_eq!(db.get_stats().unwrap().total, 0);
    }
}

mod correlation_tests {
    use super::*;

    #[test]
    fn attach_key_records_announcement_id() {
        let db = setup_db();
        let request = db.create_request(&sample_submission(), "U1", "C1").unwrap();

        let updated = db.attach_correlation_key(request.id, "msg-100").unwrap();

        assert_eq!(updated.correlation_key.as_deref(), Some("msg-100"));
        let found = db.find_by_key("msg-100").unwrap().expect("found by key");
        assert_eq!(found.id, request.id);
    }

    #[test]
    fn attach_key_twice_conflicts() {
        let db = setup_db();
        let id = announced(&db, "msg-1");

        let err = db.attach_correlation_key(id, "msg-2").unwrap_err();

        assert!(matches!(err, LifecycleError::KeyAlreadyAttached { .. }));
        // The original key is untouched.
        let found = db.get_request(id).unwrap().unwrap();
        assert_eq!(found.correlation_key.as_deref(), Some("msg-1"));
    }

    #[test]
    fn attach_key_in_use_by_another_request_conflicts() {
        let db = setup_db();
        announced(&db, "msg-1");
        let second = db.create_request(&sample_submission(), "U2", "C1").unwrap();

        let err = db.attach_correlation_key(second.id, "msg-1").unwrap_err();

        assert!(matches!(err, LifecycleError::KeyInUse { .. }));
    }

    #[test]
    fn attach_key_to_unknown_request_fails() {
        let db = setup_db();

        let err = db.attach_correlation_key(42, "msg-1").unwrap_err();

        assert!(matches!(err, LifecycleError::RequestNotFound { id: 42 }));
    }

    #[test]
    fn transition_on_unknown_key_fails() {
        let db = setup_db();
        announced(&db, "msg-1");

        let err = db.resolve("msg-404", None).unwrap_err();

        assert!(matches!(err, LifecycleError::KeyNotFound { .. }));
    }
}

mod transition_tests {
    use super::*;

    #[test]
    fn resolve_sets_status_and_timestamp() {
        let db = setup_db();
        announced(&db, "msg-1");

        let request = db.resolve("msg-1", Some("U2")).unwrap();

        assert_eq!(request.status, RequestStatus::Resolved);
        assert!(request.resolved_at.is_some());
        assert!(request.discarded_at.is_none());
        assert!(request.updated_at >= request.created_at);
    }

    #[test]
    fn resolve_twice_is_rejected_not_reapplied() {
        let db = setup_db();
        announced(&db, "msg-1");

        let first = db.resolve("msg-1", None).unwrap();
        let err = db.resolve("msg-1", None).unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                status: RequestStatus::Resolved,
                ..
            }
        ));
        // State unchanged by the duplicate click.
        let found = db.find_by_key("msg-1").unwrap().unwrap();
        assert_eq!(found.status, RequestStatus::Resolved);
        assert_eq!(found.resolved_at, first.resolved_at);
    }

    #[test]
    fn discard_sets_discarded_at() {
        let db = setup_db();
        announced(&db, "msg-1");

        let request = db.discard("msg-1", None).unwrap();

        assert_eq!(request.status, RequestStatus::Discarded);
        assert!(request.discarded_at.is_some());
        assert!(request.resolved_at.is_none());
    }

    #[test]
    fn discard_does_not_delete_the_row() {
        let db = setup_db();
        let id = announced(&db, "msg-1");

        db.discard("msg-1", None).unwrap();

        assert!(db.get_request(id).unwrap().is_some());
        assert_eq!(db.get_stats().unwrap().total, 1);
    }

    #[test]
    fn reopen_requires_terminal_state() {
        let db = setup_db();
        announced(&db, "msg-1");

        let err = db.reopen("msg-1", None).unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                status: RequestStatus::Open,
                ..
            }
        ));
    }

    #[test]
    fn reopen_clears_resolution_timestamps() {
        let db = setup_db();
        announced(&db, "msg-1");
        db.resolve("msg-1", None).unwrap();

        let request = db.reopen("msg-1", None).unwrap();

        assert_eq!(request.status, RequestStatus::Reopened);
        assert!(request.resolved_at.is_none());
        assert!(request.discarded_at.is_none());
    }

    #[test]
    fn reopened_request_accepts_discard() {
        let db = setup_db();
        announced(&db, "msg-1");
        db.resolve("msg-1", None).unwrap();
        db.reopen("msg-1", None).unwrap();

        let request = db.discard("msg-1", None).unwrap();

        assert_eq!(request.status, RequestStatus::Discarded);
    }

    #[test]
    fn full_round_trip_ends_discarded() {
        // Create -> attach -> resolve -> reopen -> discard.
        let db = setup_db();
        announced(&db, "msg-100");

        db.resolve("msg-100", Some("U2")).unwrap();
        db.reopen("msg-100", Some("U1")).unwrap();
        let request = db.discard("msg-100", Some("U3")).unwrap();

        assert_eq!(request.status, RequestStatus::Discarded);
        assert!(request.resolved_at.is_none());
        assert!(request.discarded_at.is_some());
    }

    #[test]
    fn worked_example_from_the_form_flow() {
        let db = setup_db();

        let request = db.create_request(&sample_submission(), "U1", "C1").unwrap();
        assert_eq!(request.id, 1);
        assert_eq!(request.status, RequestStatus::Open);

        db.attach_correlation_key(1, "msg-100").unwrap();

        let resolved = db.resolve("msg-100", None).unwrap();
        assert_eq!(resolved.status, RequestStatus::Resolved);
        assert!(resolved.resolved_at.is_some());

        let reopened = db.reopen("msg-100", None).unwrap();
        assert!(reopened.status.is_active());
        assert!(reopened.resolved_at.is_none());
    }
}

mod concurrency_tests {
    use super::*;

    #[test]
    fn concurrent_resolve_and_discard_have_one_winner() {
        let db = setup_db();
        announced(&db, "msg-1");

        let db_a = db.clone();
        let db_b = db.clone();
        let resolver = std::thread::spawn(move || db_a.resolve("msg-1", Some("U2")));
        let discarder = std::thread::spawn(move || db_b.discard("msg-1", Some("U3")));

        let resolve_result = resolver.join().unwrap();
        let discard_result = discarder.join().unwrap();

        let wins = resolve_result.is_ok() as u8 + discard_result.is_ok() as u8;
        assert_eq!(wins, 1, "exactly one click must win the race");

        for result in [&resolve_result, &discard_result] {
            if let Err(err) = result {
                assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
            }
        }

        let final_state = db.find_by_key("msg-1").unwrap().unwrap();
        match final_state.status {
            RequestStatus::Resolved => assert!(resolve_result.is_ok()),
            RequestStatus::Discarded => assert!(discard_result.is_ok()),
            other => panic!("request left in unexpected state: {other}"),
        }
    }

    #[test]
    fn duplicate_resolve_clicks_process_once() {
        let db = setup_db();
        let id = announced(&db, "msg-1");

        let db_a = db.clone();
        let db_b = db.clone();
        let first = std::thread::spawn(move || db_a.resolve("msg-1", Some("U2")));
        let second = std::thread::spawn(move || db_b.resolve("msg-1", Some("U2")));

        let results = [first.join().unwrap(), second.join().unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();

        assert_eq!(wins, 1);
        let history = db.get_request_history(id).unwrap();
        // open + exactly one resolved entry.
        assert_eq!(history.len(), 2);
    }
}

mod stats_tests {
    use super::*;

    #[test]
    fn stats_count_by_lifecycle_state() {
        let db = setup_db();
        announced(&db, "msg-1");
        announced(&db, "msg-2");
        announced(&db, "msg-3");
        announced(&db, "msg-4");

        db.resolve("msg-2", None).unwrap();
        db.discard("msg-3", None).unwrap();
        db.resolve("msg-4", None).unwrap();
        db.reopen("msg-4", None).unwrap();

        let stats = db.get_stats().unwrap();

        assert_eq!(stats.total, 4);
        // open counts both open and reopened.
        assert_eq!(stats.open, 2);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn stats_on_empty_store_are_zero() {
        let db = setup_db();

        let stats = db.get_stats().unwrap();

        assert_eq!(stats.total, 0);
        assert_eq!(stats.open, 0);
        assert_eq!(stats.resolved, 0);
        assert_eq!(stats.discarded, 0);
    }
}

mod reminder_tests {
    use super::*;

    #[test]
    fn reminder_candidates_are_old_and_active() {
        let db = setup_db();
        announced(&db, "msg-1");
        announced(&db, "msg-2");
        db.resolve("msg-2", None).unwrap();

        // Cutoff in the future: every active request qualifies.
        let candidates = db.reminder_candidates(now_ms() + 1_000).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].correlation_key.as_deref(), Some("msg-1"));

        // Cutoff in the past: nothing is old enough yet.
        let candidates = db.reminder_candidates(now_ms() - 60_000).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn reopened_requests_get_reminders_again() {
        let db = setup_db();
        announced(&db, "msg-1");
        db.resolve("msg-1", None).unwrap();
        db.reopen("msg-1", None).unwrap();

        let candidates = db.reminder_candidates(now_ms() + 1_000).unwrap();

        assert_eq!(candidates.len(), 1);
    }
}

mod history_tests {
    use super::*;

    #[test]
    fn every_transition_is_logged_in_order() {
        let db = setup_db();
        let id = announced(&db, "msg-1");

        db.resolve("msg-1", Some("U2")).unwrap();
        db.reopen("msg-1", Some("U1")).unwrap();

        let history = db.get_request_history(id).unwrap();
        let statuses: Vec<RequestStatus> = history.iter().map(|e| e.status).collect();

        assert_eq!(
            statuses,
            vec![
                RequestStatus::Open,
                RequestStatus::Resolved,
                RequestStatus::Reopened
            ]
        );
        assert_eq!(history[0].actor, None);
        assert_eq!(history[1].actor.as_deref(), Some("U2"));
    }
}

mod persistence_tests {
    use super::*;

    #[test]
    fn requests_survive_reopening_the_database() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("requests.db");

        {
            let db = Database::open(&path).unwrap();
            announced(&db, "msg-1");
            db.resolve("msg-1", None).unwrap();
        }

        let db = Database::open(&path).unwrap();
        let found = db.find_by_key("msg-1").unwrap().expect("request persisted");
        assert_eq!(found.status, RequestStatus::Resolved);
    }
}
