use std::sync::Arc;

use chrono::{Duration, Utc};

use estate_access_server::error::AppError;
use estate_access_server::models::access_code::{CodeClass, GenerateCodeRequest};
use estate_access_server::models::access_log::{AccessStatus, Direction};
use estate_access_server::services::validation::{UNKNOWN_PARTY, ValidateInput};

use crate::helpers::{MockAccessStore, active_code, engine, generator, test_issuer, utc};

fn attempt(code: &str, direction: Direction) -> ValidateInput {
    ValidateInput {
        code: code.to_string(),
        direction,
        validator: "guard@estate.test".to_string(),
    }
}

fn statuses(store: &MockAccessStore) -> Vec<AccessStatus> {
    store.logs().iter().map(|l| l.status).collect()
}

#[tokio::test]
async fn should_retire_one_shot_code_after_entry() {
    let store = MockAccessStore::with_codes(vec![active_code(
        "K7P2QX",
        CodeClass::Single,
        false,
        false,
        None,
    )]);
    let uc = engine(&store);

    let first = uc.execute(attempt("K7P2QX", Direction::Entry)).await.unwrap();
    assert!(first.granted);
    assert_eq!(first.message, "Entry granted");

    let stored = store.code("K7P2QX");
    assert_eq!(stored.usage_count, 1);
    assert!(!stored.is_active, "one-shot code should retire on entry");

    for direction in [Direction::Entry, Direction::Exit] {
        let again = uc.execute(attempt("K7P2QX", direction)).await.unwrap();
        assert!(!again.granted);
        assert_eq!(again.message, "Code has already been used");
    }

    assert_eq!(store.code("K7P2QX").usage_count, 1);
    assert_eq!(
        statuses(&store),
        vec![
            AccessStatus::Success,
            AccessStatus::AlreadyUsed,
            AccessStatus::AlreadyUsed
        ]
    );
}

#[tokio::test]
async fn should_allow_one_entry_and_one_exit() {
    let store = MockAccessStore::with_codes(vec![active_code(
        "PAIR22",
        CodeClass::Single,
        false,
        true,
        None,
    )]);
    let uc = engine(&store);

    let entry = uc.execute(attempt("PAIR22", Direction::Entry)).await.unwrap();
    assert!(entry.granted);
    let stored = store.code("PAIR22");
    assert_eq!((stored.usage_count, stored.is_active), (1, true));

    let exit = uc.execute(attempt("PAIR22", Direction::Exit)).await.unwrap();
    assert!(exit.granted);
    assert_eq!(exit.message, "Exit granted");
    let stored = store.code("PAIR22");
    assert_eq!((stored.usage_count, stored.is_active), (2, false));

    let third = uc.execute(attempt("PAIR22", Direction::Entry)).await.unwrap();
    assert!(!third.granted);
    assert_eq!(third.message, "Code has already been used");
    assert_eq!(store.code("PAIR22").usage_count, 2);
}

#[tokio::test]
async fn should_retire_group_code_on_limit_without_counting_exits() {
    let store = MockAccessStore::with_codes(vec![active_code(
        "GRP333",
        CodeClass::Group,
        true,
        true,
        Some(3),
    )]);
    let uc = engine(&store);

    for direction in [
        Direction::Entry,
        Direction::Exit,
        Direction::Entry,
        Direction::Exit,
        Direction::Exit,
    ] {
        assert!(uc.execute(attempt("GRP333", direction)).await.unwrap().granted);
    }
    let stored = store.code("GRP333");
    assert_eq!((stored.usage_count, stored.is_active), (2, true));

    let third_entry = uc.execute(attempt("GRP333", Direction::Entry)).await.unwrap();
    assert!(third_entry.granted);
    assert_eq!(third_entry.detail.unwrap().usage_count, Some(3));

    let stored = store.code("GRP333");
    assert_eq!((stored.usage_count, stored.is_active), (3, false));
}

#[tokio::test]
async fn should_log_expired_code_without_touching_usage() {
    let mut code = active_code("OLD777", CodeClass::Single, true, true, Some(5));
    code.valid_from = Utc::now() - Duration::days(2);
    code.valid_until = Utc::now() - Duration::days(1);
    code.usage_count = 2;
    let store = MockAccessStore::with_codes(vec![code.clone()]);

    let response = engine(&store)
        .execute(attempt("OLD777", Direction::Entry))
        .await
        .unwrap();

    assert!(!response.granted);
    assert_eq!(response.message, "Code has expired");
    let detail = response.detail.unwrap();
    assert_eq!(detail.valid_from, Some(code.valid_from));
    assert_eq!(detail.valid_until, Some(code.valid_until));

    let stored = store.code("OLD777");
    assert_eq!(stored.usage_count, 2);
    assert!(!stored.is_active, "touched code past its window should retire");
    assert_eq!(statuses(&store), vec![AccessStatus::Expired]);
}

#[tokio::test]
async fn should_log_unknown_code_as_invalid() {
    let store = MockAccessStore::new();

    let response = engine(&store)
        .execute(attempt("nope99", Direction::Entry))
        .await
        .unwrap();

    assert!(!response.granted);
    assert_eq!(response.message, "Invalid code");
    assert!(response.detail.is_none());

    let logs = store.logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, AccessStatus::Invalid);
    assert_eq!(logs[0].visitor_name, UNKNOWN_PARTY);
    assert_eq!(logs[0].resident_name, UNKNOWN_PARTY);
    assert_eq!(logs[0].code, "NOPE99");
    assert_eq!(logs[0].code_id, None);
    assert_eq!(logs[0].validated_by, "guard@estate.test");
}

#[tokio::test]
async fn should_log_refused_exit_as_invalid() {
    let store = MockAccessStore::with_codes(vec![active_code(
        "ENTRY2",
        CodeClass::Single,
        true,
        false,
        None,
    )]);

    let response = engine(&store)
        .execute(attempt("ENTRY2", Direction::Exit))
        .await
        .unwrap();

    assert!(!response.granted);
    assert_eq!(response.message, "This code is only valid for entry");
    assert_eq!(store.code("ENTRY2").usage_count, 0);
    assert_eq!(statuses(&store), vec![AccessStatus::Invalid]);
}

#[tokio::test]
async fn should_match_code_case_insensitively_and_report_unit() {
    let code = active_code("ABC234", CodeClass::Single, true, true, None);
    let store = MockAccessStore::with_codes(vec![code.clone()]).with_unit(code.resident_id, "B12");

    let response = engine(&store)
        .execute(attempt("  abc234 ", Direction::Entry))
        .await
        .unwrap();

    assert!(response.granted);
    let detail = response.detail.unwrap();
    assert_eq!(detail.visitor_label, "Ada Obi");
    assert_eq!(detail.resident_name, "Chinedu Eze");
    assert_eq!(detail.unit_number.as_deref(), Some("B12"));
    assert_eq!(detail.is_multi_use, Some(true));
    assert_eq!(detail.usage_count, Some(1));

    let logs = store.logs();
    assert_eq!(logs[0].code_id, Some(code.id));
    assert_eq!(logs[0].unit_number.as_deref(), Some("B12"));
    assert_eq!(logs[0].usage_count, Some(1));
}

#[tokio::test]
async fn should_reject_blank_code_before_touching_storage() {
    let store = MockAccessStore::new();

    let result = engine(&store).execute(attempt("   ", Direction::Entry)).await;

    assert!(
        matches!(result, Err(AppError::InvalidRequest(_))),
        "expected InvalidRequest, got {result:?}"
    );
    assert!(store.logs().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_grant_exactly_one_concurrent_entry_on_one_shot_code() {
    let store = MockAccessStore::with_codes(vec![active_code(
        "RACE42",
        CodeClass::Single,
        false,
        false,
        None,
    )]);
    let uc = Arc::new(engine(&store));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let uc = Arc::clone(&uc);
            tokio::spawn(async move { uc.execute(attempt("RACE42", Direction::Entry)).await })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().granted {
            granted += 1;
        }
    }

    assert_eq!(granted, 1, "exactly one gate scan may win");
    assert_eq!(store.code("RACE42").usage_count, 1);
    assert_eq!(store.logs().len(), 16, "every attempt is audited");
}

#[tokio::test]
async fn should_validate_local_window_against_utc() {
    let store = MockAccessStore::new();

    // 08:00-10:00 estate time is 07:00-09:00 UTC
    let created = generator(&store)
        .generate(
            test_issuer(),
            GenerateCodeRequest {
                visitor_label: Some("Ada Obi".to_string()),
                valid_from: Some("2025-03-01T08:00".to_string()),
                valid_until: Some("2025-03-01T10:00".to_string()),
                is_multi_use: Some(true),
                allow_exit: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(created.valid_from, utc("2025-03-01T07:00:00Z"));
    assert_eq!(created.valid_until, utc("2025-03-01T09:00:00Z"));

    let uc = engine(&store);

    let early = uc
        .execute_at(attempt(&created.code, Direction::Entry), utc("2025-03-01T06:59:00Z"))
        .await
        .unwrap();
    assert_eq!(early.message, "Code has expired");
    assert!(store.code(&created.code).is_active, "early attempt keeps code");

    let inside = uc
        .execute_at(attempt(&created.code, Direction::Entry), utc("2025-03-01T08:30:00Z"))
        .await
        .unwrap();
    assert!(inside.granted, "09:30 estate time is inside the window");

    let late = uc
        .execute_at(attempt(&created.code, Direction::Exit), utc("2025-03-01T09:30:00Z"))
        .await
        .unwrap();
    assert_eq!(late.message, "Code has expired");
}
