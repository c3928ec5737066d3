use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use ledger::{
    ApprovalState, CloseShiftCmd, Currency, Ledger, LedgerError, OpenShiftCmd,
    PostTransactionCmd, Role, ShiftStatus, TransactionKind,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build().await.unwrap()
}

async fn seed_drawer(ledger: &Ledger) -> Uuid {
    ledger
        .create_user("alice", "Alice", Role::Cashier, Utc::now())
        .await
        .unwrap();
    ledger
        .create_user("mira", "Mira", Role::Manager, Utc::now())
        .await
        .unwrap();
    ledger
        .create_drawer("Front desk", "Tashkent office", Utc::now())
        .await
        .unwrap()
}

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

#[tokio::test]
async fn open_post_close_round_trip() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 1_000_00),
        )
        .await
        .unwrap();

    ledger
        .post_transaction(
            PostTransactionCmd::new(
                shift_id,
                TransactionKind::In,
                Currency::Uzs,
                500_00,
                "alice",
                at(200),
            )
            .category("sale"),
        )
        .await
        .unwrap();
    ledger
        .post_transaction(
            PostTransactionCmd::new(
                shift_id,
                TransactionKind::Out,
                Currency::Uzs,
                200_00,
                "alice",
                at(300),
            )
            .category("expense"),
        )
        .await
        .unwrap();

    let live = ledger.live_balances(shift_id).await.unwrap();
    assert_eq!(live.get(&Currency::Uzs), Some(&1_300_00));

    let report = ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(400)).counted(Currency::Uzs, 1_300_00),
        )
        .await
        .unwrap();

    assert_eq!(report.lines.len(), 1);
    let line = &report.lines[0];
    assert_eq!(line.expected_minor, 1_300_00);
    assert_eq!(line.counted_minor, 1_300_00);
    assert_eq!(line.discrepancy_minor, 0);
    assert!(!line.flagged);
    assert!(!report.has_discrepancy());

    let shift = ledger.shift(shift_id).await.unwrap();
    assert_eq!(shift.status, ShiftStatus::Closed);
    assert_eq!(shift.approval, Some(ApprovalState::Pending));
    assert_eq!(shift.closed_at, Some(at(400)));
    assert_eq!(shift.closed_by.as_deref(), Some("alice"));
}

#[tokio::test]
async fn duplicate_open_rejected() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap();

    let err = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(200)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ShiftAlreadyOpen(_)));

    // A different cashier on the same drawer is a separate pair and may open.
    ledger
        .create_user("bob", "Bob", Role::Cashier, Utc::now())
        .await
        .unwrap();
    ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "bob", at(300)))
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_opens_only_one_wins() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let first = ledger.open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)));
    let second = ledger.open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)));
    let (first, second) = tokio::join!(first, second);

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    let err = first.and(second).unwrap_err();
    assert!(matches!(err, LedgerError::ShiftAlreadyOpen(_)));

    let open = ledger.open_shifts_for_drawer(drawer_id).await.unwrap();
    assert_eq!(open.len(), 1);
}

#[tokio::test]
async fn open_requires_active_drawer_and_known_cashier() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let err = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "nobody", at(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::KeyNotFound(_)));

    ledger.set_drawer_active(drawer_id, false).await.unwrap();
    let err = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::DrawerUnavailable(_)));
}

#[tokio::test]
async fn deactivating_drawer_with_open_shift_is_rejected() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap();

    let err = ledger.set_drawer_active(drawer_id, false).await.unwrap_err();
    assert!(matches!(err, LedgerError::DrawerHasOpenShift(_)));

    ledger
        .close_shift(CloseShiftCmd::new(shift_id, "alice", at(200)))
        .await
        .unwrap();
    ledger.set_drawer_active(drawer_id, false).await.unwrap();
}

#[tokio::test]
async fn close_with_missing_currency_count_leaves_shift_open() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 1_000_00),
        )
        .await
        .unwrap();

    // The exchange touches USD, so USD needs a counted amount too.
    ledger
        .post_transaction(
            PostTransactionCmd::new(
                shift_id,
                TransactionKind::Exchange,
                Currency::Uzs,
                500_00,
                "alice",
                at(200),
            )
            .secondary(Currency::Usd, 4_00),
        )
        .await
        .unwrap();

    let err = ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(300)).counted(Currency::Uzs, 500_00),
        )
        .await
        .unwrap_err();
    assert_eq!(err, LedgerError::MissingCurrencyCount("USD".to_string()));

    let shift = ledger.shift(shift_id).await.unwrap();
    assert_eq!(shift.status, ShiftStatus::Open);

    ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(400))
                .counted(Currency::Uzs, 500_00)
                .counted(Currency::Usd, 4_00),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn post_on_closed_shift_fails() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap();
    ledger
        .close_shift(CloseShiftCmd::new(shift_id, "alice", at(200)))
        .await
        .unwrap();

    let err = ledger
        .post_transaction(PostTransactionCmd::new(
            shift_id,
            TransactionKind::In,
            Currency::Uzs,
            100_00,
            "alice",
            at(300),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ShiftNotOpen(_)));

    let txs = ledger
        .list_shift_transactions(shift_id, 50, &Default::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn close_is_transitioned_exactly_once() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap();
    ledger
        .close_shift(CloseShiftCmd::new(shift_id, "alice", at(200)))
        .await
        .unwrap();

    let err = ledger
        .close_shift(CloseShiftCmd::new(shift_id, "alice", at(300)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ShiftNotOpen(_)));
}

#[tokio::test]
async fn discrepancy_tolerance_boundary() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    // One minor unit off: within the default tolerance, not flagged.
    let shift_id = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 1_000_00),
        )
        .await
        .unwrap();
    let report = ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(200)).counted(Currency::Uzs, 1_000_01),
        )
        .await
        .unwrap();
    assert_eq!(report.lines[0].discrepancy_minor, 1);
    assert!(!report.lines[0].flagged);

    // Two minor units off: flagged.
    let shift_id = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(300))
                .opening_balance(Currency::Uzs, 1_000_01),
        )
        .await
        .unwrap();
    let report = ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(400))
                .counted(Currency::Uzs, 1_000_03)
                .reason(Currency::Uzs, "till was short"),
        )
        .await
        .unwrap();
    assert_eq!(report.lines[0].discrepancy_minor, 2);
    assert!(report.lines[0].flagged);
    assert_eq!(report.lines[0].reason.as_deref(), Some("till was short"));
}

#[tokio::test]
async fn expected_matches_recomputation_from_raw_log() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 250_00)
                .opening_balance(Currency::Usd, 40_00),
        )
        .await
        .unwrap();

    for (kind, amount) in [
        (TransactionKind::In, 120_00),
        (TransactionKind::In, 30_00),
        (TransactionKind::Out, 75_00),
    ] {
        ledger
            .post_transaction(PostTransactionCmd::new(
                shift_id,
                kind,
                Currency::Uzs,
                amount,
                "alice",
                at(200),
            ))
            .await
            .unwrap();
    }

    let live = ledger.live_balances(shift_id).await.unwrap();
    let report = ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(300))
                .counted(Currency::Uzs, 325_00)
                .counted(Currency::Usd, 40_00),
        )
        .await
        .unwrap();

    for line in &report.lines {
        assert_eq!(
            line.expected_minor,
            live.get(&line.currency).copied().unwrap_or(0),
        );
    }
}

#[tokio::test]
async fn approval_transitions_are_terminal() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap();

    // Not closed yet.
    let err = ledger
        .approve_shift(shift_id, "mira", None, at(150))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ShiftNotPendingApproval(_)));

    ledger
        .close_shift(CloseShiftCmd::new(shift_id, "alice", at(200)))
        .await
        .unwrap();
    ledger
        .approve_shift(shift_id, "mira", Some("clean close"), at(250))
        .await
        .unwrap();

    let shift = ledger.shift(shift_id).await.unwrap();
    assert_eq!(shift.approval, Some(ApprovalState::Approved));
    assert_eq!(shift.decided_by.as_deref(), Some("mira"));
    assert_eq!(shift.decided_at, Some(at(250)));

    let err = ledger
        .reject_shift(shift_id, "mira", "second thoughts", at(300))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ShiftNotPendingApproval(_)));
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let shift_id = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(100)))
        .await
        .unwrap();
    ledger
        .close_shift(CloseShiftCmd::new(shift_id, "alice", at(200)))
        .await
        .unwrap();

    let err = ledger
        .reject_shift(shift_id, "mira", "   ", at(250))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    ledger
        .reject_shift(shift_id, "mira", "counted twice, still short", at(300))
        .await
        .unwrap();
    let shift = ledger.shift(shift_id).await.unwrap();
    assert_eq!(shift.approval, Some(ApprovalState::Rejected));
    assert_eq!(
        shift.decision_notes.as_deref(),
        Some("counted twice, still short"),
    );
}

#[tokio::test]
async fn clean_close_carries_forward_into_next_shift() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let first = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 500_00),
        )
        .await
        .unwrap();
    ledger
        .close_shift(CloseShiftCmd::new(first, "alice", at(200)).counted(Currency::Uzs, 500_00))
        .await
        .unwrap();

    let second = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(300)))
        .await
        .unwrap();
    let balances = ledger.live_balances(second).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&500_00));
}

#[tokio::test]
async fn flagged_carry_forward_is_withheld_without_confirmation() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;

    let first = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 500_00),
        )
        .await
        .unwrap();
    // Counted far off expected: the close is flagged.
    let report = ledger
        .close_shift(CloseShiftCmd::new(first, "alice", at(200)).counted(Currency::Uzs, 450_00))
        .await
        .unwrap();
    assert!(report.has_discrepancy());

    let preview = ledger.carry_forward_preview(drawer_id).await.unwrap();
    assert_eq!(preview.len(), 1);
    assert!(preview[0].has_discrepancy);
    assert_eq!(preview[0].amount_minor, 450_00);
    assert_eq!(preview[0].derived_from_shift_id, first);

    // Without confirmation the flagged amount must not be reused silently.
    let second = ledger
        .open_shift(OpenShiftCmd::new(drawer_id, "alice", at(300)))
        .await
        .unwrap();
    let balances = ledger.live_balances(second).await.unwrap();
    assert!(balances.get(&Currency::Uzs).is_none());
    ledger
        .close_shift(CloseShiftCmd::new(second, "alice", at(350)))
        .await
        .unwrap();

    // Confirming the flagged template reuses its amount.
    let third = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(400)).accept_flagged_carry_forward(),
        )
        .await
        .unwrap();
    let balances = ledger.live_balances(third).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&450_00));
    ledger
        .close_shift(CloseShiftCmd::new(third, "alice", at(450)).counted(Currency::Uzs, 450_00))
        .await
        .unwrap();

    // An explicit amount always overrides the template.
    let fourth = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(500))
                .opening_balance(Currency::Uzs, 440_00),
        )
        .await
        .unwrap();
    let balances = ledger.live_balances(fourth).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&440_00));
}

#[tokio::test]
async fn drawer_balance_sums_open_shifts() {
    let ledger = ledger_with_db().await;
    let drawer_id = seed_drawer(&ledger).await;
    ledger
        .create_user("bob", "Bob", Role::Cashier, Utc::now())
        .await
        .unwrap();

    let alice_shift = ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 300_00),
        )
        .await
        .unwrap();
    ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "bob", at(100)).opening_balance(Currency::Uzs, 200_00),
        )
        .await
        .unwrap();

    ledger
        .post_transaction(PostTransactionCmd::new(
            alice_shift,
            TransactionKind::In,
            Currency::Uzs,
            50_00,
            "alice",
            at(150),
        ))
        .await
        .unwrap();

    let totals: HashMap<Currency, i64> = ledger.drawer_balance(drawer_id).await.unwrap();
    assert_eq!(totals.get(&Currency::Uzs), Some(&550_00));
}
