use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use sea_orm::Database;
use uuid::Uuid;

use ledger::{
    CloseShiftCmd, Currency, Ledger, LedgerError, OpenShiftCmd, PostTransactionCmd, Role,
    TransactionKind, TransactionListFilter,
};
use migration::MigratorTrait;

async fn ledger_with_db() -> Ledger {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Ledger::builder().database(db).build().await.unwrap()
}

fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

async fn open_seeded_shift(ledger: &Ledger) -> Uuid {
    ledger
        .create_user("alice", "Alice", Role::Cashier, Utc::now())
        .await
        .unwrap();
    let drawer_id = ledger
        .create_drawer("Front desk", "Tashkent office", Utc::now())
        .await
        .unwrap();
    ledger
        .open_shift(
            OpenShiftCmd::new(drawer_id, "alice", at(100))
                .opening_balance(Currency::Uzs, 1_000_00),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn exchange_moves_cash_between_currency_buckets() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    ledger
        .post_transaction(
            PostTransactionCmd::new(
                shift_id,
                TransactionKind::Exchange,
                Currency::Uzs,
                625_00,
                "alice",
                at(200),
            )
            .secondary(Currency::Usd, 5_00)
            .reference("walk-in exchange"),
        )
        .await
        .unwrap();

    let balances = ledger.live_balances(shift_id).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&375_00));
    assert_eq!(balances.get(&Currency::Usd), Some(&5_00));
}

#[tokio::test]
async fn invalid_amounts_are_rejected() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    let err = ledger
        .post_transaction(PostTransactionCmd::new(
            shift_id,
            TransactionKind::In,
            Currency::Uzs,
            0,
            "alice",
            at(200),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let err = ledger
        .post_transaction(
            PostTransactionCmd::new(
                shift_id,
                TransactionKind::Exchange,
                Currency::Uzs,
                100_00,
                "alice",
                at(200),
            )
            .secondary(Currency::Uzs, 100_00),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CurrencyMismatch(_)));

    let err = ledger
        .post_transaction(PostTransactionCmd::new(
            shift_id,
            TransactionKind::Exchange,
            Currency::Uzs,
            100_00,
            "alice",
            at(200),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));

    let txs = ledger
        .list_shift_transactions(shift_id, 50, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn voided_transactions_are_excluded_from_balances() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    let tx_id = ledger
        .post_transaction(
            PostTransactionCmd::new(
                shift_id,
                TransactionKind::Out,
                Currency::Uzs,
                200_00,
                "alice",
                at(200),
            )
            .category("expense"),
        )
        .await
        .unwrap();

    let balances = ledger.live_balances(shift_id).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&800_00));

    ledger
        .void_transaction(shift_id, tx_id, "alice", at(250))
        .await
        .unwrap();

    let balances = ledger.live_balances(shift_id).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&1_000_00));

    // Second void is an error; the log entry itself is untouched.
    let err = ledger
        .void_transaction(shift_id, tx_id, "alice", at(300))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::InvalidAmount("transaction already voided".to_string()),
    );

    let visible = ledger
        .list_shift_transactions(shift_id, 50, &TransactionListFilter::default())
        .await
        .unwrap();
    assert!(visible.is_empty());

    let all = ledger
        .list_shift_transactions(
            shift_id,
            50,
            &TransactionListFilter {
                include_voided: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0].is_voided());
    assert_eq!(all[0].voided_by.as_deref(), Some("alice"));

    // The voided expense stays out of expected at close.
    let report = ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(400)).counted(Currency::Uzs, 1_000_00),
        )
        .await
        .unwrap();
    assert_eq!(report.lines[0].expected_minor, 1_000_00);
    assert_eq!(report.lines[0].discrepancy_minor, 0);
}

#[tokio::test]
async fn voiding_requires_an_open_shift() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    let tx_id = ledger
        .post_transaction(PostTransactionCmd::new(
            shift_id,
            TransactionKind::In,
            Currency::Uzs,
            100_00,
            "alice",
            at(200),
        ))
        .await
        .unwrap();

    ledger
        .close_shift(
            CloseShiftCmd::new(shift_id, "alice", at(300)).counted(Currency::Uzs, 1_100_00),
        )
        .await
        .unwrap();

    let err = ledger
        .void_transaction(shift_id, tx_id, "alice", at(400))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::ShiftNotOpen(_)));
}

#[tokio::test]
async fn idempotent_post_returns_the_same_transaction() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    let cmd = PostTransactionCmd::new(
        shift_id,
        TransactionKind::In,
        Currency::Uzs,
        150_00,
        "alice",
        at(200),
    )
    .category("sale")
    .idempotency_key("bot-update-42");

    let first = ledger.post_transaction(cmd.clone()).await.unwrap();
    let second = ledger.post_transaction(cmd).await.unwrap();
    assert_eq!(first, second);

    let txs = ledger
        .list_shift_transactions(shift_id, 50, &TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(txs.len(), 1);

    let balances = ledger.live_balances(shift_id).await.unwrap();
    assert_eq!(balances.get(&Currency::Uzs), Some(&1_150_00));
}

#[tokio::test]
async fn pagination_walks_the_whole_log_without_duplicates() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    for i in 0..3 {
        ledger
            .post_transaction(PostTransactionCmd::new(
                shift_id,
                TransactionKind::In,
                Currency::Uzs,
                100_00 + i,
                "alice",
                at(200 + i),
            ))
            .await
            .unwrap();
    }

    let filter = TransactionListFilter::default();
    let (page1, cursor) = ledger
        .list_shift_transactions_page(shift_id, 2, None, &filter)
        .await
        .unwrap();
    assert_eq!(page1.len(), 2);
    let cursor = cursor.expect("more pages expected");

    let (page2, cursor2) = ledger
        .list_shift_transactions_page(shift_id, 2, Some(&cursor), &filter)
        .await
        .unwrap();
    assert_eq!(page2.len(), 1);
    assert!(cursor2.is_none());

    let ids: HashSet<Uuid> = page1.iter().chain(page2.iter()).map(|tx| tx.id).collect();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn list_filter_by_kind_and_business_time() {
    let ledger = ledger_with_db().await;
    let shift_id = open_seeded_shift(&ledger).await;

    ledger
        .post_transaction(PostTransactionCmd::new(
            shift_id,
            TransactionKind::In,
            Currency::Uzs,
            100_00,
            "alice",
            at(200),
        ))
        .await
        .unwrap();
    ledger
        .post_transaction(PostTransactionCmd::new(
            shift_id,
            TransactionKind::Out,
            Currency::Uzs,
            50_00,
            "alice",
            at(900),
        ))
        .await
        .unwrap();

    let only_in = ledger
        .list_shift_transactions(
            shift_id,
            50,
            &TransactionListFilter {
                kinds: Some(vec![TransactionKind::In]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(only_in.len(), 1);
    assert_eq!(only_in[0].kind, TransactionKind::In);

    let early = ledger
        .list_shift_transactions(
            shift_id,
            50,
            &TransactionListFilter {
                from: Some(at(0)),
                to: Some(at(500)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].occurred_at, at(200));

    let err = ledger
        .list_shift_transactions(
            shift_id,
            50,
            &TransactionListFilter {
                from: Some(at(500)),
                to: Some(at(100)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAmount(_)));
}
