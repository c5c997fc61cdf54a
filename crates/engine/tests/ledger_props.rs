//! Property-based tests for the wallet aggregate.
//!
//! - Every mix of record, amend and retire keeps each wallet on the ledger
//!   identity and its totals equal to the live transactions.
//! - Recompute restores any corrupted aggregate.

use chrono::NaiveDate;
use proptest::prelude::*;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{Amendment, Engine, FeedFilter, Money, RecordCmd, TransactionKind, Wallet};
use migration::MigratorTrait;

const WALLETS: usize = 3;

#[derive(Clone, Debug)]
enum Op {
    Record { wallet: usize, kind: TransactionKind, cents: i64 },
    AmendAmount { pick: usize, cents: i64 },
    AmendKind { pick: usize },
    AmendWallet { pick: usize, wallet: usize },
    Retire { pick: usize },
    RetireTwice { pick: usize },
}

/// Strategy to generate positive amounts (0.01 to 10,000.00).
fn positive_cents() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

fn kind_strategy() -> impl Strategy<Value = TransactionKind> {
    prop_oneof![Just(TransactionKind::Income), Just(TransactionKind::Expense)]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..WALLETS, kind_strategy(), positive_cents())
            .prop_map(|(wallet, kind, cents)| Op::Record { wallet, kind, cents }),
        1 => (any::<usize>(), positive_cents()).prop_map(|(pick, cents)| Op::AmendAmount { pick, cents }),
        1 => any::<usize>().prop_map(|pick| Op::AmendKind { pick }),
        1 => (any::<usize>(), 0..WALLETS).prop_map(|(pick, wallet)| Op::AmendWallet { pick, wallet }),
        1 => any::<usize>().prop_map(|pick| Op::Retire { pick }),
        1 => any::<usize>().prop_map(|pick| Op::RetireTwice { pick }),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

async fn engine_with_wallets() -> (Engine, DatabaseConnection, Vec<Wallet>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();

    let mut wallets = Vec::with_capacity(WALLETS);
    for (i, initial) in [0i64, 10_000, -2_500].into_iter().enumerate() {
        let wallet = engine
            .create_wallet("alice", &format!("Wallet {i}"), Money::new(initial))
            .await
            .unwrap();
        wallets.push(wallet);
    }
    (engine, db, wallets)
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn sum_cents(filter: FeedFilter, txs: &[engine::Transaction]) -> i64 {
    txs.iter()
        .filter(|tx| filter.kind.is_none_or(|kind| tx.kind == kind))
        .filter(|tx| filter.wallet_id.is_none_or(|id| tx.wallet_id == id))
        .map(|tx| tx.amount.cents())
        .sum()
}

/// Checks every wallet against the live transactions and the owner totals
/// against the wallets.
async fn check_books(engine: &Engine, wallets: &[Wallet]) -> Result<(), TestCaseError> {
    let live = engine
        .feed_all("alice", &FeedFilter::default())
        .await
        .unwrap();
    let mut balance = 0i64;
    for wallet in wallets {
        let current = engine.wallet("alice", wallet.id).await.unwrap();
        let income = sum_cents(
            FeedFilter::default()
                .wallet_id(wallet.id)
                .kind(TransactionKind::Income),
            &live,
        );
        let expense = sum_cents(
            FeedFilter::default()
                .wallet_id(wallet.id)
                .kind(TransactionKind::Expense),
            &live,
        );
        prop_assert_eq!(current.income_total.cents(), income);
        prop_assert_eq!(current.expense_total.cents(), expense);
        prop_assert_eq!(
            current.balance.cents(),
            current.initial_balance.cents() + income - expense,
            "wallet {} breaks the ledger identity",
            current.name
        );
        prop_assert_eq!(current.initial_balance, wallet.initial_balance);
        balance += current.balance.cents();
    }

    let totals = engine.totals("alice").await.unwrap();
    prop_assert_eq!(totals.balance.cents(), balance);
    prop_assert_eq!(
        totals.income.cents(),
        sum_cents(FeedFilter::default().kind(TransactionKind::Income), &live)
    );
    prop_assert_eq!(
        totals.expense.cents(),
        sum_cents(FeedFilter::default().kind(TransactionKind::Expense), &live)
    );
    Ok(())
}

async fn apply(
    engine: &Engine,
    wallets: &[Wallet],
    live: &mut Vec<Uuid>,
    retired: &mut Vec<Uuid>,
    op: Op,
) -> Result<(), TestCaseError> {
    match op {
        Op::Record { wallet, kind, cents } => {
            let cmd = RecordCmd::new("alice", kind, wallets[wallet].id, Money::new(cents), day())
                .category("Misc");
            let tx = engine.record(cmd).await.unwrap();
            live.push(tx.id);
        }
        Op::AmendAmount { pick, cents } if !live.is_empty() => {
            let id = live[pick % live.len()];
            let amendment = Amendment {
                amount: Some(Money::new(cents)),
                ..Amendment::default()
            };
            let amended = engine.amend("alice", id, amendment).await.unwrap();
            prop_assert_eq!(amended.id, id);
            prop_assert_eq!(amended.amount, Money::new(cents));
        }
        Op::AmendKind { pick } if !live.is_empty() => {
            let slot = pick % live.len();
            let current = engine
                .feed_all("alice", &FeedFilter::default())
                .await
                .unwrap()
                .into_iter()
                .find(|tx| tx.id == live[slot])
                .unwrap();
            let flipped = match current.kind {
                TransactionKind::Income => TransactionKind::Expense,
                TransactionKind::Expense => TransactionKind::Income,
            };
            let amendment = Amendment {
                kind: Some(flipped),
                ..Amendment::default()
            };
            let amended = engine.amend("alice", current.id, amendment).await.unwrap();
            prop_assert_eq!(amended.kind, flipped);
            prop_assert_eq!(amended.amount, current.amount);
            live[slot] = amended.id;
        }
        Op::AmendWallet { pick, wallet } if !live.is_empty() => {
            let id = live[pick % live.len()];
            let amendment = Amendment {
                wallet_id: Some(wallets[wallet].id),
                ..Amendment::default()
            };
            let amended = engine.amend("alice", id, amendment).await.unwrap();
            prop_assert_eq!(amended.wallet_id, wallets[wallet].id);
        }
        Op::Retire { pick } if !live.is_empty() => {
            let id = live.swap_remove(pick % live.len());
            prop_assert!(engine.retire("alice", id).await.unwrap());
            retired.push(id);
        }
        Op::RetireTwice { pick } if !live.is_empty() => {
            let id = live.swap_remove(pick % live.len());
            prop_assert!(engine.retire("alice", id).await.unwrap());
            prop_assert!(!engine.retire("alice", id).await.unwrap());
            retired.push(id);
        }
        Op::Retire { pick } | Op::RetireTwice { pick } if !retired.is_empty() => {
            let id = retired[pick % retired.len()];
            prop_assert!(!engine.retire("alice", id).await.unwrap());
        }
        _ => {}
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any sequence of ledger operations keeps every wallet consistent with
    /// its live transactions after each step.
    #[test]
    fn prop_operations_keep_wallets_consistent(
        ops in prop::collection::vec(op_strategy(), 1..24),
    ) {
        runtime().block_on(async {
            let (engine, _db, wallets) = engine_with_wallets().await;
            let mut live = Vec::new();
            let mut retired = Vec::new();
            for op in ops {
                apply(&engine, &wallets, &mut live, &mut retired, op).await?;
                check_books(&engine, &wallets).await?;
            }
            let feed = engine
                .feed_all("alice", &FeedFilter::default())
                .await
                .unwrap();
            prop_assert_eq!(feed.len(), live.len());
            Ok(())
        })?;
    }

    /// Recompute rebuilds the aggregate from the transactions whatever the
    /// stored totals were.
    #[test]
    fn prop_recompute_converges(
        records in prop::collection::vec((kind_strategy(), positive_cents()), 0..8),
        balance in any::<i32>(),
        income in any::<i32>(),
        expense in any::<i32>(),
    ) {
        runtime().block_on(async {
            let (engine, db, wallets) = engine_with_wallets().await;
            let wallet = &wallets[1];
            for (kind, cents) in records {
                let cmd = RecordCmd::new("alice", kind, wallet.id, Money::new(cents), day())
                    .category("Misc");
                engine.record(cmd).await.unwrap();
            }
            let healthy = engine.wallet("alice", wallet.id).await.unwrap();

            db.execute(Statement::from_sql_and_values(
                db.get_database_backend(),
                "UPDATE wallets SET balance = ?, income_total = ?, expense_total = ? WHERE id = ?",
                vec![
                    i64::from(balance).into(),
                    i64::from(income).into(),
                    i64::from(expense).into(),
                    wallet.id.into(),
                ],
            ))
            .await
            .unwrap();

            let rebuilt = engine.recompute("alice", wallet.id).await.unwrap();
            prop_assert_eq!(rebuilt.balance, healthy.balance);
            prop_assert_eq!(rebuilt.income_total, healthy.income_total);
            prop_assert_eq!(rebuilt.expense_total, healthy.expense_total);
            prop_assert_eq!(rebuilt.initial_balance, healthy.initial_balance);
            check_books(&engine, &wallets).await
        })?;
    }
}
