//! Mapping between engine types and API bodies.

use api_types::{
    TransactionKind as ApiKind,
    category::CategoryView,
    transaction::TransactionView,
    wallet::{Totals as ApiTotals, WalletView},
};
use engine::{Category, Money, Totals, Transaction, TransactionKind, Wallet};

use crate::ServerError;

pub(crate) fn kind_from_api(kind: ApiKind) -> TransactionKind {
    match kind {
        ApiKind::Income => TransactionKind::Income,
        ApiKind::Expense => TransactionKind::Expense,
    }
}

pub(crate) fn kind_to_api(kind: TransactionKind) -> ApiKind {
    match kind {
        TransactionKind::Income => ApiKind::Income,
        TransactionKind::Expense => ApiKind::Expense,
    }
}

pub(crate) fn parse_money(value: &str) -> Result<Money, ServerError> {
    Ok(value.parse::<Money>()?)
}

pub(crate) fn wallet_view(wallet: Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name,
        initial_balance: wallet.initial_balance.to_string(),
        balance: wallet.balance.to_string(),
        income_total: wallet.income_total.to_string(),
        expense_total: wallet.expense_total.to_string(),
        created_at: wallet.created_at,
    }
}

pub(crate) fn totals_view(totals: Totals) -> ApiTotals {
    ApiTotals {
        balance: totals.balance.to_string(),
        income: totals.income.to_string(),
        expense: totals.expense.to_string(),
    }
}

pub(crate) fn category_view(category: Category) -> CategoryView {
    CategoryView {
        id: category.id,
        kind: kind_to_api(category.kind),
        name: category.name,
    }
}

pub(crate) fn transaction_view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: kind_to_api(tx.kind),
        category: tx.category,
        amount: tx.amount.to_string(),
        wallet_id: tx.wallet_id,
        wallet_name: tx.wallet_name,
        description: tx.description,
        date: tx.date,
        created_at: tx.created_at,
    }
}
