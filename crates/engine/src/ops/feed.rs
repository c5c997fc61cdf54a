use base64::Engine as _;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, Select, prelude::*};

use crate::{
    EngineError, FeedFilter, FeedQuery, ResultEngine, Transaction, TransactionKind, store,
    transactions, util::require_owner,
};

use super::Engine;

/// Largest page the feed hands out, whatever the caller asks for.
const MAX_PAGE_LIMIT: u64 = 500;

/// One page of the feed plus the cursor of the next page, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FeedPage {
    pub transactions: Vec<Transaction>,
    pub next_cursor: Option<String>,
}

fn validate_filter(filter: &FeedFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

/// Owner scope, filters and the feed order: newest date first, then newest
/// insertion, then id.
fn feed_select(owner_id: &str, filter: &FeedFilter) -> Select<transactions::Entity> {
    let mut query = transactions::Entity::find()
        .filter(transactions::Column::OwnerId.eq(owner_id))
        .order_by_desc(transactions::Column::Date)
        .order_by_desc(transactions::Column::CreatedAt)
        .order_by_desc(transactions::Column::Id);
    if let Some(wallet_id) = filter.wallet_id {
        query = query.filter(transactions::Column::WalletId.eq(wallet_id));
    }
    if let Some(kind) = filter.kind {
        query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
    }
    if let Some(from) = filter.from {
        query = query.filter(transactions::Column::Date.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(transactions::Column::Date.lte(to));
    }
    query
}

fn matches_filter(filter: &FeedFilter, tx: &Transaction) -> bool {
    filter.wallet_id.is_none_or(|id| tx.wallet_id == id)
        && filter.from.is_none_or(|from| tx.date >= from)
        && filter.to.is_none_or(|to| tx.date <= to)
}

/// Sort key of the feed; the feed lists it in descending order.
fn feed_order(tx: &Transaction) -> (NaiveDate, DateTime<Utc>, Uuid) {
    (tx.date, tx.created_at, tx.id)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct FeedCursor {
    date: NaiveDate,
    created_at: DateTime<Utc>,
    transaction_id: Uuid,
}

impl FeedCursor {
    fn after(tx: &Transaction) -> Self {
        Self {
            date: tx.date,
            created_at: tx.created_at,
            transaction_id: tx.id,
        }
    }

    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid feed cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid feed cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid feed cursor".to_string()))
    }

    /// Rows strictly after this cursor in feed order.
    fn condition(&self) -> Condition {
        Condition::any()
            .add(transactions::Column::Date.lt(self.date))
            .add(
                Condition::all()
                    .add(transactions::Column::Date.eq(self.date))
                    .add(transactions::Column::CreatedAt.lt(self.created_at)),
            )
            .add(
                Condition::all()
                    .add(transactions::Column::Date.eq(self.date))
                    .add(transactions::Column::CreatedAt.eq(self.created_at))
                    .add(transactions::Column::Id.lt(self.transaction_id)),
            )
    }
}

impl Engine {
    /// One page of the owner's transactions, both kinds merged.
    ///
    /// Pagination is newest → older by `(date DESC, created_at DESC, id DESC)`.
    pub async fn feed(&self, owner_id: &str, query: &FeedQuery) -> ResultEngine<FeedPage> {
        let owner_id = require_owner(owner_id)?;
        validate_filter(&query.filter)?;
        let limit = query
            .limit
            .unwrap_or(self.config.feed_page_limit)
            .clamp(1, MAX_PAGE_LIMIT);

        let mut select = feed_select(owner_id, &query.filter).limit(limit + 1);
        if let Some(cursor) = query.cursor.as_deref() {
            select = select.filter(FeedCursor::decode(cursor)?.condition());
        }

        let rows = select.all(&self.database).await?;
        let has_more = rows.len() as u64 > limit;
        let transactions = rows
            .into_iter()
            .take(limit as usize)
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        let next_cursor = match transactions.last() {
            Some(last) if has_more => Some(FeedCursor::after(last).encode()?),
            _ => None,
        };
        Ok(FeedPage {
            transactions,
            next_cursor,
        })
    }

    /// The whole filtered feed in feed order, without pagination.
    pub async fn feed_all(
        &self,
        owner_id: &str,
        filter: &FeedFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        let owner_id = require_owner(owner_id)?;
        validate_filter(filter)?;
        let kinds = filter
            .kind
            .map_or(vec![TransactionKind::Income, TransactionKind::Expense], |kind| {
                vec![kind]
            });

        let mut all = Vec::new();
        for kind in kinds {
            let partition = store::transactions::list_all(&self.database, owner_id, kind).await?;
            all.extend(partition.into_iter().filter(|tx| matches_filter(filter, tx)));
        }
        all.sort_by(|a, b| feed_order(b).cmp(&feed_order(a)));
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_survives_encoding() {
        let cursor = FeedCursor {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            created_at: Utc::now(),
            transaction_id: Uuid::new_v4(),
        };
        let decoded = FeedCursor::decode(&cursor.encode().unwrap()).unwrap();
        assert_eq!(decoded.date, cursor.date);
        assert_eq!(decoded.created_at, cursor.created_at);
        assert_eq!(decoded.transaction_id, cursor.transaction_id);
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert!(matches!(
            FeedCursor::decode("not a cursor"),
            Err(EngineError::InvalidCursor(_))
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let filter = FeedFilter::default()
            .from(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
            .to(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert!(validate_filter(&filter).is_err());
    }
}
