//! Live views over an owner's wallets and feed.
//!
//! A subscription yields the current snapshot first and then a fresh one after
//! every committed change in its scope. Bursts of changes may be coalesced;
//! a lagging receiver simply reloads. When a reload fails the last good
//! snapshot is yielded again, marked stale.

use std::future::Future;

use tokio::sync::broadcast::{self, error::RecvError};

use crate::{
    Change, ChangeScope, Engine, FeedFilter, ResultEngine, Transaction, Wallet,
    util::require_owner,
};

/// A query a subscription re-runs whenever its scope changes.
pub trait LiveQuery {
    type Output: Clone;

    /// Scopes whose changes trigger a reload.
    fn scopes(&self) -> &[ChangeScope];

    fn load(
        &self,
        engine: &Engine,
        owner_id: &str,
    ) -> impl Future<Output = ResultEngine<Self::Output>> + Send;
}

/// All wallets of the owner.
#[derive(Clone, Debug, Default)]
pub struct WalletsQuery;

impl LiveQuery for WalletsQuery {
    type Output = Vec<Wallet>;

    fn scopes(&self) -> &[ChangeScope] {
        &[ChangeScope::Wallets]
    }

    fn load(
        &self,
        engine: &Engine,
        owner_id: &str,
    ) -> impl Future<Output = ResultEngine<Self::Output>> + Send {
        engine.list_wallets(owner_id)
    }
}

/// The whole filtered feed of the owner.
#[derive(Clone, Debug, Default)]
pub struct FeedWatch {
    pub filter: FeedFilter,
}

impl LiveQuery for FeedWatch {
    type Output = Vec<Transaction>;

    fn scopes(&self) -> &[ChangeScope] {
        &[ChangeScope::Transactions]
    }

    fn load(
        &self,
        engine: &Engine,
        owner_id: &str,
    ) -> impl Future<Output = ResultEngine<Self::Output>> + Send {
        engine.feed_all(owner_id, &self.filter)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot<T> {
    pub data: T,
    /// The reload failed and `data` is the previous snapshot.
    pub stale: bool,
}

pub struct Subscription<Q: LiveQuery> {
    engine: Engine,
    owner_id: String,
    query: Q,
    changes: broadcast::Receiver<Change>,
    primed: bool,
    last: Option<Q::Output>,
}

pub type WalletSubscription = Subscription<WalletsQuery>;
pub type FeedSubscription = Subscription<FeedWatch>;

impl<Q: LiveQuery> Subscription<Q> {
    fn new(engine: &Engine, owner_id: &str, query: Q) -> ResultEngine<Self> {
        let owner_id = require_owner(owner_id)?.to_string();
        Ok(Self {
            changes: engine.changes(),
            engine: engine.clone(),
            owner_id,
            query,
            primed: false,
            last: None,
        })
    }

    /// Waits for the next snapshot.
    ///
    /// The first call returns immediately with the current state. Returns
    /// `None` when the change bus closes. An error is returned only when a
    /// load fails before any snapshot was produced.
    pub async fn next(&mut self) -> Option<ResultEngine<Snapshot<Q::Output>>> {
        if !self.wait_for_change().await {
            return None;
        }
        match self.query.load(&self.engine, &self.owner_id).await {
            Ok(data) => {
                self.last = Some(data.clone());
                Some(Ok(Snapshot { data, stale: false }))
            }
            Err(err) => {
                tracing::warn!(owner_id = %self.owner_id, "subscription reload failed: {err}");
                match &self.last {
                    Some(last) => Some(Ok(Snapshot {
                        data: last.clone(),
                        stale: true,
                    })),
                    None => Some(Err(err)),
                }
            }
        }
    }

    /// Stops listening. Dropping the subscription has the same effect.
    pub fn unsubscribe(self) {
        tracing::debug!(owner_id = %self.owner_id, "unsubscribed");
    }

    async fn wait_for_change(&mut self) -> bool {
        if !self.primed {
            self.primed = true;
            return true;
        }
        loop {
            match self.changes.recv().await {
                Ok(change) => {
                    if change.owner_id == self.owner_id
                        && self.query.scopes().contains(&change.scope)
                    {
                        self.drain_pending();
                        return true;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(owner_id = %self.owner_id, skipped, "subscription lagged");
                    return true;
                }
                Err(RecvError::Closed) => return false,
            }
        }
    }

    /// Coalesce changes that are already queued: one reload covers them all.
    fn drain_pending(&mut self) {
        while self.changes.try_recv().is_ok() {}
    }
}

impl Engine {
    /// Live list of the owner's wallets.
    pub fn subscribe_wallets(&self, owner_id: &str) -> ResultEngine<WalletSubscription> {
        Subscription::new(self, owner_id, WalletsQuery)
    }

    /// Live, filtered feed of the owner's transactions.
    pub fn subscribe_feed(
        &self,
        owner_id: &str,
        filter: FeedFilter,
    ) -> ResultEngine<FeedSubscription> {
        Subscription::new(self, owner_id, FeedWatch { filter })
    }
}
