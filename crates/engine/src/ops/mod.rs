use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;

use crate::{Change, ChangeScope, EngineConfig, ResultEngine};

mod categories;
mod feed;
mod ledger;
mod wallets;

pub use feed::FeedPage;
pub use wallets::Totals;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// The block must only use the transaction handle: an in-memory SQLite pool
/// has a single connection.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Ledger engine. Cheap to clone: clones share the pool and the change bus.
#[derive(Clone, Debug)]
pub struct Engine {
    database: DatabaseConnection,
    config: EngineConfig,
    changes: broadcast::Sender<Change>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Raw change notifications. Prefer the typed subscriptions.
    pub fn changes(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    /// Notify subscribers. Call only after the unit of work committed.
    pub(crate) fn publish(&self, owner_id: &str, scopes: &[ChangeScope]) {
        for scope in scopes {
            // No receivers is not an error.
            let _ = self.changes.send(Change {
                owner_id: owner_id.to_string(),
                scope: *scope,
            });
        }
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let (changes, _) = broadcast::channel(self.config.change_buffer.max(1));
        Ok(Engine {
            database: self.database,
            config: self.config,
            changes,
        })
    }
}
