//! Change notifications published after every committed mutation.

use serde::Serialize;

/// Which collection of an owner changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeScope {
    Wallets,
    Transactions,
    Categories,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Change {
    pub owner_id: String,
    pub scope: ChangeScope,
}
