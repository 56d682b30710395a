//! Coinforge Billing - coin emission and movement workflows
//!
//! This crate implements the business core over the ledger store seam:
//!
//! 1. Emission mints an apportioned batch of coins, one minting
//!    transaction per coin, committed atomically
//! 2. Transfer moves the oldest-owned coins first and appends one
//!    transaction per moved coin, all-or-nothing
//! 3. History finds the coin with the most transactions and renders its
//!    ownership trail
//! 4. Roster streams each user's name with a current coin count
//!
//! Business failures (bad amounts, unknown users, short balances) are
//! values of [`BillingError`], not faults; only store trouble escalates
//! through the [`BillingError::Store`] variant.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use coinforge_billing::Billing;
//! use coinforge_ledger::MemoryLedger;
//!
//! let store = Arc::new(MemoryLedger::new());
//! store.add_user("boris", 5000).await?;
//! let billing = Billing::new(store);
//! billing.emit(10).await?;
//! billing.transfer("boris", "maria", 3).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use coinforge_types::{CoinId, UserId};
use futures::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod apportionment;

pub use apportionment::apportion;
pub use coinforge_ledger::{LedgerStore, MemoryLedger, StoreError};

/// Errors that can occur in billing workflows
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("user not found: {name}")]
    UserNotFound { name: String },

    #[error("insufficient balance: {user} owns {available} coin(s), requested {requested}")]
    InsufficientBalance {
        user: String,
        available: u64,
        requested: u64,
    },

    #[error("ledger state corrupt: {message}")]
    CorruptState { message: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl BillingError {
    /// Check whether this is an expected business outcome rather than a
    /// fault worth escalating
    pub fn is_business_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::UserNotFound { .. }
                | Self::InsufficientBalance { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;

/// Commit attempts for a transfer before a persistent ownership conflict
/// is treated as a fault
const MAX_TRANSFER_ATTEMPTS: u32 = 3;

/// Coins granted to one user by an emission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAllocation {
    pub user: String,
    pub coins: u64,
}

/// Outcome of one emission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionSummary {
    /// Coins minted, always the requested amount
    pub total: u64,
    /// Per-user grants in roster order
    pub allocations: Vec<UserAllocation>,
}

/// Outcome of one transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    pub source: String,
    pub destination: String,
    /// Moved coins, oldest first
    pub moved: Vec<CoinId>,
}

impl TransferSummary {
    /// Number of coins moved
    pub fn amount(&self) -> u64 {
        self.moved.len() as u64
    }
}

/// The ownership trail of one coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinProvenance {
    pub id: CoinId,
    /// Destination names of every transaction, chronological; the first
    /// entry is the minting destination
    pub trail: Vec<String>,
}

impl CoinProvenance {
    /// Render the trail as the wire-format history string
    pub fn history(&self) -> String {
        self.trail.join(";")
    }
}

/// One roster line: a user and their current coin count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub amount: u64,
}

/// The Coinforge billing facade
///
/// Stateless between calls: every workflow reads what it needs from the
/// store and commits one atomic batch. Cheap to clone and share.
#[derive(Clone)]
pub struct Billing {
    store: Arc<dyn LedgerStore>,
}

impl Billing {
    /// Create a billing facade over a ledger store
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Mint `amount` coins apportioned across the current roster
    ///
    /// Every user receives at least one coin; grants are weighted by
    /// rating via largest-remainder apportionment. The whole mint commits
    /// as one batch.
    pub async fn emit(&self, amount: u64) -> Result<EmissionSummary> {
        let users = self.store.users().await?;
        let ratings: Vec<u64> = users.iter().map(|u| u.rating).collect();
        let allocations = apportion(amount, &ratings)?;

        let minted_at = Utc::now();
        let mut batch = coinforge_ledger::MutationBatch::new();
        for (user, &count) in users.iter().zip(&allocations) {
            for _ in 0..count {
                batch = batch.mint(user.id, minted_at);
            }
        }
        self.store.commit(batch).await?;

        let allocations: Vec<UserAllocation> = users
            .into_iter()
            .zip(allocations)
            .map(|(user, coins)| UserAllocation {
                user: user.name,
                coins,
            })
            .collect();
        info!(amount, users = allocations.len(), "coins emitted");

        Ok(EmissionSummary {
            total: amount,
            allocations,
        })
    }

    /// Move `amount` coins from `source` to `destination`
    ///
    /// Selects the source's oldest-owned coins. The commit re-validates
    /// ownership, so a concurrent transfer of the same coins surfaces as a
    /// conflict and the selection is retried against fresh state.
    pub async fn transfer(
        &self,
        source: &str,
        destination: &str,
        amount: u64,
    ) -> Result<TransferSummary> {
        if amount == 0 {
            return Err(BillingError::InvalidRequest {
                message: "transfer amount must be positive".to_string(),
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;

            let src = self
                .store
                .user_by_name(source)
                .await?
                .ok_or_else(|| BillingError::UserNotFound {
                    name: source.to_string(),
                })?;
            let dst = self
                .store
                .user_by_name(destination)
                .await?
                .ok_or_else(|| BillingError::UserNotFound {
                    name: destination.to_string(),
                })?;

            let owned = self.store.coins_of(src.id).await?;
            if (owned.len() as u64) < amount {
                return Err(BillingError::InsufficientBalance {
                    user: src.name,
                    available: owned.len() as u64,
                    requested: amount,
                });
            }

            let moved_at = Utc::now();
            let selected: Vec<CoinId> = owned
                .iter()
                .take(amount as usize)
                .map(|coin| coin.id)
                .collect();
            let mut batch = coinforge_ledger::MutationBatch::new();
            for &coin in &selected {
                batch = batch.transfer(coin, src.id, dst.id, moved_at);
            }

            match self.store.commit(batch).await {
                Ok(_) => {
                    info!(%source, %destination, amount, "coins transferred");
                    return Ok(TransferSummary {
                        source: src.name,
                        destination: dst.name,
                        moved: selected,
                    });
                }
                Err(StoreError::OwnershipConflict { coin, .. })
                    if attempt < MAX_TRANSFER_ATTEMPTS =>
                {
                    debug!(%coin, attempt, "transfer raced a concurrent commit, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Find the coin with the most transactions and render its trail
    ///
    /// Returns `None` when no coins exist. Count ties resolve to the
    /// earliest-created coin, then to the lowest id.
    pub async fn longest_history(&self) -> Result<Option<CoinProvenance>> {
        let snapshot = self.store.snapshot().await?;

        let mut counts: HashMap<CoinId, u64> = HashMap::new();
        for tx in &snapshot.transactions {
            *counts.entry(tx.coin).or_default() += 1;
        }

        let best = match snapshot.coins.iter().max_by_key(|coin| {
            let count = counts.get(&coin.id).copied().unwrap_or(0);
            (count, std::cmp::Reverse(coin.created), std::cmp::Reverse(coin.id))
        }) {
            Some(coin) => coin,
            None => return Ok(None),
        };

        let names: HashMap<UserId, &str> = snapshot
            .users
            .iter()
            .map(|u| (u.id, u.name.as_str()))
            .collect();
        let mut trail = Vec::new();
        for tx in snapshot.transactions.iter().filter(|tx| tx.coin == best.id) {
            let name = names
                .get(&tx.destination)
                .ok_or_else(|| BillingError::CorruptState {
                    message: format!(
                        "transaction {} names unknown destination {}",
                        tx.id, tx.destination
                    ),
                })?;
            trail.push((*name).to_string());
        }

        Ok(Some(CoinProvenance {
            id: best.id,
            trail,
        }))
    }

    /// Stream the roster with current coin counts
    ///
    /// The counts come from one consistent snapshot taken at call time;
    /// the stream itself is lazy and restartable by calling again.
    pub async fn roster(&self) -> Result<impl Stream<Item = RosterEntry> + Send + 'static> {
        let snapshot = self.store.snapshot().await?;
        let counts = snapshot.coin_counts();

        Ok(async_stream::stream! {
            for user in snapshot.users {
                let amount = counts.get(&user.id).copied().unwrap_or(0);
                yield RosterEntry {
                    name: user.name,
                    amount,
                };
            }
        })
    }
}
