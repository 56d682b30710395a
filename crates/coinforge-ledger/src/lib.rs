//! Coinforge Ledger - the store seam for users, coins and transactions
//!
//! The ledger is:
//! - Append-only (transactions are never amended or deleted)
//! - Batch-atomic (a mutation batch applies fully or not at all)
//! - Owner-consistent (a coin's owner equals its newest transaction's
//!   destination; commits that would break this are rejected)
//!
//! Workflows talk to the [`LedgerStore`] trait and never to a concrete
//! backend, so tests and the server share the same [`MemoryLedger`] while a
//! durable backend can slot in behind the trait. Reads hand out consistent
//! snapshots; writes go through [`MutationBatch`] commits validated against
//! the state they land on, which is what makes optimistic retries by the
//! caller safe.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinforge_types::{Coin, CoinId, Transaction, TransactionId, User, UserId};
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur in store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user not found: {user}")]
    UnknownUser { user: UserId },

    #[error("duplicate user name: {name}")]
    DuplicateName { name: String },

    #[error("coin not found: {coin}")]
    UnknownCoin { coin: CoinId },

    #[error("ownership conflict on coin {coin}: expected owner {expected}, found {actual}")]
    OwnershipConflict {
        coin: CoinId,
        expected: UserId,
        actual: UserId,
    },

    #[error("storage backend error: {message}")]
    Backend { message: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A coin to create, together with its implied minting transaction
#[derive(Debug, Clone)]
pub struct CoinMint {
    /// First owner of the fresh coin
    pub owner: UserId,
    /// Minting instant; also the minting transaction's timestamp
    pub created: DateTime<Utc>,
}

/// An ownership reassignment of one existing coin
#[derive(Debug, Clone)]
pub struct CoinMove {
    /// Coin to reassign
    pub coin: CoinId,
    /// Owner the caller observed; the commit fails if it went stale
    pub source: UserId,
    /// New owner
    pub destination: UserId,
    /// Instant of the change; also the movement transaction's timestamp
    pub moved_at: DateTime<Utc>,
}

/// One atomic unit of ledger mutation
///
/// Mints apply before moves. Moves are validated and applied in order, so a
/// batch may chain ownership (a→b then b→c) within itself; any move whose
/// observed source no longer matches rejects the whole batch.
#[derive(Debug, Clone, Default)]
pub struct MutationBatch {
    /// Coins to create
    pub mints: Vec<CoinMint>,
    /// Ownership changes to apply
    pub moves: Vec<CoinMove>,
}

impl MutationBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a coin creation
    pub fn mint(mut self, owner: UserId, created: DateTime<Utc>) -> Self {
        self.mints.push(CoinMint { owner, created });
        self
    }

    /// Queue an ownership change
    pub fn transfer(
        mut self,
        coin: CoinId,
        source: UserId,
        destination: UserId,
        moved_at: DateTime<Utc>,
    ) -> Self {
        self.moves.push(CoinMove {
            coin,
            source,
            destination,
            moved_at,
        });
        self
    }

    /// Check whether the batch carries no work
    pub fn is_empty(&self) -> bool {
        self.mints.is_empty() && self.moves.is_empty()
    }
}

/// Everything a committed batch created
#[derive(Debug, Clone)]
pub struct AppliedBatch {
    /// Coins created by this batch, in mint order
    pub minted: Vec<Coin>,
    /// Transactions appended by this batch (mints first, then moves)
    pub recorded: Vec<Transaction>,
}

/// A consistent view of the whole ledger at one instant
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    /// Roster in provisioning order
    pub users: Vec<User>,
    /// All coins, ascending id (equals creation order)
    pub coins: Vec<Coin>,
    /// All transactions in append order (equals chronological order)
    pub transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    /// Count coins currently owned by each user
    pub fn coin_counts(&self) -> HashMap<UserId, u64> {
        let mut counts: HashMap<UserId, u64> = HashMap::new();
        for coin in &self.coins {
            *counts.entry(coin.owner).or_default() += 1;
        }
        counts
    }
}

/// Storage backend trait
///
/// The capability set is intentionally narrow: provision users, read
/// consistent state, commit atomic batches. Business rules live above
/// this seam.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Provision a user; names are unique within the roster
    async fn add_user(&self, name: &str, rating: u64) -> Result<User>;

    /// Full roster in provisioning order
    async fn users(&self) -> Result<Vec<User>>;

    /// Look up a user by display name
    async fn user_by_name(&self, name: &str) -> Result<Option<User>>;

    /// Coins currently owned by a user, oldest creation first
    async fn coins_of(&self, owner: UserId) -> Result<Vec<Coin>>;

    /// Whole-ledger snapshot for analytical queries
    async fn snapshot(&self) -> Result<LedgerSnapshot>;

    /// Apply a mutation batch; fully applies or leaves state untouched
    async fn commit(&self, batch: MutationBatch) -> Result<AppliedBatch>;
}

#[derive(Debug, Default)]
struct LedgerState {
    users: Vec<User>,
    coins: HashMap<CoinId, Coin>,
    transactions: Vec<Transaction>,
    next_user_id: u64,
    next_coin_id: u64,
    next_transaction_id: u64,
}

impl LedgerState {
    fn new() -> Self {
        Self {
            next_user_id: 1,
            next_coin_id: 1,
            next_transaction_id: 1,
            ..Default::default()
        }
    }
}

/// In-memory ledger store
///
/// The production default and the test fake. One lock over the whole state
/// keeps snapshots torn-read-free and serializes commits.
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty in-memory ledger
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::new()),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn add_user(&self, name: &str, rating: u64) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.iter().any(|u| u.name == name) {
            return Err(StoreError::DuplicateName {
                name: name.to_string(),
            });
        }

        let user = User {
            id: UserId::new(state.next_user_id),
            name: name.to_string(),
            rating,
        };
        state.next_user_id += 1;
        state.users.push(user.clone());

        Ok(user)
    }

    async fn users(&self) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state.users.clone())
    }

    async fn user_by_name(&self, name: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.name == name).cloned())
    }

    async fn coins_of(&self, owner: UserId) -> Result<Vec<Coin>> {
        let state = self.state.read().await;
        let mut owned: Vec<Coin> = state
            .coins
            .values()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect();
        owned.sort_by_key(|c| (c.created, c.id));
        Ok(owned)
    }

    async fn snapshot(&self) -> Result<LedgerSnapshot> {
        let state = self.state.read().await;
        let mut coins: Vec<Coin> = state.coins.values().cloned().collect();
        coins.sort_by_key(|c| c.id);
        Ok(LedgerSnapshot {
            users: state.users.clone(),
            coins,
            transactions: state.transactions.clone(),
        })
    }

    async fn commit(&self, batch: MutationBatch) -> Result<AppliedBatch> {
        let mut state = self.state.write().await;

        // Validate everything against current state before touching it.
        for mint in &batch.mints {
            if !state.users.iter().any(|u| u.id == mint.owner) {
                return Err(StoreError::UnknownUser { user: mint.owner });
            }
        }

        // Track ownership as moves would land, so chained moves inside one
        // batch validate against their in-batch predecessor.
        let mut pending_owner: HashMap<CoinId, UserId> = HashMap::new();
        for mv in &batch.moves {
            for user in [mv.source, mv.destination] {
                if !state.users.iter().any(|u| u.id == user) {
                    return Err(StoreError::UnknownUser { user });
                }
            }
            let actual = match pending_owner.get(&mv.coin) {
                Some(owner) => *owner,
                None => {
                    state
                        .coins
                        .get(&mv.coin)
                        .ok_or(StoreError::UnknownCoin { coin: mv.coin })?
                        .owner
                }
            };
            if actual != mv.source {
                return Err(StoreError::OwnershipConflict {
                    coin: mv.coin,
                    expected: mv.source,
                    actual,
                });
            }
            pending_owner.insert(mv.coin, mv.destination);
        }

        // Apply: mints first, then moves, one transaction per change.
        let mut minted = Vec::with_capacity(batch.mints.len());
        let mut recorded = Vec::with_capacity(batch.mints.len() + batch.moves.len());

        for mint in &batch.mints {
            let coin = Coin {
                id: CoinId::new(state.next_coin_id),
                created: mint.created,
                owner: mint.owner,
            };
            state.next_coin_id += 1;

            let tx = Transaction::mint(
                TransactionId::new(state.next_transaction_id),
                coin.id,
                mint.owner,
                mint.created,
            );
            state.next_transaction_id += 1;

            state.coins.insert(coin.id, coin.clone());
            state.transactions.push(tx.clone());
            minted.push(coin);
            recorded.push(tx);
        }

        for mv in &batch.moves {
            let tx = Transaction::movement(
                TransactionId::new(state.next_transaction_id),
                mv.coin,
                mv.source,
                mv.destination,
                mv.moved_at,
            );
            state.next_transaction_id += 1;

            if let Some(coin) = state.coins.get_mut(&mv.coin) {
                coin.owner = mv.destination;
            }
            state.transactions.push(tx.clone());
            recorded.push(tx);
        }

        Ok(AppliedBatch { minted, recorded })
    }
}
