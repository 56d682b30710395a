//! Ledger model types for Coinforge
//!
//! A `Coin` always carries at least one `Transaction` (its minting record);
//! every later transaction records one ownership change. The chain is
//! append-only, and the destination of the newest transaction must equal
//! the coin's current owner.

use crate::{CoinId, TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A ledger participant with a fixed proportional weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identity
    pub id: UserId,
    /// Display name, unique within the roster
    pub name: String,
    /// Emission weight; immutable after provisioning
    pub rating: u64,
}

/// An indivisible unit of value with a single current owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Store-assigned identity
    pub id: CoinId,
    /// Minting instant
    pub created: DateTime<Utc>,
    /// Current owner; must equal the destination of the newest transaction
    pub owner: UserId,
}

/// One ownership change (or minting) of exactly one coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned identity
    pub id: TransactionId,
    /// Instant the change took effect
    pub created: DateTime<Utc>,
    /// The coin this record belongs to
    pub coin: CoinId,
    /// Previous owner; `None` only for the minting record
    pub source: Option<UserId>,
    /// New owner
    pub destination: UserId,
}

impl Transaction {
    /// Build a minting record: no source, destination owns the fresh coin
    pub fn mint(id: TransactionId, coin: CoinId, destination: UserId, created: DateTime<Utc>) -> Self {
        Self {
            id,
            created,
            coin,
            source: None,
            destination,
        }
    }

    /// Build an ownership-change record between two users
    pub fn movement(
        id: TransactionId,
        coin: CoinId,
        source: UserId,
        destination: UserId,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            created,
            coin,
            source: Some(source),
            destination,
        }
    }

    /// Check whether this is the synthetic minting record
    pub fn is_mint(&self) -> bool {
        self.source.is_none()
    }
}
