//! Coinforge Types - Canonical domain types for the coin ledger
//!
//! This crate contains the foundational types for Coinforge with zero
//! dependencies on other coinforge crates:
//!
//! - Identity types (UserId, CoinId, TransactionId)
//! - The ledger model (User, Coin, Transaction)
//!
//! # Architectural Invariants
//!
//! These types encode the core ledger rules:
//!
//! 1. A coin has exactly one current owner at any time
//! 2. A coin's first transaction is its minting record and has no source
//! 3. Transactions are append-only; the last one names the current owner
//! 4. Ids are store-assigned sequences starting at 1 — id 0 is never a
//!    real entity, which keeps it free for "nothing here" wire sentinels

pub mod identity;
pub mod model;

pub use identity::*;
pub use model::*;

/// Version of the Coinforge types schema
pub const TYPES_VERSION: &str = "0.1.0";
