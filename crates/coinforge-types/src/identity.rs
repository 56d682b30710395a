//! Identity types for Coinforge
//!
//! All identity types are strongly typed wrappers around store-assigned
//! sequence numbers to prevent accidental mixing of different ID types.
//! The store hands them out starting at 1, so 0 never names a real entity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate ID types with common implementations
macro_rules! define_id_type {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw sequence value
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Get the raw sequence value
            pub const fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

define_id_type!(UserId, "Unique identifier for a ledger user");
define_id_type!(CoinId, "Unique identifier for a minted coin");
define_id_type!(TransactionId, "Unique identifier for a coin transaction");
