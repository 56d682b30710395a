//! Largest-remainder coin apportionment
//!
//! Splits an integer coin budget among weighted users so the parts sum to
//! the budget exactly. Implements the Hare-quota method in integer
//! arithmetic: floors and fractional-part ordering match the real-valued
//! formulation with no floating-point drift.

use crate::{BillingError, Result};

/// Apportion `total_coins` among users weighted by `ratings`
///
/// Returns one allocation per rating, aligned by index with the input.
/// Every user receives at least one coin; the allocations always sum to
/// `total_coins` exactly.
///
/// Fails with [`BillingError::InvalidRequest`] when `ratings` is empty or
/// `total_coins` is below the user count.
pub fn apportion(total_coins: u64, ratings: &[u64]) -> Result<Vec<u64>> {
    if ratings.is_empty() {
        return Err(BillingError::InvalidRequest {
            message: "cannot apportion coins among an empty user set".to_string(),
        });
    }

    let user_count = ratings.len() as u64;
    if total_coins < user_count {
        return Err(BillingError::InvalidRequest {
            message: format!("coin amount must be at least the user count ({user_count})"),
        });
    }

    // One coin per user is reserved up front; only the rest is weighted.
    let remaining = total_coins - user_count;
    let mut allocations = vec![1u64; ratings.len()];
    if remaining == 0 {
        return Ok(allocations);
    }

    let total_rating: u128 = ratings.iter().map(|r| *r as u128).sum();
    if total_rating == 0 {
        // Degenerate quota: spread the rest uniformly, earlier users first.
        let base = remaining / user_count;
        let extra = (remaining % user_count) as usize;
        for (index, allocation) in allocations.iter_mut().enumerate() {
            *allocation += base + u64::from(index < extra);
        }
        return Ok(allocations);
    }

    // share = rating / (total_rating / remaining), computed exactly as
    // rating * remaining / total_rating. The 128-bit product cannot
    // overflow for any pair of u64 inputs.
    let mut fractions: Vec<(usize, u128)> = Vec::with_capacity(ratings.len());
    let mut distributed = 0u64;
    for (index, &rating) in ratings.iter().enumerate() {
        let scaled = rating as u128 * remaining as u128;
        allocations[index] += (scaled / total_rating) as u64;
        distributed += (scaled / total_rating) as u64;
        fractions.push((index, scaled % total_rating));
    }

    // At most user_count - 1 coins are still undistributed. They go to the
    // largest fractional parts; the sort is stable, so input order breaks
    // ties.
    fractions.sort_by(|a, b| b.1.cmp(&a.1));
    let mut leftover = remaining - distributed;
    for (index, _) in fractions {
        if leftover == 0 {
            break;
        }
        allocations[index] += 1;
        leftover -= 1;
    }

    Ok(allocations)
}
