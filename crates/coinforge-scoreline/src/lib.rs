//! Coinforge Scoreline - match score reconstruction
//!
//! A [`Timeline`] holds score snapshots taken at known offsets from match
//! start. [`Timeline::score_at`] answers "what was the score at offset t"
//! by taking the latest snapshot at or before `t`, bounds-checked against
//! the recorded range.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when building or querying a timeline
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScorelineError {
    #[error("timeline has no snapshots")]
    EmptyTimeline,

    #[error("snapshot {index} at offset {offset} precedes the previous offset {previous}")]
    UnorderedSnapshots {
        index: usize,
        offset: i64,
        previous: i64,
    },

    #[error("offset {offset} outside the recorded range {first}..={last}")]
    OffsetOutOfRange { offset: i64, first: i64, last: i64 },
}

pub type Result<T> = std::result::Result<T, ScorelineError>;

/// A two-sided match score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    /// Create a score
    pub const fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.home, self.away)
    }
}

/// The score as observed at one offset from match start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds since match start
    pub offset: i64,
    pub score: Score,
}

impl Snapshot {
    /// Create a snapshot
    pub const fn new(offset: i64, home: u32, away: u32) -> Self {
        Self {
            offset,
            score: Score::new(home, away),
        }
    }
}

/// An ordered record of score snapshots for one match
///
/// Construction validates the sequence, so every timeline holds at least
/// one snapshot with non-decreasing offsets. When two snapshots share an
/// offset, the later one wins lookups at that offset.
#[derive(Debug, Clone)]
pub struct Timeline {
    snapshots: Vec<Snapshot>,
}

impl Timeline {
    /// Build a timeline from snapshots in recording order
    pub fn new(snapshots: Vec<Snapshot>) -> Result<Self> {
        if snapshots.is_empty() {
            return Err(ScorelineError::EmptyTimeline);
        }
        for (index, pair) in snapshots.windows(2).enumerate() {
            if pair[1].offset < pair[0].offset {
                return Err(ScorelineError::UnorderedSnapshots {
                    index: index + 1,
                    offset: pair[1].offset,
                    previous: pair[0].offset,
                });
            }
        }
        Ok(Self { snapshots })
    }

    /// The recorded snapshots
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The score at `offset`: the latest snapshot at or before it
    ///
    /// Fails with [`ScorelineError::OffsetOutOfRange`] when `offset` lies
    /// before the first or after the last recorded offset.
    pub fn score_at(&self, offset: i64) -> Result<Score> {
        let (first, last) = match (self.snapshots.first(), self.snapshots.last()) {
            (Some(first), Some(last)) => (first.offset, last.offset),
            _ => return Err(ScorelineError::EmptyTimeline),
        };
        if offset < first || offset > last {
            return Err(ScorelineError::OffsetOutOfRange {
                offset,
                first,
                last,
            });
        }

        let end = self.snapshots.partition_point(|s| s.offset <= offset);
        match end.checked_sub(1).and_then(|i| self.snapshots.get(i)) {
            Some(snapshot) => Ok(snapshot.score),
            None => Err(ScorelineError::OffsetOutOfRange {
                offset,
                first,
                last,
            }),
        }
    }

    /// The score after the last recorded snapshot
    pub fn final_score(&self) -> Score {
        self.snapshots
            .last()
            .map(|s| s.score)
            .unwrap_or(Score::new(0, 0))
    }
}
