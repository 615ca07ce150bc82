use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Health report of the stored positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionAnalysis {
    pub total: usize,
    /// Cards with a `NULL` position.
    pub missing_positions: usize,
    /// Cards whose position is not a valid rank for the configured alphabet.
    pub invalid_positions: usize,
    /// Number of rank values held by more than one card of the same bucket.
    pub duplicates: usize,
    /// Card count per bucket.
    pub buckets: BTreeMap<String, usize>,
}

/// How a repair run rewrites positions.
///
/// - `Regenerate`: re-space every card of each bucket, keeping display order
/// - `FixMissing`: append unranked cards to the tail of their bucket
/// - `FixDuplicates`: give every card but the first of a duplicate group a fresh rank
/// - `FixAll`: duplicates first, then missing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    Regenerate,
    FixMissing,
    FixDuplicates,
    #[default]
    FixAll,
}

impl RepairStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regenerate => "regenerate",
            Self::FixMissing => "fix_missing",
            Self::FixDuplicates => "fix_duplicates",
            Self::FixAll => "fix_all",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.replace('-', "_").as_str() {
            "regenerate" => Some(Self::Regenerate),
            "fix_missing" => Some(Self::FixMissing),
            "fix_duplicates" => Some(Self::FixDuplicates),
            "fix_all" => Some(Self::FixAll),
            _ => None,
        }
    }

    pub fn fixes_missing(&self) -> bool {
        matches!(self, Self::FixMissing | Self::FixAll)
    }

    pub fn fixes_duplicates(&self) -> bool {
        matches!(self, Self::FixDuplicates | Self::FixAll)
    }
}

/// Restricts a repair run. Empty lists mean "everything".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairFilter {
    #[serde(default)]
    pub buckets: Vec<String>,
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

impl RepairFilter {
    pub fn matches_bucket(&self, bucket: &str) -> bool {
        self.buckets.is_empty() || self.buckets.iter().any(|b| b == bucket)
    }
}

/// One position rewrite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PositionChange {
    pub card_id: Uuid,
    pub old: Option<String>,
    pub new: String,
}

/// Every rewrite a repair run would apply, grouped by bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairPlan {
    pub strategy: RepairStrategy,
    pub changes: BTreeMap<String, Vec<PositionChange>>,
}

impl RepairPlan {
    pub fn len(&self) -> usize {
        self.changes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
