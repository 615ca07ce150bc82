use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A card on the board.
///
/// Cards live in exactly one bucket (a board column). Within a bucket they are
/// displayed in ascending `position` order, where `position` is a rank key.
/// Cards imported without a position sort after every ranked card until they
/// are repaired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub bucket: String,
    pub title: String,
    /// Rank key. `None` only for rows written outside the board.
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where a new card is placed in its bucket.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Top,
    #[default]
    Bottom,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}

/// Input for creating a card in a bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCardInput {
    pub title: String,
    /// Defaults to `Bottom`.
    #[serde(default)]
    pub placement: Option<Placement>,
}

/// A drag-and-drop move, as reported by the board.
///
/// `after` is the card that ends up directly above the moved card and
/// `before` the card directly below it. Leave both out for an empty bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveCardInput {
    /// Destination bucket. May equal the current bucket.
    pub bucket: String,
    #[serde(default)]
    pub after: Option<Uuid>,
    #[serde(default)]
    pub before: Option<Uuid>,
}

/// Input for storing a card with a position taken verbatim, e.g. rows
/// imported from another system. The position is not validated; run a
/// repair afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportCardInput {
    pub title: String,
    pub position: Option<String>,
}
