use thiserror::Error;
use uuid::Uuid;

use crate::rank::RankError;

pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors from moving, placing or rebalancing cards.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("card not found: {id}")]
    CardNotFound { id: Uuid },

    #[error("neighbor card not found: {id}")]
    NeighborNotFound { id: Uuid },

    #[error("neighbor card {id} is in bucket '{actual}', not '{expected}'")]
    NeighborInOtherBucket {
        id: Uuid,
        expected: String,
        actual: String,
    },

    #[error("card {id} can't be its own neighbor")]
    SelfNeighbor { id: Uuid },

    #[error("card {id} was given as both the card above and the card below")]
    SameNeighbor { id: Uuid },

    #[error("neighbor card {id} has no position")]
    MissingPosition { id: Uuid },

    /// The board's view of the bucket is out of date: other cards sit where
    /// the moved card should go.
    #[error("neighbors are not adjacent in bucket '{bucket}': {count} other cards sit in between")]
    StaleNeighbors { bucket: String, count: usize },

    #[error(transparent)]
    Rank(#[from] RankError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl BoardError {
    /// Whether re-spacing the bucket and retrying can resolve the error.
    pub fn needs_rebalance(&self) -> bool {
        match self {
            Self::MissingPosition { .. } => true,
            Self::Rank(RankError::ExhaustedPrecision { .. })
            | Self::Rank(RankError::PrevGreaterThanOrEquals { .. }) => true,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::CardNotFound { .. } | Self::NeighborNotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for BoardError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.into())
    }
}
