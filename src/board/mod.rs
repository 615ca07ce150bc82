//! Board-facing adapter over the rank engine.
//!
//! The board reports a move as "card X now sits in bucket B, below card
//! `after` and above card `before`". [`Board`] turns that into exactly one
//! new rank for X, written through a [`CardStore`]. Other cards are only
//! rewritten when the bucket has to be rebalanced.
//!
//! A [`CardStore`] is expected to run every call of one move inside a single
//! write transaction, so no two moves into the same bucket interleave.

mod error;

use uuid::Uuid;

use crate::models::Placement;
use crate::rank::{rebalance, Rank, RankGenerator};

pub use error::{BoardError, Result};

/// The slice of a card the adapter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCard {
    pub id: Uuid,
    pub bucket: String,
    pub position: Option<String>,
}

/// Persistence for card positions.
///
/// Positions compare as plain strings in the store; ranks are built so that
/// this matches rank order.
pub trait CardStore {
    fn card(&self, id: Uuid) -> anyhow::Result<Option<StoredCard>>;

    /// Cards of `bucket` in display order, unranked cards last.
    fn bucket_cards(&self, bucket: &str, exclude: Option<Uuid>) -> anyhow::Result<Vec<StoredCard>>;

    /// Number of ranked cards in `bucket` with a position strictly inside
    /// `(lower, upper)`. A missing bound is open.
    fn count_within(
        &self,
        bucket: &str,
        exclude: Option<Uuid>,
        lower: Option<&str>,
        upper: Option<&str>,
    ) -> anyhow::Result<usize>;

    /// Set one card's bucket and position.
    fn write_position(&self, id: Uuid, bucket: &str, rank: &Rank) -> anyhow::Result<()>;

    /// Bulk rewrite used by rebalancing and repairs.
    fn write_positions(&self, ranks: &[(Uuid, Rank)]) -> anyhow::Result<()>;
}

/// A move reported by the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub card: Uuid,
    pub bucket: String,
    /// Card directly above the destination slot.
    pub after: Option<Uuid>,
    /// Card directly below the destination slot.
    pub before: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    generator: RankGenerator,
}

impl Board {
    pub fn new(generator: RankGenerator) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &RankGenerator {
        &self.generator
    }

    /// Compute and persist the new rank for a moved card.
    ///
    /// Moving across buckets needs nothing from the old bucket: the card
    /// simply stops being part of it.
    pub fn move_item<S: CardStore>(&self, store: &S, request: &MoveRequest) -> Result<Rank> {
        store
            .card(request.card)?
            .ok_or(BoardError::CardNotFound { id: request.card })?;
        self.check_neighbors(store, request)?;

        let rank = match self.rank_for_move(store, request) {
            Err(e) if e.needs_rebalance() => {
                tracing::warn!(
                    bucket = %request.bucket,
                    card = %request.card,
                    "Rebalancing before retrying move: {}",
                    e
                );
                self.rebalance_bucket(store, &request.bucket, Some(request.card))?;
                self.rank_for_move(store, request)?
            }
            other => other?,
        };

        store.write_position(request.card, &request.bucket, &rank)?;
        tracing::debug!(card = %request.card, bucket = %request.bucket, rank = %rank, "Moved card");
        Ok(rank)
    }

    /// Rank for a new card at the top or bottom of `bucket`.
    ///
    /// Cards without a position are ignored.
    pub fn place<S: CardStore>(&self, store: &S, bucket: &str, placement: Placement) -> Result<Rank> {
        match self.rank_for_placement(store, bucket, placement) {
            Err(e) if e.needs_rebalance() => {
                tracing::warn!(bucket = %bucket, "Rebalancing before placing card: {}", e);
                self.rebalance_bucket(store, bucket, None)?;
                self.rank_for_placement(store, bucket, placement)
            }
            other => other,
        }
    }

    /// Re-space every card of `bucket` (minus `exclude`) in display order.
    pub fn rebalance_bucket<S: CardStore>(
        &self,
        store: &S,
        bucket: &str,
        exclude: Option<Uuid>,
    ) -> Result<Vec<(Uuid, Rank)>> {
        let ids: Vec<Uuid> = store
            .bucket_cards(bucket, exclude)?
            .into_iter()
            .map(|c| c.id)
            .collect();

        let ranks = rebalance(&self.generator, &ids)?;
        store.write_positions(&ranks)?;

        tracing::info!(bucket = %bucket, count = ranks.len(), "Rebalanced bucket");
        Ok(ranks)
    }

    fn check_neighbors<S: CardStore>(&self, store: &S, request: &MoveRequest) -> Result<()> {
        if let (Some(after), Some(before)) = (request.after, request.before) {
            if after == before {
                return Err(BoardError::SameNeighbor { id: after });
            }
        }

        for id in [request.after, request.before].into_iter().flatten() {
            if id == request.card {
                return Err(BoardError::SelfNeighbor { id });
            }
            let neighbor = store
                .card(id)?
                .ok_or(BoardError::NeighborNotFound { id })?;
            if neighbor.bucket != request.bucket {
                return Err(BoardError::NeighborInOtherBucket {
                    id,
                    expected: request.bucket.clone(),
                    actual: neighbor.bucket,
                });
            }
        }
        Ok(())
    }

    fn rank_for_move<S: CardStore>(&self, store: &S, request: &MoveRequest) -> Result<Rank> {
        let prev = request
            .after
            .map(|id| self.neighbor_rank(store, id))
            .transpose()?;
        let next = request
            .before
            .map(|id| self.neighbor_rank(store, id))
            .transpose()?;

        let rank = match (&prev, &next) {
            (Some(prev), Some(next)) => self.generator.between(prev, next)?,
            (Some(prev), None) => self.generator.after(prev)?,
            (None, Some(next)) => self.generator.before(next)?,
            (None, None) => self.generator.first(),
        };

        let count = store.count_within(
            &request.bucket,
            Some(request.card),
            prev.as_ref().map(Rank::get),
            next.as_ref().map(Rank::get),
        )?;
        if count > 0 {
            return Err(BoardError::StaleNeighbors {
                bucket: request.bucket.clone(),
                count,
            });
        }

        Ok(rank)
    }

    fn rank_for_placement<S: CardStore>(
        &self,
        store: &S,
        bucket: &str,
        placement: Placement,
    ) -> Result<Rank> {
        let cards = store.bucket_cards(bucket, None)?;
        let mut ranked = cards.iter().filter_map(|c| c.position.as_deref());
        let edge = match placement {
            Placement::Top => ranked.next(),
            Placement::Bottom => ranked.last(),
        };

        let Some(edge) = edge else {
            return Ok(self.generator.first());
        };
        let edge = self.generator.parse(edge)?;
        let rank = match placement {
            Placement::Top => self.generator.before(&edge)?,
            Placement::Bottom => self.generator.after(&edge)?,
        };
        Ok(rank)
    }

    fn neighbor_rank<S: CardStore>(&self, store: &S, id: Uuid) -> Result<Rank> {
        let card = store
            .card(id)?
            .ok_or(BoardError::NeighborNotFound { id })?;
        let position = card.position.ok_or(BoardError::MissingPosition { id })?;
        self.generator.parse(&position).map_err(BoardError::from)
    }
}

impl From<RankGenerator> for Board {
    fn from(generator: RankGenerator) -> Self {
        Self::new(generator)
    }
}
