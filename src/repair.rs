//! Position analysis and repair.
//!
//! Rows imported from elsewhere can arrive without a position, with a
//! position the alphabet can't parse, or sharing a position with another
//! card. Planning works per bucket on cards in display order and never
//! touches storage; see `Database::repair_positions` for applying a plan.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::board::StoredCard;
use crate::models::{PositionAnalysis, RepairStrategy};
use crate::rank::{rebalance, Rank, RankError, RankGenerator};

/// Summarize the state of stored positions.
pub fn analyze(generator: &RankGenerator, cards: &[StoredCard]) -> PositionAnalysis {
    let mut analysis = PositionAnalysis {
        total: cards.len(),
        ..Default::default()
    };
    let mut seen: HashMap<(&str, &str), usize> = HashMap::new();

    for card in cards {
        *analysis.buckets.entry(card.bucket.clone()).or_default() += 1;
        match card.position.as_deref() {
            None => analysis.missing_positions += 1,
            Some(p) if generator.parse(p).is_err() => analysis.invalid_positions += 1,
            Some(p) => *seen.entry((card.bucket.as_str(), p)).or_default() += 1,
        }
    }

    analysis.duplicates = seen.values().filter(|&&n| n > 1).count();
    analysis
}

/// New ranks for one bucket under `strategy`.
///
/// `cards` must be in display order. `only` limits which cards may receive
/// a new rank (empty means all); it is ignored by `Regenerate`, which always
/// re-spaces the whole bucket. If a fix runs out of room the bucket is
/// regenerated instead. Only cards whose position actually changes are
/// returned.
pub fn plan_bucket(
    generator: &RankGenerator,
    cards: &[StoredCard],
    strategy: RepairStrategy,
    only: &[Uuid],
) -> Result<Vec<(Uuid, Rank)>, RankError> {
    let planned = match strategy {
        RepairStrategy::Regenerate => regenerate(generator, cards),
        _ => match fix(generator, cards, strategy, only) {
            Err(e) if e.is_exhausted() => {
                tracing::warn!("Repair ran out of room, regenerating bucket: {}", e);
                regenerate(generator, cards)
            }
            other => other,
        },
    }?;

    let old: HashMap<Uuid, Option<&str>> = cards
        .iter()
        .map(|c| (c.id, c.position.as_deref()))
        .collect();
    Ok(planned
        .into_iter()
        .filter(|(id, rank)| old.get(id).copied().flatten() != Some(rank.get()))
        .collect())
}

fn regenerate(generator: &RankGenerator, cards: &[StoredCard]) -> Result<Vec<(Uuid, Rank)>, RankError> {
    let ids: Vec<Uuid> = cards.iter().map(|c| c.id).collect();
    rebalance(generator, &ids)
}

fn fix(
    generator: &RankGenerator,
    cards: &[StoredCard],
    strategy: RepairStrategy,
    only: &[Uuid],
) -> Result<Vec<(Uuid, Rank)>, RankError> {
    let eligible = |id: &Uuid| only.is_empty() || only.contains(id);

    // Valid ranks in display order; everything else counts as missing.
    let mut ranked: Vec<(Uuid, Rank)> = Vec::new();
    let mut missing: Vec<Uuid> = Vec::new();
    for card in cards {
        match card.position.as_deref().map(|p| generator.parse(p)) {
            Some(Ok(rank)) => ranked.push((card.id, rank)),
            _ => missing.push(card.id),
        }
    }

    let mut changes: BTreeMap<Uuid, Rank> = BTreeMap::new();

    if strategy.fixes_duplicates() {
        let mut i = 0;
        while i < ranked.len() {
            let group_rank = ranked[i].1.clone();
            let mut end = i + 1;
            while end < ranked.len() && ranked[end].1 == group_rank {
                end += 1;
            }
            let upper = ranked.get(end).map(|(_, r)| r.clone());

            let mut lower = group_rank;
            for (id, _) in &ranked[i + 1..end] {
                if !eligible(id) {
                    continue;
                }
                let rank = match &upper {
                    Some(upper) => generator.between(&lower, upper)?,
                    None => generator.after(&lower)?,
                };
                changes.insert(*id, rank.clone());
                lower = rank;
            }
            i = end;
        }
    }

    if strategy.fixes_missing() {
        let mut last = ranked
            .iter()
            .map(|(id, r)| changes.get(id).unwrap_or(r))
            .max()
            .cloned();
        for id in missing.iter().filter(|id| eligible(*id)) {
            let rank = match &last {
                Some(last) => generator.after(last)?,
                None => generator.first(),
            };
            changes.insert(*id, rank.clone());
            last = Some(rank);
        }
    }

    // Keep display order for readable plans.
    Ok(cards
        .iter()
        .filter_map(|c| changes.remove(&c.id).map(|r| (c.id, r)))
        .collect())
}
