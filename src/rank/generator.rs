use super::alphabet::Alphabet;
use super::error::{AlphabetError, RankError};
use super::value::Rank;

/// Longest rank the generator will produce before asking for a rebalance.
pub const DEFAULT_MAX_RANK_LEN: usize = 64;

/// Produces ranks that sort before, after or between existing ones.
///
/// The generator is a plain value: build one from the configured alphabet at
/// startup and share it by reference or clone.
#[derive(Debug, Clone)]
pub struct RankGenerator {
    alphabet: Alphabet,
    max_len: usize,
}

impl RankGenerator {
    /// `max_len` must leave room for one char past a rebalanced key, so
    /// anything below 2 is rejected.
    pub fn new(alphabet: Alphabet, max_len: usize) -> Result<Self, AlphabetError> {
        if max_len < 2 {
            return Err(AlphabetError::MaxLengthTooShort { max_len });
        }
        Ok(Self { alphabet, max_len })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Parse a stored rank, enforcing the length cap on top of the
    /// alphabet invariants.
    pub fn parse(&self, value: &str) -> Result<Rank, RankError> {
        if value.chars().count() > self.max_len {
            return Err(RankError::MaxRankLength {
                rank: value.to_string(),
                max_len: self.max_len,
            });
        }
        Rank::parse(value, &self.alphabet)
    }

    /// Rank for the first item of an empty sequence.
    pub fn first(&self) -> Rank {
        Rank::from_digits(&[self.alphabet.mid_index()], &self.alphabet)
            .expect("mid index is never the min char of a valid alphabet")
    }

    /// A rank strictly less than `next`.
    pub fn before(&self, next: &Rank) -> Result<Rank, RankError> {
        let digits = next.digits(&self.alphabet)?;

        // First position with room below it: emit the midpoint between min
        // and that char. Everything before it stays as in `next`.
        if let Some(i) = digits.iter().position(|&d| d >= 2) {
            let mut out = digits[..i].to_vec();
            out.push(digits[i] / 2);
            return self.finish(out, next);
        }

        // Every char is min or min+1. Lower the last one and extend.
        let mut out = digits;
        if let Some(last) = out.last_mut() {
            *last -= 1;
        }
        out.push(self.alphabet.mid_index());
        self.finish(out, next)
    }

    /// A rank strictly greater than `prev`.
    pub fn after(&self, prev: &Rank) -> Result<Rank, RankError> {
        let digits = prev.digits(&self.alphabet)?;
        let top = self.alphabet.len() - 1;

        if let Some(i) = digits.iter().position(|&d| top - d >= 2) {
            let mut out = digits[..i].to_vec();
            out.push(midpoint(digits[i], top));
            return self.finish(out, prev);
        }

        // Every char is max or max-1: only a longer key sorts above.
        let mut out = digits;
        out.push(self.alphabet.mid_index());
        self.finish(out, prev)
    }

    /// A rank strictly between `prev` and `next`.
    pub fn between(&self, prev: &Rank, next: &Rank) -> Result<Rank, RankError> {
        if prev >= next {
            return Err(RankError::PrevGreaterThanOrEquals {
                prev: prev.get().to_string(),
                next: next.get().to_string(),
            });
        }

        let lower = prev.digits(&self.alphabet)?;
        let upper = next.digits(&self.alphabet)?;
        // One past the max index: once the output has dropped below `next`
        // at some position, later positions are unbounded above.
        let open = self.alphabet.len();

        let mut out = Vec::new();
        let mut diverged = false;
        for i in 0..self.max_len {
            let lo = lower.get(i).copied().unwrap_or(0);
            let hi = if diverged {
                open
            } else {
                upper.get(i).copied().unwrap_or(0)
            };

            if hi > lo + 1 {
                out.push(midpoint(lo, hi));
                tracing::trace!(prev = %prev, next = %next, "found room at position {}", i);
                return self.finish(out, prev);
            }

            // Equal or adjacent: keep the lower char and look one deeper.
            if hi == lo + 1 {
                diverged = true;
            }
            out.push(lo);
        }

        Err(RankError::ExhaustedPrecision {
            near: prev.get().to_string(),
            max_len: self.max_len,
        })
    }

    fn finish(&self, mut digits: Vec<usize>, near: &Rank) -> Result<Rank, RankError> {
        while digits.len() > 1 && digits.last() == Some(&0) {
            digits.pop();
        }
        if digits.len() > self.max_len {
            return Err(RankError::ExhaustedPrecision {
                near: near.get().to_string(),
                max_len: self.max_len,
            });
        }
        Rank::from_digits(&digits, &self.alphabet)
    }
}

impl Default for RankGenerator {
    fn default() -> Self {
        Self {
            alphabet: Alphabet::default(),
            max_len: DEFAULT_MAX_RANK_LEN,
        }
    }
}

fn midpoint(lo: usize, hi: usize) -> usize {
    lo + (hi - lo) / 2
}
