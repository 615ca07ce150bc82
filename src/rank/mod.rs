//! Lexicographic rank keys for ordering cards.
//!
//! # Core Concepts
//!
//! - [`Alphabet`]: the ordered chars a rank is made of.
//! - [`Rank`]: a validated key. Plain string comparison of two ranks gives
//!   their display order.
//! - [`RankGenerator`]: creates keys before, after or between existing keys
//!   without touching any other key.
//! - [`rebalance`]: evenly re-spaces a whole bucket when the generator runs
//!   out of room ([`RankError::ExhaustedPrecision`]).
//!
//! Everything here is pure and synchronous. Serializing moves within a
//! bucket is the job of the caller (see [`crate::board`]).

mod alphabet;
mod error;
mod generator;
mod rebalance;
mod value;

pub use alphabet::{Alphabet, DEFAULT_ALPHABET};
pub use error::{AlphabetError, RankError};
pub use generator::{RankGenerator, DEFAULT_MAX_RANK_LEN};
pub use rebalance::rebalance;
pub use value::Rank;
