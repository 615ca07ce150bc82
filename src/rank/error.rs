use thiserror::Error;

/// Errors raised while parsing or generating ranks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("rank must not be empty")]
    Empty,

    /// The rank contains characters outside the alphabet.
    #[error("rank provided contains an invalid char. Rank provided: {rank} - invalid chars: {}", chars.iter().map(char::to_string).collect::<Vec<_>>().join(", "))]
    InvalidChars { rank: String, chars: Vec<char> },

    /// A trailing min char carries no ordering information.
    #[error("the last char of the rank ({rank}) can't be equal to the min char ({min_char})")]
    LastCharCantBeEqualToMinChar { rank: String, min_char: char },

    #[error("rank ({rank}) is longer than the maximum of {max_len} chars")]
    MaxRankLength { rank: String, max_len: usize },

    #[error("previous rank ({prev}) is greater than or equals to next ({next})")]
    PrevGreaterThanOrEquals { prev: String, next: String },

    /// No rank fits at the requested position within the maximum length.
    /// Callers resolve this by rebalancing the bucket.
    #[error("no room for a rank near {near} within {max_len} chars")]
    ExhaustedPrecision { near: String, max_len: usize },
}

impl RankError {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ExhaustedPrecision { .. })
    }
}

/// Misconfigured alphabets. These are startup errors, never request errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphabetError {
    #[error("alphabet needs at least 2 chars, got {len}")]
    TooShort { len: usize },

    #[error("alphabet chars must be strictly ascending by code point: '{prev}' is followed by '{next}'")]
    NotAscending { prev: char, next: char },

    #[error("invalid char range '{start}-{end}' in alphabet")]
    InvalidRange { start: char, end: char },

    #[error("maximum rank length must be at least 2, got {max_len}")]
    MaxLengthTooShort { max_len: usize },
}
