use std::fmt;
use std::str::FromStr;

use super::error::{AlphabetError, RankError};

/// Digits, upper case then lower case: 62 chars, ascending in ASCII.
pub const DEFAULT_ALPHABET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The ordered set of characters a rank is built from.
///
/// Characters are kept in strictly ascending code point order, so the alphabet
/// order matches the byte order of the UTF-8 encoded rank. A plain
/// `ORDER BY position` in SQLite therefore sorts cards correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    pub fn new(chars: &str) -> Result<Self, AlphabetError> {
        let chars: Vec<char> = chars.chars().collect();
        if chars.len() < 2 {
            return Err(AlphabetError::TooShort { len: chars.len() });
        }
        for pair in chars.windows(2) {
            if pair[0] >= pair[1] {
                return Err(AlphabetError::NotAscending {
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self { chars })
    }

    /// Parse a spec with `a-z` style ranges, e.g. `0-9A-Za-z`.
    ///
    /// A `-` that is first or last is taken literally.
    pub fn from_spec(spec: &str) -> Result<Self, AlphabetError> {
        let raw: Vec<char> = spec.chars().collect();
        let mut expanded = String::new();
        let mut i = 0;
        while i < raw.len() {
            if i + 2 < raw.len() && raw[i + 1] == '-' {
                let (start, end) = (raw[i], raw[i + 2]);
                if start >= end {
                    return Err(AlphabetError::InvalidRange { start, end });
                }
                expanded.extend(start..=end);
                i += 3;
            } else {
                expanded.push(raw[i]);
                i += 1;
            }
        }
        Self::new(&expanded)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn min_char(&self) -> char {
        self.chars[0]
    }

    pub fn max_char(&self) -> char {
        self.chars[self.chars.len() - 1]
    }

    /// Index of the middle char, used for first ranks and length extension.
    pub fn mid_index(&self) -> usize {
        self.chars.len() / 2
    }

    pub fn index_of(&self, c: char) -> Result<usize, RankError> {
        self.chars
            .binary_search(&c)
            .map_err(|_| RankError::InvalidChars {
                rank: c.to_string(),
                chars: vec![c],
            })
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.binary_search(&c).is_ok()
    }

    /// Panics if `index >= len()`; indices come from `index_of` or are
    /// computed within range by the generator.
    pub fn char_at(&self, index: usize) -> char {
        self.chars[index]
    }

    pub(crate) fn encode(&self, digits: &[usize]) -> String {
        digits.iter().map(|&d| self.chars[d]).collect()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            chars: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}

impl FromStr for Alphabet {
    type Err = AlphabetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_spec(s)
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
