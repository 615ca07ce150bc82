use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

use super::alphabet::Alphabet;
use super::error::RankError;

/// A validated position key.
///
/// Ranks compare lexicographically with the shorter operand padded by the
/// alphabet's min char. Because a rank never ends in the min char, two ranks
/// compare equal only when their strings are equal.
#[derive(Debug, Clone)]
pub struct Rank {
    value: String,
    pad: char,
}

impl Rank {
    pub fn parse(value: &str, alphabet: &Alphabet) -> Result<Self, RankError> {
        let Some(last) = value.chars().last() else {
            return Err(RankError::Empty);
        };

        let mut invalid: Vec<char> = value.chars().filter(|c| !alphabet.contains(*c)).collect();
        if !invalid.is_empty() {
            invalid.dedup();
            return Err(RankError::InvalidChars {
                rank: value.to_string(),
                chars: invalid,
            });
        }

        if last == alphabet.min_char() {
            return Err(RankError::LastCharCantBeEqualToMinChar {
                rank: value.to_string(),
                min_char: alphabet.min_char(),
            });
        }

        Ok(Self {
            value: value.to_string(),
            pad: alphabet.min_char(),
        })
    }

    /// Build from alphabet indices produced by the generator.
    pub(crate) fn from_digits(digits: &[usize], alphabet: &Alphabet) -> Result<Self, RankError> {
        Self::parse(&alphabet.encode(digits), alphabet)
    }

    pub fn get(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Alphabet indices of every char.
    pub(crate) fn digits(&self, alphabet: &Alphabet) -> Result<Vec<usize>, RankError> {
        self.value
            .chars()
            .map(|c| {
                alphabet.index_of(c).map_err(|_| RankError::InvalidChars {
                    rank: self.value.clone(),
                    chars: vec![c],
                })
            })
            .collect()
    }
}

impl PartialEq for Rank {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Rank {}

impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.value.chars();
        let mut right = other.value.chars();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (l, r) => {
                    let l = l.unwrap_or(self.pad);
                    let r = r.unwrap_or(other.pad);
                    match l.cmp(&r) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    }
                }
            }
        }
    }
}

impl Hash for Rank {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for Rank {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}
