//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::rank::{Alphabet, RankGenerator, DEFAULT_ALPHABET, DEFAULT_MAX_RANK_LEN};

/// Settings shared by the server and the CLI commands.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite file (from CARDRANK_DB)
    pub database_path: PathBuf,
    /// Rank alphabet, `a-z` ranges allowed (from CARDRANK_ALPHABET)
    pub alphabet: Alphabet,
    /// Longest rank before a bucket is rebalanced (from CARDRANK_MAX_RANK_LEN)
    pub max_rank_len: usize,
}

impl Config {
    /// Load from the process environment.
    ///
    /// A bad alphabet or length is a startup error: ranks written with one
    /// alphabet can't be read with another.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_path = match lookup("CARDRANK_DB") {
            Some(path) => PathBuf::from(path),
            None => Self::default_database_path()?,
        };

        let alphabet_spec = lookup("CARDRANK_ALPHABET").unwrap_or_else(|| DEFAULT_ALPHABET.to_string());
        let alphabet = Alphabet::from_spec(&alphabet_spec)
            .with_context(|| format!("Invalid CARDRANK_ALPHABET '{}'", alphabet_spec))?;

        let max_rank_len = match lookup("CARDRANK_MAX_RANK_LEN") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid CARDRANK_MAX_RANK_LEN '{}'", raw))?,
            None => DEFAULT_MAX_RANK_LEN,
        };

        Ok(Self {
            database_path,
            alphabet,
            max_rank_len,
        })
    }

    pub fn default_database_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "cardrank")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(dirs.data_dir().join("cardrank.db"))
    }

    pub fn generator(&self) -> Result<RankGenerator> {
        RankGenerator::new(self.alphabet.clone(), self.max_rank_len)
            .context("Invalid rank configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[("CARDRANK_DB", "/tmp/cards.db")])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.alphabet, Alphabet::default());
        assert_eq!(config.max_rank_len, DEFAULT_MAX_RANK_LEN);
    }

    #[test]
    fn reads_alphabet_and_length() {
        let config = Config::from_lookup(lookup(&[
            ("CARDRANK_DB", "/tmp/cards.db"),
            ("CARDRANK_ALPHABET", "0-9"),
            ("CARDRANK_MAX_RANK_LEN", "16"),
        ]))
        .unwrap();

        assert_eq!(config.alphabet.len(), 10);
        let generator = config.generator().unwrap();
        assert_eq!(generator.first().get(), "5");
        assert_eq!(generator.max_len(), 16);
    }

    #[test]
    fn rejects_bad_alphabet() {
        let err = Config::from_lookup(lookup(&[
            ("CARDRANK_DB", "/tmp/cards.db"),
            ("CARDRANK_ALPHABET", "ba"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("CARDRANK_ALPHABET"));
    }

    #[test]
    fn rejects_bad_length() {
        assert!(Config::from_lookup(lookup(&[
            ("CARDRANK_DB", "/tmp/cards.db"),
            ("CARDRANK_MAX_RANK_LEN", "lots"),
        ]))
        .is_err());

        for too_short in ["0", "1"] {
            let config = Config::from_lookup(lookup(&[
                ("CARDRANK_DB", "/tmp/cards.db"),
                ("CARDRANK_MAX_RANK_LEN", too_short),
            ]))
            .unwrap();
            assert!(config.generator().is_err());
        }
    }
}
