//! Agent configuration from `key=value` argument strings.
//!
//! Every agent is built from a whitespace-separated list of `key=value`
//! pairs, e.g. `"name=mcts role=black simulation=500 seed=7"`. Later pairs
//! override earlier ones, and `name` and `role` default to `unknown`.
//!
//! ## Recognised keys
//!
//! | key          | type   | default              |
//! |--------------|--------|----------------------|
//! | `seed`       | u64    | 1234                 |
//! | `simulation` | u32    | 100 when no timeout  |
//! | `timeout`    | ms     | none                 |
//! | `parallel`   | usize  | 1                    |
//! | `alpha`      | f32    | 0.1                  |
//! | `step`       | usize  | 1                    |
//! | `load`       | path   | none                 |
//! | `save`       | path   | none                 |
//! | `search`     | greedy / mcts | greedy        |

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_ALPHA, DEFAULT_SEED, DEFAULT_STEP};
use crate::error::ConfigError;
use crate::mcts::Budget;

/// Characters that may not appear in an agent name.
const NAME_FORBIDDEN: &[char] = &['[', ']', '(', ')', ':', ';', ' '];

/// How the TD slider turns its value function into a move.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SearchMode {
    /// One-ply expectimax over the learned value.
    #[default]
    Greedy,
    /// MCTS with the learned value as the evaluator.
    Mcts,
}

impl FromStr for SearchMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(SearchMode::Greedy),
            "mcts" => Ok(SearchMode::Mcts),
            _ => Err(()),
        }
    }
}

/// Parsed agent options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentConfig {
    meta: BTreeMap<String, String>,
}

impl AgentConfig {
    /// Parse an argument string on top of the `name`/`role` defaults.
    ///
    /// A token without `=` sets a key to itself.
    pub fn parse(args: &str) -> Result<Self, ConfigError> {
        let mut cfg = Self {
            meta: BTreeMap::new(),
        };
        let defaults = "name=unknown role=unknown".split_whitespace();
        for pair in defaults.chain(args.split_whitespace()) {
            cfg.notify(pair)?;
        }
        if cfg.name().contains(NAME_FORBIDDEN) {
            return Err(ConfigError::InvalidName(cfg.name().to_string()));
        }
        Ok(cfg)
    }

    /// Set one `key=value` pair.
    pub fn notify(&mut self, pair: &str) -> Result<(), ConfigError> {
        let (key, value) = pair.split_once('=').unwrap_or((pair, pair));
        if key.is_empty() {
            return Err(ConfigError::Malformed(pair.to_string()));
        }
        self.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    pub fn name(&self) -> &str {
        self.get("name").unwrap_or("unknown")
    }

    pub fn role(&self) -> &str {
        self.get("role").unwrap_or("unknown")
    }

    /// Parse an optional value, reporting the key on failure.
    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    /// An optional value that must not be zero.
    fn positive<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr + Default + PartialEq,
    {
        match self.parsed::<T>(key)? {
            Some(n) if n == T::default() => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: self.get(key).unwrap_or_default().to_string(),
            }),
            n => Ok(n),
        }
    }

    pub fn seed(&self) -> Result<u64, ConfigError> {
        Ok(self.parsed("seed")?.unwrap_or(DEFAULT_SEED))
    }

    /// Search budget from `simulation` and `timeout` (milliseconds).
    pub fn budget(&self) -> Result<Budget, ConfigError> {
        let iterations = self.positive("simulation")?;
        let timeout = self.positive("timeout")?.map(Duration::from_millis);
        Ok(Budget::from_limits(iterations, timeout))
    }

    /// Number of root-parallel trees.
    pub fn parallel(&self) -> Result<usize, ConfigError> {
        Ok(self.positive("parallel")?.unwrap_or(1))
    }

    pub fn alpha(&self) -> Result<f32, ConfigError> {
        Ok(self.parsed("alpha")?.unwrap_or(DEFAULT_ALPHA))
    }

    /// TD bootstrap horizon.
    pub fn step(&self) -> Result<usize, ConfigError> {
        Ok(self.positive("step")?.unwrap_or(DEFAULT_STEP))
    }

    pub fn load_path(&self) -> Option<PathBuf> {
        self.get("load").map(PathBuf::from)
    }

    pub fn save_path(&self) -> Option<PathBuf> {
        self.get("save").map(PathBuf::from)
    }

    pub fn search(&self) -> Result<SearchMode, ConfigError> {
        Ok(self.parsed("search")?.unwrap_or_default())
    }
}

impl fmt::Display for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in &self.meta {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{key}={value}")?;
            first = false;
        }
        Ok(())
    }
}
