//! Index configuration with TOML persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{IndexError, IndexResult};

/// Environment variable naming a config file to load when none is given.
pub const CONFIG_ENV: &str = "DINDEX_CONFIG";

/// Tunables of one decayed ranking score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreParams {
    /// Vote weight is divided by this before the logarithm.
    pub rshares_scale: i64,
    /// Seconds of age worth one order of magnitude of vote weight.
    pub decay_seconds: i64,
}

impl ScoreParams {
    /// Hot ranking: responds within hours.
    pub const HOT: Self = Self {
        rshares_scale: 10_000_000,
        decay_seconds: 10_000,
    };

    /// Trending ranking: decays 48 times slower than hot.
    pub const TRENDING: Self = Self {
        rshares_scale: 10_000_000,
        decay_seconds: 480_000,
    };
}

/// Configuration of the discovery index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Ceiling on the parent-chain cascade; matches the ledger's reply depth limit.
    #[serde(default = "default_max_reply_depth")]
    pub max_reply_depth: usize,
    /// Maximum metadata tags taken per content item.
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
    /// Add the content's root category to its tags.
    #[serde(default = "default_include_category")]
    pub include_category: bool,
    #[serde(default = "default_hot")]
    pub hot: ScoreParams,
    #[serde(default = "default_trending")]
    pub trending: ScoreParams,
}

fn default_max_reply_depth() -> usize {
    255
}

fn default_max_tags() -> usize {
    5
}

fn default_include_category() -> bool {
    true
}

fn default_hot() -> ScoreParams {
    ScoreParams::HOT
}

fn default_trending() -> ScoreParams {
    ScoreParams::TRENDING
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_reply_depth: default_max_reply_depth(),
            max_tags: default_max_tags(),
            include_category: default_include_category(),
            hot: default_hot(),
            trending: default_trending(),
        }
    }
}

impl IndexConfig {
    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> IndexResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            IndexError::Config(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> IndexResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| IndexError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve the config using priority order:
    /// 1. Explicit path (CLI arg)
    /// 2. DINDEX_CONFIG environment variable
    /// 3. Built-in defaults
    pub fn resolve(explicit: Option<&Path>) -> IndexResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            return Self::load(&PathBuf::from(env_path));
        }
        Ok(Self::default())
    }

    /// Reject tunables that would break score monotonicity or the cascade.
    pub fn validate(&self) -> IndexResult<()> {
        for (label, params) in [("hot", self.hot), ("trending", self.trending)] {
            if params.rshares_scale <= 0 || params.decay_seconds <= 0 {
                return Err(IndexError::Config(format!(
                    "{label} score tunables must be positive: {params:?}"
                )));
            }
        }
        if self.max_reply_depth == 0 {
            return Err(IndexError::Config("max_reply_depth must be positive".into()));
        }
        Ok(())
    }
}
