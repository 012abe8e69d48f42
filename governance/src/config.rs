//! Governance configuration with TOML file support.

use quorate_types::Amount;
use quorate_utils::LogFormat;
use serde::{Deserialize, Serialize};

use crate::validation::MAX_OPTIONS;
use crate::GovernanceError;

/// Configuration for a governance engine.
///
/// Can be loaded from a TOML file via [`GovernanceConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Exact fee a submission must carry, in raw units. Written as a string in
    /// TOML because it does not fit a TOML integer.
    #[serde(default = "default_proposal_fee", with = "raw_amount")]
    pub proposal_fee: Amount,

    /// Most options a proposal may offer. May tighten, never raise, [`MAX_OPTIONS`].
    #[serde(default = "default_max_options")]
    pub max_options: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_proposal_fee() -> Amount {
    Amount::from_tokens(100)
}

fn default_max_options() -> usize {
    MAX_OPTIONS
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

mod raw_amount {
    use quorate_types::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&amount.raw().to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Amount, D::Error> {
        let raw = String::deserialize(d)?;
        raw.trim()
            .parse::<u128>()
            .map(Amount::new)
            .map_err(serde::de::Error::custom)
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            proposal_fee: default_proposal_fee(),
            max_options: default_max_options(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

impl GovernanceConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, GovernanceError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| GovernanceError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, GovernanceError> {
        let config: Self = toml::from_str(s).map_err(|e| GovernanceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, GovernanceError> {
        toml::to_string_pretty(self).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), GovernanceError> {
        if self.max_options == 0 || self.max_options > MAX_OPTIONS {
            return Err(GovernanceError::Config(format!(
                "max_options must lie in 1..={}, got {}",
                MAX_OPTIONS, self.max_options
            )));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, GovernanceError> {
        self.log_format
            .parse()
            .map_err(|e: quorate_utils::LoggingError| GovernanceError::Config(e.to_string()))
    }

    /// Install the global subscriber described by `log_format` and `log_level`.
    pub fn init_logging(&self) -> Result<(), GovernanceError> {
        quorate_utils::init_logging(self.log_format()?, &self.log_level)
            .map_err(|e| GovernanceError::Config(e.to_string()))
    }
}
