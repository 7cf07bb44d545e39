//! Runtime configuration: protection mode and per-request settings

use serde::{Deserialize, Deserializer, Serialize};

/// Protection strictness mode.
///
/// `Off` is a true kill switch: no rule runs at all, including
/// blocklist and sanction checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Off,
    Relaxed,
    Balanced,
    Strict,
}

impl Mode {
    /// Parse a mode string, falling back to the most protective mode.
    /// A garbled stored value must never silently disable protection.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "off" => Mode::Off,
            "relaxed" => Mode::Relaxed,
            "balanced" => Mode::Balanced,
            "strict" => Mode::Strict,
            _ => Mode::Strict,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Off => "OFF",
            Mode::Relaxed => "RELAXED",
            Mode::Balanced => "BALANCED",
            Mode::Strict => "STRICT",
        }
    }
}

// Lenient on the wire too: an unknown mode from a stale client
// deserializes as STRICT rather than failing the request.
impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Mode::parse_lenient(&raw))
    }
}

/// Per-request settings, read once at the start of an evaluation.
/// A settings change never mutates an analysis already in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SentrySettings {
    pub mode: Mode,
    pub domain_checks_enabled: bool,
    pub address_intel_enabled: bool,
    /// Upgrade a HIGH outcome to BLOCK after policy evaluation
    pub block_high_risk_as_block: bool,
}

impl Default for SentrySettings {
    fn default() -> Self {
        Self {
            mode: Mode::Balanced,
            domain_checks_enabled: true,
            address_intel_enabled: true,
            block_high_risk_as_block: false,
        }
    }
}

impl SentrySettings {
    /// Load settings from environment variables, keeping defaults
    /// for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: std::env::var("SENTRY_MODE")
                .map(|raw| Mode::parse_lenient(&raw))
                .unwrap_or(defaults.mode),
            domain_checks_enabled: env_flag("SENTRY_DOMAIN_CHECKS", defaults.domain_checks_enabled),
            address_intel_enabled: env_flag("SENTRY_ADDRESS_INTEL", defaults.address_intel_enabled),
            block_high_risk_as_block: env_flag(
                "SENTRY_BLOCK_HIGH_RISK",
                defaults.block_high_risk_as_block,
            ),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
