//! Configuration schema for agentix.toml.

use crate::types::ExtractOptions;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentixConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Extraction behaviour.
    pub extract: ExtractOptions,

    /// Directory scanning.
    pub scan: ScanConfig,
}

/// Settings for `agentix scan`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Only files whose path relative to the scan root starts with this.
    pub module_prefix: String,
}

impl Default for AgentixConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            extract: ExtractOptions::default(),
            scan: ScanConfig::default(),
        }
    }
}
