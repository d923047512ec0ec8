//! Engine configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use docvc_graph::GraphConfig;
use docvc_retention::RetentionPolicy;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Branch written when a caller names none.
    pub default_branch: String,
    /// A version with more changes than this gets an automatic restore point.
    pub significant_change_threshold: usize,
    /// Head compare-and-swap attempts before a write gives up.
    pub max_head_retries: u32,
    /// Node id stamped into every timestamp by this process.
    pub node_id: u16,
    /// History length returned when a caller gives no limit.
    pub history_page_size: usize,
    pub retention: RetentionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let graph = GraphConfig::default();
        Self {
            default_branch: graph.default_branch,
            significant_change_threshold: graph.significant_change_threshold,
            max_head_retries: graph.max_head_retries,
            node_id: 0,
            history_page_size: graph.history_page_size,
            retention: RetentionPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(contents: &str) -> SdkResult<Self> {
        toml::from_str(contents).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            default_branch: self.default_branch.clone(),
            significant_change_threshold: self.significant_change_threshold,
            max_head_retries: self.max_head_retries,
            history_page_size: self.history_page_size,
        }
    }
}
