//! One CLI invocation's view of the state file.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use docvc_sdk::{
    DocumentVersion, DocumentVersioning, EngineConfig, HybridLogicalClock, InMemoryVersionStore,
    StoreSnapshot, VersionId,
};

use crate::cli::Cli;

pub struct Session {
    pub engine: DocumentVersioning,
    pub document: String,
    pub project: String,
    pub author: String,
    store: Arc<InMemoryVersionStore>,
    state_path: PathBuf,
}

impl Session {
    /// Load the state file (missing means empty) and the engine config.
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = EngineConfig::load(&cli.config)
            .with_context(|| format!("reading config {}", cli.config.display()))?;
        let snapshot = StoreSnapshot::load(&cli.state)
            .with_context(|| format!("reading state file {}", cli.state.display()))?;

        // Stamps must sort after everything already recorded, even when the
        // wall clock has not moved since the last invocation.
        let clock = Arc::new(HybridLogicalClock::new(config.node_id));
        if let Some(latest) = snapshot.versions.iter().map(|v| v.timestamp).max() {
            clock.update(&latest);
        }
        debug!(
            versions = snapshot.versions.len(),
            branches = snapshot.branches.len(),
            "state loaded"
        );

        let store = Arc::new(InMemoryVersionStore::from_snapshot(snapshot));
        let engine = DocumentVersioning::with_clock(store.clone(), clock, config);
        Ok(Self {
            engine,
            document: cli.document.clone(),
            project: cli.project.clone(),
            author: cli.author.clone(),
            store,
            state_path: cli.state.clone(),
        })
    }

    /// Write the store back to the state file.
    pub fn save(&self) -> anyhow::Result<()> {
        self.store
            .snapshot()?
            .save(&self.state_path)
            .with_context(|| format!("writing state file {}", self.state_path.display()))
    }

    pub fn default_branch(&self) -> &str {
        &self.engine.config().default_branch
    }

    /// Resolve a version reference: a version id, `branch@1.3`, `1.3` on
    /// the default branch, or a branch name meaning its head.
    pub async fn resolve_version(&self, reference: &str) -> anyhow::Result<DocumentVersion> {
        if let Ok(id) = reference.parse::<VersionId>() {
            return Ok(self.engine.get_version(&id).await?);
        }
        if let Some((branch, number)) = reference.split_once('@') {
            return Ok(self.engine.find_version(&self.document, branch, number).await?);
        }
        if reference.starts_with(|c: char| c.is_ascii_digit()) {
            let branch = self.default_branch();
            return Ok(self.engine.find_version(&self.document, branch, reference).await?);
        }
        let branch = self.engine.get_branch(&self.document, reference).await?;
        Ok(self.engine.get_version(&branch.head_version_id).await?)
    }
}
