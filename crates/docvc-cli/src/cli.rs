use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docvc",
    about = "docvc: version control for structured documents",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// JSON file holding every version, branch, and restore point
    #[arg(long, global = true, default_value = "docvc-state.json")]
    pub state: PathBuf,

    /// Engine configuration (TOML); defaults apply when missing
    #[arg(long, global = true, default_value = "docvc.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true, default_value = "default")]
    pub document: String,

    #[arg(long, global = true, default_value = "default")]
    pub project: String,

    #[arg(long, global = true, default_value = "anonymous")]
    pub author: String,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Record the content of a JSON file as a new version
    Commit(CommitArgs),
    /// Show version history
    Log(LogArgs),
    /// Show a specific version
    Show(ShowArgs),
    /// Create a branch from an existing version
    Branch(BranchArgs),
    /// List branches
    Branches,
    /// Merge one branch into another
    Merge(MergeArgs),
    /// Compare two versions
    Diff(DiffArgs),
    /// Write a new version restoring an earlier one's content
    Rollback(RollbackArgs),
    /// Bookmark a version
    RestorePoint(RestorePointArgs),
    /// List restore points
    RestorePoints,
    /// Delete old versions under the retention policy
    Cleanup(CleanupArgs),
    /// Make a branch read-only
    Archive(ArchiveArgs),
    /// Check a version's hash and change set
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct CommitArgs {
    /// JSON file with the document content
    pub file: PathBuf,
    #[arg(short, long, default_value = "Update document")]
    pub message: String,
    #[arg(short, long)]
    pub branch: Option<String>,
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub snapshot: bool,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short, long)]
    pub branch: Option<String>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub oneline: bool,
}

/// Versions are named by id, `branch@1.3`, `1.3` on the default branch,
/// or a branch name for its head.
#[derive(Args)]
pub struct ShowArgs {
    pub version: String,
    /// Print the full content
    #[arg(long)]
    pub content: bool,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: String,
    /// Base version; defaults to the head of the default branch
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct MergeArgs {
    pub source: String,
    /// Target branch; defaults to the default branch
    #[arg(long)]
    pub into: Option<String>,
    #[arg(long, default_value = "three-way")]
    pub strategy: String,
    #[arg(short, long)]
    pub message: Option<String>,
    /// Decide a conflict: `path=source|target|both`
    #[arg(long = "take")]
    pub take: Vec<String>,
    /// Resolve a conflict with a value: `path=<json>`
    #[arg(long = "set")]
    pub set: Vec<String>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub from: String,
    pub to: String,
}

#[derive(Args)]
pub struct RollbackArgs {
    pub version: String,
    #[arg(short, long)]
    pub message: Option<String>,
}

#[derive(Args)]
pub struct RestorePointArgs {
    pub version: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct CleanupArgs {
    /// Defaults to the configured retention policy
    #[arg(long)]
    pub keep_count: Option<usize>,
    #[arg(long)]
    pub keep_days: Option<u64>,
}

#[derive(Args)]
pub struct ArchiveArgs {
    pub branch: String,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub version: String,
}
