//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use modfleet::ops::VersionStrategy;

/// modfleet - find the dependents of a Go module and the version to move them to
#[derive(Parser)]
#[command(name = "modfleet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Give up after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find the dependents of a module
    Discover(DiscoverArgs),

    /// Resolve the version of a module
    Version(VersionArgs),

    /// Check a fleet manifest
    Validate(ManifestArgs),

    /// Print a fleet manifest with defaults applied
    Expand(ManifestArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct DiscoverArgs {
    #[command(subcommand)]
    pub command: DiscoverCommands,
}

#[derive(Subcommand)]
pub enum DiscoverCommands {
    /// Scan a local workspace
    Local(LocalDiscoverArgs),

    /// Search a GitHub organization
    Remote(RemoteDiscoverArgs),
}

/// Discovery output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DiscoverFormat {
    #[default]
    Text,
    Json,
    /// `[[dependents]]` entries ready to paste into a manifest
    Toml,
}

/// Options shared by both discovery engines.
#[derive(Args)]
pub struct DiscoverCommon {
    /// Module path to find dependents of
    #[arg(short, long)]
    pub target: String,

    /// Only report dependents pinned below this version
    #[arg(long, value_name = "VERSION")]
    pub older_than: Option<String>,

    /// Include pattern (repeatable)
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude pattern (repeatable, wins over include)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Stop after this many results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of concurrent probes
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: DiscoverFormat,
}

#[derive(Args)]
pub struct LocalDiscoverArgs {
    /// Workspace root (defaults to current directory)
    pub root: Option<PathBuf>,

    /// Maximum directory depth to scan
    #[arg(long)]
    pub max_depth: Option<usize>,

    #[command(flatten)]
    pub common: DiscoverCommon,
}

#[derive(Args)]
pub struct RemoteDiscoverArgs {
    /// GitHub organization
    pub org: String,

    /// Raw code search query, scoped to the organization
    #[arg(long)]
    pub query: Option<String>,

    #[command(flatten)]
    pub common: DiscoverCommon,
}

#[derive(Args)]
pub struct VersionArgs {
    /// Module path to resolve
    pub module: String,

    /// Resolution strategy
    #[arg(short, long, default_value = "auto", value_parser = parse_strategy)]
    pub strategy: VersionStrategy,

    /// Workspace scanned by the local strategies
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Allow the local strategies to query the module proxy
    #[arg(long)]
    pub allow_network: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

fn parse_strategy(s: &str) -> Result<VersionStrategy, String> {
    s.parse()
}

#[derive(Args)]
pub struct ManifestArgs {
    /// Manifest path (defaults to modfleet.toml)
    pub manifest: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
