use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reposync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative sync of Bitbucket repository settings", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Desired-state file (default: ./reposync.toml, then the user config dir)
    #[arg(short, long, global = true, env = "REPOSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bitbucket username
    #[arg(short, long, global = true, env = "BITBUCKET_USER_ID")]
    pub username: Option<String>,

    /// Bitbucket app password
    #[arg(short, long, global = true, env = "BITBUCKET_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Make the repository match the desired state
    Apply(ApplyArgs),

    /// Preview what apply would change
    Diff(DiffArgs),

    /// Create, delete or configure the repository itself
    Repo(RepoArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Resource kinds that can be reconciled separately
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Section {
    Permissions,
    Variables,
    Environments,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::Permissions,
        Section::Variables,
        Section::Environments,
    ];
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Permissions => write!(f, "permissions"),
            Section::Variables => write!(f, "variables"),
            Section::Environments => write!(f, "environments"),
        }
    }
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only reconcile these sections (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub only: Vec<Section>,

    /// Show what would change without calling any mutating endpoint
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Only preview these sections (comma-separated)
    #[arg(long, value_enum, value_delimiter = ',')]
    pub only: Vec<Section>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RepoArgs {
    /// Don't ask before deleting the repository
    #[arg(short, long)]
    pub yes: bool,

    /// Show what would change without calling any mutating endpoint
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
