use crate::resource::ResourceKind;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "connect-reconciler")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile declared Connect entities against the control plane", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Command,
}

// ============================================================================
// Provider
// ============================================================================

#[derive(Parser)]
pub struct ProviderArgs {
    /// API token (overrides COFIDE_API_TOKEN)
    #[arg(long, global = true)]
    pub api_token: Option<String>,

    /// Connect endpoint as host:port (overrides COFIDE_CONNECT_URL)
    #[arg(long, global = true)]
    pub connect_url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure_skip_verify: bool,

    /// Config file (default: ~/.config/connect-reconciler/config.toml)
    #[arg(long, global = true)]
    pub config_file: Option<String>,

    /// Deadline for the whole operation, in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Subcommand)]
pub enum Command {
    /// Create an entity from declared configuration
    Create(DocumentArgs),

    /// Refresh persisted state from the server (prints null when gone)
    Read(DocumentArgs),

    /// Replace an entity with declared configuration
    Update(UpdateArgs),

    /// Delete the entity named by persisted state
    Delete(DocumentArgs),

    /// Adopt an existing entity by id (or name for attestation policies)
    Import {
        /// Entity kind
        #[arg(value_enum)]
        kind: ResourceKind,

        /// Entity id, or policy name
        key: String,
    },

    /// Find exactly one entity matching a filter document
    Lookup(DocumentArgs),

    /// Check declared configuration without contacting the server
    Validate(DocumentArgs),

    /// Find an organization by exact name
    Organization {
        /// Organization name
        name: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct DocumentArgs {
    /// Entity kind
    #[arg(value_enum)]
    pub kind: ResourceKind,

    /// JSON document path, or - for stdin
    #[arg(default_value = "-")]
    pub file: PathBuf,
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Entity kind
    #[arg(value_enum)]
    pub kind: ResourceKind,

    /// Persisted state JSON path, or - for stdin
    #[arg(short, long)]
    pub state: PathBuf,

    /// Declared configuration JSON path, or - for stdin
    #[arg(short, long)]
    pub config: PathBuf,
}
