use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lds",
    about = "LDAP directory store: load, inspect and watch a users/groups/layers tree",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory tree root (overrides the configuration file)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load the tree once and report counts and diagnostics
    Check,
    /// Show a user's public keys
    Keys(KeysArgs),
    /// List the users of a layer
    LayerUsers(LayerArgs),
    /// List every group with its members
    Groups,
    /// Check a layer credential against the environment
    Auth(AuthArgs),
    /// Watch the tree and reload on every change until interrupted
    Watch,
}

#[derive(Args)]
pub struct KeysArgs {
    pub uid: String,
}

#[derive(Args)]
pub struct LayerArgs {
    pub layer: String,
}

#[derive(Args)]
pub struct AuthArgs {
    pub layer: String,
    pub credential: String,
}
