use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "steamsync",
    about = "Inspect and sync Steam non-Steam shortcuts",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to the platform config location)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Steam install directory, overrides the config
    #[arg(long, global = true)]
    pub steam_dir: Option<PathBuf>,

    /// Steam user id, overrides the config
    #[arg(long, global = true)]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the records of a shortcuts file as JSON
    Read(FileArgs),
    /// Check that a shortcuts file survives decode/encode unchanged
    Roundtrip(FileArgs),
    /// Write a small sample shortcuts file
    WriteSample(FileArgs),
    /// Print the identities derived from a name and executable
    Ids(IdsArgs),
    /// List Steam users
    Users,
    /// Show which grid artwork exists for a shortcut AppId
    Artwork(ArtworkArgs),
    /// Export catalog games to the user's shortcuts
    Export(SyncArgs),
    /// Import the user's shortcuts into the catalog
    Import(SyncArgs),
}

#[derive(Args)]
pub struct FileArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct IdsArgs {
    pub name: String,
    pub exe: String,
}

#[derive(Args)]
pub struct ArtworkArgs {
    pub app_id: u32,
}

#[derive(Args)]
pub struct SyncArgs {
    /// Catalog JSON file (array of games)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
}
