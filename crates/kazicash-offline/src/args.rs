use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "kazicash-offline",
    version,
    about = "Offline cache for the KaziCash app: precache the shell, serve requests when the network is gone"
)]
pub struct Cli {
    /// App origin the cache manager serves
    #[arg(long, global = true, env = "KAZICASH_ORIGIN")]
    pub origin: Option<String>,

    /// Directory for cache stores, the registration record and logs
    #[arg(long, global = true, env = "KAZICASH_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Register the cache manager and precache the app shell
    Register,
    /// Check for a new cache manager version
    Update,
    /// Activate a waiting version and reload
    ForceUpdate,
    /// Fetch a path through the active cache manager
    Fetch(FetchArgs),
    /// Show registration and connectivity
    Status,
    /// List cache stores
    Caches,
    /// Remove the registration (cached data is kept)
    Unregister,
    /// Show the configuration file and effective settings
    Config,
}

#[derive(Parser, Debug, PartialEq, Eq)]
pub struct FetchArgs {
    /// Path relative to the app origin, e.g. /api/jobs
    pub path: String,

    /// Treat the request as a page navigation
    #[arg(long)]
    pub navigate: bool,
}
