pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "hub")]
#[command(about = "Manage storage buckets and files on a ledger-backed provider network")]
pub struct Args {
    /// Path to the hubstore state directory (defaults to ~/.hubstore)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Indexing backend URL, overriding the configured one
    #[arg(long, global = true)]
    pub backend: Option<Url>,

    /// Ledger JSON-RPC URL, overriding the configured one
    #[arg(long, global = true)]
    pub rpc: Option<Url>,

    #[command(subcommand)]
    pub command: crate::Command,
}
