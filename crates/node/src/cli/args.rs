pub use clap::Parser;

use std::path::PathBuf;

use url::Url;

use super::Command;

#[derive(Parser, Debug)]
#[command(name = "cbn")]
#[command(about = "Signed content buckets shared between peers")]
pub struct Args {
    /// Path to the cbn config directory (defaults to ~/.cbn)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    /// Node API to talk to (defaults to localhost at the configured api port)
    #[arg(long, global = true)]
    pub api_url: Option<Url>,

    #[command(subcommand)]
    pub command: Command,
}
