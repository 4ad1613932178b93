use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "configvault",
    about = "Store one JSON config per module, optionally sealed with a password",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Module whose config record is addressed (stored as `<module>-config`).
    #[arg(long, short, global = true)]
    pub module: Option<String>,

    /// Directory holding the records; defaults to the platform data dir.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the module's config record as JSON.
    Get {
        /// Password for payload decryption.
        #[arg(long, short)]
        password: Option<String>,
        /// Accept a cached record at most this many seconds old.
        #[arg(long)]
        max_age: Option<u64>,
    },
    /// Store the module's config record.
    Set {
        /// Password for payload encryption.
        #[arg(long, short)]
        password: Option<String>,
        /// Config object as inline JSON; read from stdin when omitted.
        json: Option<String>,
    },
    /// Wait until the module's config record exists, then print it.
    Wait {
        /// Password for payload decryption.
        #[arg(long, short)]
        password: Option<String>,
        /// Give up after this many seconds.
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
