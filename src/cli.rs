//! Command-line interface.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{IdentityPolicy, ServiceConfig, DEFAULT_BIND_ADDRESS};

/// Top-level arguments. `run` is the default command.
#[derive(Debug, Parser)]
#[clap(name = "discv5-cli", version)]
#[clap(about = "Run a discv5 node discovery service")]
#[clap(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    #[clap(flatten)]
    run: RunArgs,
}

impl Cli {
    /// The command to execute, defaulting to `run`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the discovery service
    Run(RunArgs),
}

/// Arguments of the `run` command.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// PeerId file
    #[clap(short = 'p', long, default_value = "./peer-id.json")]
    pub peer_id_file: PathBuf,

    /// Local ENR file
    #[clap(short = 'e', long, default_value = "./local-enr")]
    pub local_enr_file: PathBuf,

    /// Bootstrap ENRs file, line delimited
    #[clap(short = 'b', long, default_value = "./bootstrap-enrs")]
    pub bootstrap_enrs_file: PathBuf,

    /// Multiaddr of the bind address (must use UDP transport)
    #[clap(short = 'a', long, default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    /// Output ENRs file, line delimited
    #[clap(short = 'o', long, default_value = "./output-enrs")]
    pub output_enrs_file: PathBuf,

    /// Pause between lookups, in milliseconds
    #[clap(long, default_value_t = 1000)]
    pub lookup_interval_ms: u64,

    /// Fail instead of generating a new identity when the PeerId file is missing
    #[clap(long)]
    pub require_peer_id: bool,
}

impl RunArgs {
    /// Convert into a service configuration.
    pub fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            peer_id_file: self.peer_id_file,
            local_enr_file: self.local_enr_file,
            bootstrap_enrs_file: self.bootstrap_enrs_file,
            bind_address: self.bind_address,
            output_enrs_file: self.output_enrs_file,
            lookup_interval: Duration::from_millis(self.lookup_interval_ms),
            identity_policy: if self.require_peer_id {
                IdentityPolicy::Require
            } else {
                IdentityPolicy::CreateIfMissing
            },
        }
    }
}
