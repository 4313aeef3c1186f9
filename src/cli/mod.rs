//! Command-line interface for hrdesk.

use clap::{Parser, Subcommand};

/// hrdesk - HR management backend
/// Users, tasks, training courses and notifications behind a JSON API
#[derive(Parser)]
#[command(name = "hrdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API server (default)
    Serve,

    /// Write a default config.toml to the working directory
    Init,

    /// Print an Argon2id hash of a password using the configured cost
    HashPassword {
        /// Password to hash
        password: String,
    },

    /// Apply database migrations and exit
    Migrate,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}
