//! Blindrelay - encrypted group chat through a blind relay.
//!
//! The relay fans ciphertext out to every connected peer without ever
//! holding key material; peers derive the shared key out-of-band.

use anyhow::Result;
use clap::{Parser, Subcommand};

use blindrelay::commands::{CommandExecutor, ConnectCommand, KeyCommand, RelayCommand};

/// Blindrelay - encrypted group chat through a blind relay
#[derive(Parser)]
#[command(name = "blindrelay")]
#[command(version)]
#[command(about = "Encrypted group chat relayed by a server that never sees plaintext")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the central relay
    Relay(RelayCommand),
    /// Connect to a relay and chat
    Connect(ConnectCommand),
    /// Derive and print the session key
    Key(KeyCommand),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Relay(cmd) => cmd.execute(),
        Commands::Connect(cmd) => cmd.execute(),
        Commands::Key(cmd) => cmd.execute(),
    }
}
