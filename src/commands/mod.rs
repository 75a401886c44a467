//! Command module - Strategy pattern for CLI commands.
//!
//! Each command is a separate module implementing the `CommandExecutor`
//! trait, keeping argument parsing and execution logic together.

mod connect;
mod key;
mod relay;

pub use connect::ConnectCommand;
pub use key::KeyCommand;
pub use relay::RelayCommand;

use anyhow::Result;

/// Trait for command execution - Strategy pattern.
///
/// Each command struct holds its parsed arguments and implements this
/// trait to define its execution logic.
pub trait CommandExecutor {
    /// Executes the command with its parsed arguments.
    fn execute(&self) -> Result<()>;
}
