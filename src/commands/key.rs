//! `key` command: derive and print the session key.

use anyhow::{bail, Context, Result};
use clap::Args;

use super::CommandExecutor;
use crate::crypto::{daily_key, daily_key_for_date, passphrase_key};

/// Derive and print the symmetric session key without connecting.
///
/// Lets two operators confirm they derive the same key before chatting.
#[derive(Args, Debug)]
pub struct KeyCommand {
    /// Shared seed for the rotating daily key
    #[arg(short, long, conflicts_with = "passphrase")]
    pub seed: Option<String>,

    /// Derive from a passphrase typed at the prompt (input hidden)
    #[arg(short, long)]
    pub passphrase: bool,

    /// Calendar day override for the rotating key (format YYYYMMDD)
    #[arg(short, long, requires = "seed")]
    pub date: Option<String>,
}

impl CommandExecutor for KeyCommand {
    fn execute(&self) -> Result<()> {
        let key = if self.passphrase {
            let passphrase =
                rpassword::prompt_password("Passphrase: ").context("Failed to read passphrase")?;
            passphrase_key(&passphrase)?
        } else if let Some(seed) = &self.seed {
            match &self.date {
                Some(date) => daily_key_for_date(seed, date)?,
                None => daily_key(seed)?,
            }
        } else {
            bail!("Provide either --seed or --passphrase");
        };

        println!("{}", key.as_str());
        Ok(())
    }
}
