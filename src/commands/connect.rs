//! `connect` command: join a relay and chat interactively.

use std::io;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use super::CommandExecutor;
use crate::client::RelayConnection;
use crate::config::AppConfig;
use crate::crypto::{daily_key, passphrase_key, SessionKey};
use crate::protocol::{self, FrameError};
use crate::tui::{
    handle_command, handle_key_event, init_terminal, render, restore_terminal, App,
    ConnectionStatus, Event, EventHandler, KeyAction,
};

/// Address used when neither the flag nor the config file provides one.
const DEFAULT_RELAY_ADDR: &str = "127.0.0.1:8000";

/// Tick rate for the terminal event reader.
const TICK_RATE: Duration = Duration::from_millis(100);

/// Connect to a relay and chat.
///
/// The key is derived locally and never sent anywhere: pass a shared seed
/// for the rotating daily key, or --passphrase to type a shared passphrase.
#[derive(Args, Debug)]
pub struct ConnectCommand {
    /// Relay address (host:port); falls back to the saved default
    #[arg(short, long)]
    pub addr: Option<String>,

    /// Shared seed for the rotating daily key
    #[arg(short, long, conflicts_with = "passphrase")]
    pub seed: Option<String>,

    /// Derive the key from a passphrase typed at the prompt (input hidden)
    #[arg(short, long)]
    pub passphrase: bool,

    /// Save the address and seed as defaults for the next run
    #[arg(long)]
    pub save: bool,
}

impl CommandExecutor for ConnectCommand {
    fn execute(&self) -> Result<()> {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        rt.block_on(self.run())
    }
}

impl ConnectCommand {
    async fn run(&self) -> Result<()> {
        let mut config = AppConfig::load()?;

        let addr = self
            .addr
            .clone()
            .or_else(|| config.relay_addr.clone())
            .unwrap_or_else(|| DEFAULT_RELAY_ADDR.to_string());

        let seed = self.seed.clone().or_else(|| config.seed.clone());

        // Key material is validated before dialing the relay
        let key = if self.passphrase {
            let passphrase =
                rpassword::prompt_password("Passphrase: ").context("Failed to read passphrase")?;
            passphrase_key(&passphrase)?
        } else if let Some(seed) = &seed {
            daily_key(seed)?
        } else {
            bail!("No key material: pass --seed or --passphrase (or save a seed with --save)");
        };

        if self.save {
            config.relay_addr = Some(addr.clone());
            if self.seed.is_some() {
                config.seed = self.seed.clone();
            }
            config.save().context("Failed to save configuration")?;
            println!("Saved defaults to the config file.");
        }

        println!("Connecting to {addr}...");
        let conn = RelayConnection::connect(&addr).await?;

        run_chat(conn, key, &addr).await
    }
}

/// Runs the interactive chat session inside the TUI.
async fn run_chat(mut conn: RelayConnection, key: SessionKey, addr: &str) -> Result<()> {
    let mut terminal = init_terminal().context("Failed to initialize terminal")?;

    let mut app = App::new(addr);
    app.set_status(ConnectionStatus::Connected);
    app.add_system_message(format!("Connected to {}", conn.peer_addr()));
    app.add_system_message("Type /help for commands. Ctrl+C to quit.");

    let mut events = EventHandler::new();
    EventHandler::spawn_reader(events.sender(), TICK_RATE);

    let result = chat_loop(&mut terminal, &mut app, &mut events, &mut conn, &key).await;

    restore_terminal(&mut terminal).context("Failed to restore terminal")?;
    result
}

/// Inner select loop: terminal events against inbound frames.
async fn chat_loop(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    conn: &mut RelayConnection,
    key: &SessionKey,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        tokio::select! {
            event = events.next() => {
                match event {
                    Some(Event::Key(key_event)) => {
                        match handle_key_event(app, key_event) {
                            KeyAction::Quit => {
                                let _ = conn.close().await;
                                return Ok(());
                            }
                            KeyAction::SendMessage => {
                                let input = app.take_input();
                                if input.starts_with('/') {
                                    if handle_command(app, &input) == KeyAction::Quit {
                                        let _ = conn.close().await;
                                        return Ok(());
                                    }
                                } else {
                                    send_message(app, conn, key, input).await;
                                }
                            }
                            KeyAction::None => {}
                        }
                    }
                    Some(Event::Resize(_, _)) | Some(Event::Tick) => {}
                    None => return Ok(()),
                }

                if app.should_quit {
                    let _ = conn.close().await;
                    return Ok(());
                }
            }

            chunk = conn.read_chunk() => {
                match chunk {
                    Ok(chunk) if chunk.is_empty() => {
                        return disconnected(terminal, app, events).await;
                    }
                    Ok(chunk) => receive_frame(app, key, &chunk),
                    Err(_) => {
                        return disconnected(terminal, app, events).await;
                    }
                }
            }
        }
    }
}

/// Seals and writes one outgoing message.
///
/// A failed send keeps the typed text in the input line for manual retry;
/// the connection stays open and nothing is retried automatically.
async fn send_message(app: &mut App, conn: &mut RelayConnection, key: &SessionKey, input: String) {
    let text = input.trim();
    if text.is_empty() {
        return;
    }

    match protocol::seal_message(text, key) {
        Ok(wire) => match conn.send(wire.as_bytes()).await {
            Ok(()) => app.add_my_message(text),
            Err(error) => {
                app.add_system_message(format!("Send failed: {}", error));
                app.set_input(input.as_str());
            }
        },
        Err(error) => {
            app.add_system_message(format!("Encrypt failed: {}", error));
            app.set_input(input.as_str());
        }
    }
}

/// Handles one inbound chunk from the relay.
fn receive_frame(app: &mut App, key: &SessionKey, chunk: &[u8]) {
    match protocol::open_frame(chunk, key) {
        Ok((sender, text)) => app.add_peer_message(sender, text),
        // Malformed frames carry nothing displayable and are dropped
        Err(FrameError::MissingSeparator) | Err(FrameError::InvalidSender) => {}
        Err(error) => app.add_warning(error.to_string()),
    }
}

/// Shows the disconnect notice and waits for the user to acknowledge it.
async fn disconnected(
    terminal: &mut ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<()> {
    app.add_system_message("Relay disconnected.");
    app.set_status(ConnectionStatus::Disconnected);

    while !app.should_quit {
        terminal.draw(|frame| render(frame, app))?;
        if let Some(Event::Key(key)) = events.next().await {
            if handle_key_event(app, key) == KeyAction::Quit {
                break;
            }
        }
    }
    Ok(())
}
