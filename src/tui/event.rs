//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use super::app::App;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Terminal tick (for refreshing the UI).
    Tick,
    /// Keyboard event.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
}

/// Event handler that reads terminal events in a separate task.
pub struct EventHandler {
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Get the sender for spawning the event loop.
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Spawn the event reading task.
    pub fn spawn_reader(tx: mpsc::UnboundedSender<Event>, tick_rate: Duration) {
        tokio::spawn(async move {
            loop {
                // Poll for events with timeout; timeout becomes a tick
                if event::poll(tick_rate).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(CrosstermEvent::Key(key)) => tx.send(Event::Key(key)),
                        Ok(CrosstermEvent::Resize(w, h)) => tx.send(Event::Resize(w, h)),
                        _ => Ok(()),
                    };
                    if forwarded.is_err() {
                        break;
                    }
                } else if tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of handling a key event.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// No action needed.
    None,
    /// Quit the application.
    Quit,
    /// Send the current input as a message.
    SendMessage,
}

/// Handle a key event and update app state.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        // Quit on Ctrl+C or Ctrl+Q
        KeyCode::Char('c') | KeyCode::Char('q')
            if key.modifiers.contains(KeyModifiers::CONTROL) =>
        {
            app.should_quit = true;
            KeyAction::Quit
        }

        // Escape also quits
        KeyCode::Esc => {
            app.should_quit = true;
            KeyAction::Quit
        }

        // Enter sends the message
        KeyCode::Enter => {
            if app.input.is_empty() {
                KeyAction::None
            } else {
                KeyAction::SendMessage
            }
        }

        KeyCode::Backspace => {
            app.delete_char();
            KeyAction::None
        }
        KeyCode::Delete => {
            app.delete_char_forward();
            KeyAction::None
        }

        // Cursor movement
        KeyCode::Left => {
            app.move_cursor_left();
            KeyAction::None
        }
        KeyCode::Right => {
            app.move_cursor_right();
            KeyAction::None
        }
        KeyCode::Home => {
            app.move_cursor_home();
            KeyAction::None
        }
        KeyCode::End => {
            app.move_cursor_end();
            KeyAction::None
        }

        // Scrollback
        KeyCode::PageUp => {
            app.scroll_up(5);
            KeyAction::None
        }
        KeyCode::PageDown => {
            app.scroll_down(5);
            KeyAction::None
        }
        KeyCode::Up if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_up(1);
            KeyAction::None
        }
        KeyCode::Down if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_down(1);
            KeyAction::None
        }

        // Regular character input
        KeyCode::Char(c) => {
            app.enter_char(c);
            KeyAction::None
        }

        _ => KeyAction::None,
    }
}

/// Handle chat commands starting with `/`.
pub fn handle_command(app: &mut App, command: &str) -> KeyAction {
    let parts: Vec<&str> = command.trim().split_whitespace().collect();
    if parts.is_empty() {
        return KeyAction::None;
    }

    match parts[0] {
        "/quit" | "/q" | "/exit" => {
            app.should_quit = true;
            KeyAction::Quit
        }
        "/help" | "/h" | "/?" => {
            app.add_system_message("Commands:");
            app.add_system_message("  /quit, /q    - Exit chat");
            app.add_system_message("  /status, /s  - Show connection status");
            app.add_system_message("  /clear, /c   - Clear message history");
            app.add_system_message("  /help, /h    - Show this help");
            KeyAction::None
        }
        "/status" | "/s" => {
            app.add_system_message(format!("Status: {}", app.status.display()));
            app.add_system_message(format!("Relay: {}", app.relay_addr));
            app.add_system_message(format!(
                "Messages: {} sent, {} received",
                app.messages_sent, app.messages_received
            ));
            KeyAction::None
        }
        "/clear" | "/c" => {
            app.messages.clear();
            app.add_system_message("Chat history cleared");
            KeyAction::None
        }
        _ => {
            app.add_system_message(format!("Unknown command: {}", parts[0]));
            app.add_system_message("Type /help for available commands");
            KeyAction::None
        }
    }
}
