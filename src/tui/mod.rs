//! Terminal user interface for the chat client.
//!
//! A three-pane ratatui layout: status bar, scrollable chat log, and an
//! input line. Warnings are rendered apart from chat content so suspicious
//! traffic is never mistaken for a message.

mod app;
pub mod event;
mod ui;

pub use app::{App, ChatMessage, ConnectionStatus, MessageAuthor, MAX_MESSAGE_LEN};
pub use event::{handle_command, handle_key_event, Event, EventHandler, KeyAction};
pub use ui::render;

use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

/// Initialize the terminal for TUI mode.
pub fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Restore the terminal to normal mode.
pub fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()
}
