//! Application state for the chat TUI.

use chrono::Local;

/// Who produced a log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAuthor {
    /// The local user.
    You,
    /// A remote peer, tagged with its relay-assigned identity.
    Peer(u64),
    /// Status messages from the client itself.
    System,
    /// Traffic the client refused to display as chat content.
    Warning,
}

/// One entry in the chat log.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    /// Who produced the entry.
    pub author: MessageAuthor,
    /// The entry text.
    pub content: String,
    /// Local wall-clock time at creation, formatted HH:MM:SS.
    pub time: String,
}

impl ChatMessage {
    /// Create a new chat log entry stamped with the current time.
    pub fn new(author: MessageAuthor, content: String) -> Self {
        Self {
            author,
            content,
            time: Local::now().format("%H:%M:%S").to_string(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::System, content.into())
    }

    /// Create a warning entry.
    pub fn warning(content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::Warning, content.into())
    }

    /// Create a message from the local user.
    pub fn from_you(content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::You, content.into())
    }

    /// Create a message from a peer.
    pub fn from_peer(sender: u64, content: impl Into<String>) -> Self {
        Self::new(MessageAuthor::Peer(sender), content.into())
    }
}

/// Connection state shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected yet.
    Disconnected,
    /// Dialing the relay.
    Connecting,
    /// Connected and ready to chat.
    Connected,
    /// Connection lost or failed.
    Error(String),
}

impl ConnectionStatus {
    /// Get a display string for the status.
    pub fn display(&self) -> &str {
        match self {
            ConnectionStatus::Disconnected => "Disconnected",
            ConnectionStatus::Connecting => "Connecting...",
            ConnectionStatus::Connected => "Connected",
            ConnectionStatus::Error(_) => "Error",
        }
    }
}

/// Maximum chat message length in characters.
///
/// Keeps a sealed frame small enough to fit one relay read.
pub const MAX_MESSAGE_LEN: usize = 160;

/// Application state for the chat TUI.
pub struct App {
    /// Current input text.
    pub input: String,
    /// Cursor position in the input, in characters.
    pub cursor_position: usize,
    /// Chat log.
    pub messages: Vec<ChatMessage>,
    /// Current connection status.
    pub status: ConnectionStatus,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Scroll offset for the chat log (0 = bottom).
    pub scroll_offset: usize,
    /// Address of the relay we are talking to.
    pub relay_addr: String,
    /// Messages sent count.
    pub messages_sent: u32,
    /// Messages received count.
    pub messages_received: u32,
    /// Maximum message length in characters.
    pub max_message_len: usize,
}

impl App {
    /// Create a new App instance for the given relay address.
    pub fn new(relay_addr: impl Into<String>) -> Self {
        Self {
            input: String::new(),
            cursor_position: 0,
            messages: Vec::new(),
            status: ConnectionStatus::Disconnected,
            should_quit: false,
            scroll_offset: 0,
            relay_addr: relay_addr.into(),
            messages_sent: 0,
            messages_received: 0,
            max_message_len: MAX_MESSAGE_LEN,
        }
    }

    /// Remaining characters available for input.
    pub fn remaining_chars(&self) -> usize {
        self.max_message_len
            .saturating_sub(self.input.chars().count())
    }

    /// Whether the input is at its maximum length.
    pub fn is_input_at_max(&self) -> bool {
        self.input.chars().count() >= self.max_message_len
    }

    /// Add a system message.
    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::system(content));
        self.scroll_to_bottom();
    }

    /// Add a warning entry, rendered apart from chat content.
    pub fn add_warning(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::warning(content));
        self.scroll_to_bottom();
    }

    /// Add a message from the local user.
    pub fn add_my_message(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::from_you(content));
        self.messages_sent += 1;
        self.scroll_to_bottom();
    }

    /// Add a message from a peer.
    pub fn add_peer_message(&mut self, sender: u64, content: impl Into<String>) {
        self.messages.push(ChatMessage::from_peer(sender, content));
        self.messages_received += 1;
        self.scroll_to_bottom();
    }

    /// Set the connection status.
    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.clamp_cursor(self.cursor_position.saturating_sub(1));
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        self.cursor_position = self.clamp_cursor(self.cursor_position.saturating_add(1));
    }

    /// Move cursor to start of input.
    pub fn move_cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    /// Move cursor to end of input.
    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.input.chars().count();
    }

    /// Insert a character at the cursor (respects the length cap).
    pub fn enter_char(&mut self, c: char) {
        if self.is_input_at_max() {
            return;
        }
        let index = self.byte_index();
        self.input.insert(index, c);
        self.move_cursor_right();
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let before = self.input.chars().take(self.cursor_position - 1);
        let after = self.input.chars().skip(self.cursor_position);
        self.input = before.chain(after).collect();
        self.move_cursor_left();
    }

    /// Delete the character after the cursor.
    pub fn delete_char_forward(&mut self) {
        if self.cursor_position >= self.input.chars().count() {
            return;
        }
        let before = self.input.chars().take(self.cursor_position);
        let after = self.input.chars().skip(self.cursor_position + 1);
        self.input = before.chain(after).collect();
    }

    fn clamp_cursor(&self, position: usize) -> usize {
        position.clamp(0, self.input.chars().count())
    }

    /// Byte index matching the character cursor position.
    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input.len())
    }

    /// Take the current input and clear it.
    pub fn take_input(&mut self) -> String {
        self.cursor_position = 0;
        std::mem::take(&mut self.input)
    }

    /// Restore input text (e.g. after a failed send), cursor at the end.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.cursor_position = self.input.chars().count();
    }

    /// Scroll to the bottom of the chat log.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Scroll up by n lines.
    pub fn scroll_up(&mut self, n: usize) {
        let max_scroll = self.messages.len().saturating_sub(1);
        self.scroll_offset = self.scroll_offset.saturating_add(n).min(max_scroll);
    }

    /// Scroll down by n lines.
    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(n);
    }

    /// Whether we are connected to the relay.
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_creation() {
        let app = App::new("127.0.0.1:8000");
        assert_eq!(app.relay_addr, "127.0.0.1:8000");
        assert!(app.input.is_empty());
        assert!(app.messages.is_empty());
        assert!(!app.should_quit);
        assert_eq!(app.status, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_input_editing() {
        let mut app = App::new("relay");

        app.enter_char('H');
        app.enter_char('i');
        assert_eq!(app.input, "Hi");
        assert_eq!(app.cursor_position, 2);

        app.delete_char();
        assert_eq!(app.input, "H");
        assert_eq!(app.cursor_position, 1);

        app.move_cursor_home();
        app.delete_char_forward();
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_message_log_and_counts() {
        let mut app = App::new("relay");

        app.add_system_message("Connected");
        app.add_my_message("Hello");
        app.add_peer_message(3, "Hi there");
        app.add_warning("could not decrypt");

        assert_eq!(app.messages.len(), 4);
        assert_eq!(app.messages_sent, 1);
        assert_eq!(app.messages_received, 1);
        assert_eq!(app.messages[2].author, MessageAuthor::Peer(3));
        assert_eq!(app.messages[3].author, MessageAuthor::Warning);
    }

    #[test]
    fn test_take_and_restore_input() {
        let mut app = App::new("relay");
        app.enter_char('H');
        app.enter_char('i');

        let input = app.take_input();
        assert_eq!(input, "Hi");
        assert!(app.input.is_empty());
        assert_eq!(app.cursor_position, 0);

        app.set_input(input);
        assert_eq!(app.input, "Hi");
        assert_eq!(app.cursor_position, 2);
    }

    #[test]
    fn test_input_length_cap() {
        let mut app = App::new("relay");
        app.max_message_len = 5;

        for c in "Hello".chars() {
            app.enter_char(c);
        }
        assert!(app.is_input_at_max());
        assert_eq!(app.remaining_chars(), 0);

        app.enter_char('!');
        assert_eq!(app.input, "Hello");

        app.delete_char();
        assert_eq!(app.remaining_chars(), 1);
        app.enter_char('!');
        assert_eq!(app.input, "Hell!");
    }

    #[test]
    fn test_scroll_clamps_to_history() {
        let mut app = App::new("relay");
        app.add_system_message("one");
        app.add_system_message("two");

        app.scroll_up(10);
        assert_eq!(app.scroll_offset, 1);

        app.scroll_down(10);
        assert_eq!(app.scroll_offset, 0);
    }
}
