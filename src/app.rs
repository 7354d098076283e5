use std::path::PathBuf;

use tracing::{info, warn};

use crate::client::{BotClient, ChatError};
use crate::config::{Preferences, WidgetParams};
use crate::theme::{Palette, ThemeMode};

/// UI tick interval, also the typewriter cadence (one character per tick).
pub const TICK_MILLIS: u64 = 50;

/// Ticks before the welcome message appears after load (1 s).
pub const WELCOME_DELAY_TICKS: u32 = 20;

// Typing-indicator ellipsis advances every 6 ticks (~300 ms)
const SPINNER_TICKS_PER_FRAME: u64 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One transcript entry. The transcript is append-only and ordered by
/// arrival; entries are never mutated or removed.
#[derive(Debug, Clone)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

/// Typewriter cursor over one bot message: the renderer shows the first
/// `shown_chars` characters, advanced by one on each tick.
#[derive(Debug, Clone, Copy)]
struct Reveal {
    msg_index: usize,
    shown_chars: usize,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub is_open: bool,
    pub awaiting_reply: bool,
    pub theme: ThemeMode,
    pub bot_name: String,

    // Transcript
    pub messages: Vec<Message>,
    reveal: Option<Reveal>,

    // Input state
    pub input: String,
    pub input_cursor: usize,

    // Chat area geometry, updated during render for scroll calculations
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    // Scheduling
    tick_count: u64,
    welcome_ticks: Option<u32>,

    // Backend
    client: BotClient,
    reply_task: Option<tokio::task::JoinHandle<Result<String, ChatError>>>,

    // Theme persistence target; None disables persistence
    prefs_path: Option<PathBuf>,
}

impl App {
    pub fn new(params: WidgetParams, theme: ThemeMode, prefs_path: Option<PathBuf>) -> Self {
        let client = BotClient::new(&params.backend_url, &params.bot_id, &params.api_key);

        Self {
            should_quit: false,
            is_open: false,
            awaiting_reply: false,
            theme,
            bot_name: params.bot_name,

            messages: Vec::new(),
            reveal: None,

            input: String::new(),
            input_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            tick_count: 0,
            welcome_ticks: Some(WELCOME_DELAY_TICKS),

            client,
            reply_task: None,

            prefs_path,
        }
    }

    pub fn palette(&self) -> &'static Palette {
        self.theme.palette()
    }

    // Visibility: toggle flips, close forces Closed. No guards.
    pub fn toggle_open(&mut self) {
        self.is_open = !self.is_open;
        if self.is_open {
            self.scroll_to_bottom();
        }
    }

    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Flip the theme and persist the new mode. The next frame repaints every
    /// surface from the new palette.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        if let Some(path) = &self.prefs_path {
            if let Err(e) = Preferences::save_theme(path, self.theme) {
                warn!("failed to persist theme preference: {e}");
            }
        }
    }

    /// Guarded transition into Sending. Appends the user message, clears the
    /// input and raises the awaiting flag; returns the text to send, or None
    /// when a guard failed (empty input, or a send already in flight).
    pub fn begin_send(&mut self) -> Option<String> {
        if self.awaiting_reply {
            return None;
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return None;
        }

        self.messages.push(Message { sender: Sender::User, text: text.clone() });
        self.input.clear();
        self.input_cursor = 0;
        self.awaiting_reply = true;
        self.scroll_to_bottom();
        Some(text)
    }

    /// Submit the current input: one POST on a spawned task, polled from the
    /// event loop so the UI stays responsive.
    pub fn submit(&mut self) {
        if let Some(text) = self.begin_send() {
            let client = self.client.clone();
            self.reply_task = Some(tokio::spawn(async move {
                client.send_message(&text).await
            }));
        }
    }

    /// Settle a finished send: hide the typing indicator and append the reply
    /// (typewriter-revealed) or the fixed explanation for the failure class.
    pub fn finish_send(&mut self, result: Result<String, ChatError>) {
        self.awaiting_reply = false;
        match result {
            Ok(reply) => {
                self.push_bot_revealed(reply);
            }
            Err(err) => {
                warn!("chat request failed: {err}");
                self.messages.push(Message {
                    sender: Sender::Bot,
                    text: err.user_message().to_string(),
                });
            }
        }
        self.scroll_to_bottom();
    }

    /// Reap the in-flight send once its task has finished.
    pub async fn poll_reply(&mut self) {
        if self.reply_task.as_ref().is_some_and(|t| t.is_finished()) {
            if let Some(task) = self.reply_task.take() {
                let result = match task.await {
                    Ok(result) => result,
                    Err(e) => Err(ChatError::Internal(e.to_string())),
                };
                self.finish_send(result);
            }
        }
    }

    /// Advance schedules: the welcome countdown and the typewriter reveal.
    pub fn tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);

        if let Some(remaining) = self.welcome_ticks {
            let remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                self.welcome_ticks = None;
                let greeting =
                    format!("Hi! I'm {}. How can I help you today?", self.bot_name);
                info!("widget ready, showing welcome message");
                self.push_bot_revealed(greeting);
            } else {
                self.welcome_ticks = Some(remaining);
            }
        }

        if let Some(mut reveal) = self.reveal {
            let total = self
                .messages
                .get(reveal.msg_index)
                .map(|m| m.text.chars().count())
                .unwrap_or(0);
            reveal.shown_chars += 1;
            self.reveal = (reveal.shown_chars < total).then_some(reveal);
            self.scroll_to_bottom();
        }
    }

    /// Frame index for the animated typing indicator.
    pub fn spinner_frame(&self) -> usize {
        ((self.tick_count / SPINNER_TICKS_PER_FRAME) % 3) as usize
    }

    /// The text to render for a transcript entry: the revealed prefix while
    /// its typewriter is running, the full text otherwise.
    pub fn display_text(&self, index: usize) -> String {
        let Some(msg) = self.messages.get(index) else {
            return String::new();
        };
        match self.reveal {
            Some(r) if r.msg_index == index => msg.text.chars().take(r.shown_chars).collect(),
            _ => msg.text.clone(),
        }
    }

    fn push_bot_revealed(&mut self, text: String) {
        self.messages.push(Message { sender: Sender::Bot, text });
        self.reveal = Some(Reveal { msg_index: self.messages.len() - 1, shown_chars: 0 });
        self.scroll_to_bottom();
    }

    // Transcript scrolling
    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    /// Pin the viewport to the newest entry, using the chat area geometry
    /// recorded during the last render.
    pub fn scroll_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            40
        };

        let mut total_lines: u16 = 0;
        for msg in &self.messages {
            for line in msg.text.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 2; // sender label + blank line between bubbles
        }

        if self.awaiting_reply {
            total_lines += 2; // label + typing indicator
        }

        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{MSG_GENERIC, MSG_NETWORK, MSG_UNAUTHORIZED};

    fn test_app() -> App {
        let params = WidgetParams {
            bot_id: "abc".to_string(),
            api_key: "xyz".to_string(),
            bot_name: "Helper".to_string(),
            backend_url: "http://127.0.0.1:8000".to_string(),
        };
        App::new(params, ThemeMode::Light, None)
    }

    fn reveal_fully(app: &mut App) {
        for _ in 0..10_000 {
            if app.reveal.is_none() {
                break;
            }
            app.tick();
        }
    }

    #[test]
    fn toggling_visibility_twice_restores_state() {
        let mut app = test_app();
        assert!(!app.is_open);
        app.toggle_open();
        assert!(app.is_open);
        app.toggle_open();
        assert!(!app.is_open);
    }

    #[test]
    fn close_forces_closed() {
        let mut app = test_app();
        app.close();
        assert!(!app.is_open);
        app.toggle_open();
        app.close();
        assert!(!app.is_open);
    }

    #[test]
    fn empty_or_whitespace_input_is_not_sent() {
        let mut app = test_app();
        assert!(app.begin_send().is_none());

        app.input = "   \t  ".to_string();
        assert!(app.begin_send().is_none());
        assert!(app.messages.is_empty());
        assert!(!app.awaiting_reply);
    }

    #[test]
    fn send_trims_input_and_raises_awaiting_flag() {
        let mut app = test_app();
        app.input = "  hello there  ".to_string();

        let sent = app.begin_send().unwrap();
        assert_eq!(sent, "hello there");
        assert!(app.awaiting_reply);
        assert!(app.input.is_empty());
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::User);
        assert_eq!(app.messages[0].text, "hello there");
    }

    #[test]
    fn second_send_is_rejected_while_awaiting_reply() {
        let mut app = test_app();
        app.input = "first".to_string();
        assert!(app.begin_send().is_some());

        app.input = "second".to_string();
        assert!(app.begin_send().is_none());
        assert_eq!(app.messages.len(), 1);

        // Resolving the first send re-enables submission
        app.finish_send(Ok("reply".to_string()));
        app.input = "second".to_string();
        assert!(app.begin_send().is_some());
    }

    #[test]
    fn successful_reply_reveals_to_exact_text() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.begin_send();
        app.finish_send(Ok("Hi there".to_string()));

        assert!(!app.awaiting_reply);
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[1].sender, Sender::Bot);

        // Reveal starts empty and grows one character per tick
        assert_eq!(app.display_text(1), "");
        app.tick();
        assert_eq!(app.display_text(1), "H");

        reveal_fully(&mut app);
        assert_eq!(app.display_text(1), "Hi there");
    }

    #[test]
    fn unauthorized_failure_appends_fixed_message() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.begin_send();
        app.finish_send(Err(ChatError::Unauthorized {
            detail: "token expired".to_string(),
        }));

        assert!(!app.awaiting_reply);
        let last = app.messages.last().unwrap();
        assert_eq!(last.sender, Sender::Bot);
        assert_eq!(last.text, MSG_UNAUTHORIZED);
        // Error messages are not typewriter-revealed
        assert_eq!(app.display_text(app.messages.len() - 1), MSG_UNAUTHORIZED);
    }

    #[test]
    fn transport_failure_appends_network_message() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.begin_send();
        app.finish_send(Err(ChatError::Network("connection refused".to_string())));
        assert_eq!(app.messages.last().unwrap().text, MSG_NETWORK);
    }

    #[test]
    fn internal_failure_appends_generic_message() {
        let mut app = test_app();
        app.input = "hi".to_string();
        app.begin_send();
        app.finish_send(Err(ChatError::Internal("task cancelled".to_string())));
        assert_eq!(app.messages.last().unwrap().text, MSG_GENERIC);
    }

    #[test]
    fn welcome_message_appears_after_fixed_delay() {
        let mut app = test_app();

        for _ in 0..WELCOME_DELAY_TICKS - 1 {
            app.tick();
        }
        assert!(app.messages.is_empty());

        app.tick();
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].sender, Sender::Bot);
        assert!(app.messages[0].text.contains("Helper"));

        // One-shot: further ticks do not repeat it
        for _ in 0..WELCOME_DELAY_TICKS * 2 {
            app.tick();
        }
        assert_eq!(app.messages.len(), 1);
    }

    #[test]
    fn theme_toggle_twice_restores_mode_and_persisted_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Preferences::save_theme(&path, ThemeMode::Light).unwrap();

        let params = WidgetParams {
            bot_id: "abc".to_string(),
            api_key: "xyz".to_string(),
            bot_name: "Helper".to_string(),
            backend_url: "http://127.0.0.1:8000".to_string(),
        };
        let mut app = App::new(params, ThemeMode::Light, Some(path.clone()));

        app.toggle_theme();
        assert_eq!(app.theme, ThemeMode::Dark);
        let stored = Preferences::load_from(&path).unwrap();
        assert_eq!(stored.theme_mode(), ThemeMode::Dark);

        app.toggle_theme();
        assert_eq!(app.theme, ThemeMode::Light);
        let stored = Preferences::load_from(&path).unwrap();
        assert_eq!(stored.theme_mode(), ThemeMode::Light);
    }

    #[test]
    fn transcript_preserves_arrival_order() {
        let mut app = test_app();
        app.input = "one".to_string();
        app.begin_send();
        app.finish_send(Ok("reply one".to_string()));
        reveal_fully(&mut app);

        app.input = "two".to_string();
        app.begin_send();
        app.finish_send(Err(ChatError::NotFound { detail: String::new() }));

        let texts: Vec<&str> = app.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts[0], "one");
        assert_eq!(texts[1], "reply one");
        assert_eq!(texts[2], "two");
        assert_eq!(app.messages[3].sender, Sender::Bot);
    }
}
