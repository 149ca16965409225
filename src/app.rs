use std::path::PathBuf;
use std::time::Instant;

use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use typhoon_core::{Attachment, DismissReason, SendStatus, Session, TurnOutcome};

use crate::view::View;

pub const READ_ERROR_TEXT: &str = "Could not read file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub view: View,
    pub session: Session,

    // Composer cursor (char index into the composer text)
    pub input_cursor: usize,

    // Transcript scrolling
    pub transcript_scroll: u16,
    pub max_scroll: u16,
    pub follow_tail: bool,
    seen: (usize, bool),

    // Chat area height, updated during render
    pub chat_height: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing indicator

    // Attach prompt state
    pub show_attach_prompt: bool,
    pub attach_input: String,
    pub attach_cursor: usize,

    // View picker state
    pub show_view_picker: bool,
    pub view_picker_state: ListState,

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub notification_area: Option<Rect>,
}

impl App {
    pub fn new(session: Session, view: View) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            view,
            session,

            input_cursor: 0,

            transcript_scroll: 0,
            max_scroll: 0,
            follow_tail: true,
            seen: (0, false),

            chat_height: 0,

            animation_frame: 0,

            show_attach_prompt: false,
            attach_input: String::new(),
            attach_cursor: 0,

            show_view_picker: false,
            view_picker_state: ListState::default(),

            chat_area: None,
            notification_area: None,
        }
    }

    // Composer editing. Every edit replaces the composer text wholesale.

    fn edit_text(&mut self, edit: impl FnOnce(&mut String, &mut usize)) {
        let mut text = self.session.composer().text().to_string();
        let mut cursor = self.input_cursor.min(text.chars().count());
        edit(&mut text, &mut cursor);
        self.input_cursor = cursor;
        self.session.set_text(text);
    }

    pub fn insert_char(&mut self, c: char) {
        self.edit_text(|text, cursor| {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert(byte_pos, c);
            *cursor += 1;
        });
    }

    pub fn insert_str(&mut self, s: &str) {
        let s = s.replace("\r\n", "\n").replace('\r', "\n");
        self.edit_text(|text, cursor| {
            let byte_pos = char_to_byte_index(text, *cursor);
            text.insert_str(byte_pos, &s);
            *cursor += s.chars().count();
        });
    }

    pub fn backspace(&mut self) {
        self.edit_text(|text, cursor| {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        });
    }

    pub fn delete(&mut self) {
        self.edit_text(|text, cursor| {
            if *cursor < text.chars().count() {
                let byte_pos = char_to_byte_index(text, *cursor);
                text.remove(byte_pos);
            }
        });
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.composer().text().chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.session.composer().text().chars().count();
    }

    // Turn handling

    pub fn send(&mut self) -> SendStatus {
        let status = self.session.send();
        if let SendStatus::Dispatched(_) = status {
            self.input_cursor = 0;
            self.follow_tail = true;
        }
        status
    }

    pub fn settle(&mut self, outcome: TurnOutcome) {
        self.session.settle(outcome);
    }

    // Attach prompt

    pub fn open_attach_prompt(&mut self) {
        self.show_attach_prompt = true;
        self.attach_input.clear();
        self.attach_cursor = 0;
    }

    pub fn close_attach_prompt(&mut self) {
        self.show_attach_prompt = false;
        self.attach_input.clear();
        self.attach_cursor = 0;
    }

    pub fn attach_insert_str(&mut self, s: &str) {
        let byte_pos = char_to_byte_index(&self.attach_input, self.attach_cursor);
        self.attach_input.insert_str(byte_pos, s);
        self.attach_cursor += s.chars().count();
    }

    pub fn attach_backspace(&mut self) {
        if self.attach_cursor > 0 {
            self.attach_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.attach_input, self.attach_cursor);
            self.attach_input.remove(byte_pos);
        }
    }

    /// Stage the file named in the attach prompt. The prompt is reset either
    /// way so the same path can be entered again.
    pub fn attach_from_prompt(&mut self, now: Instant) -> bool {
        let path = expand_path(&self.attach_input);
        self.close_attach_prompt();

        if path.as_os_str().is_empty() {
            return false;
        }

        match Attachment::from_path(&path) {
            Ok(candidate) => self.session.attach_file(candidate, now),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read attachment");
                self.session.notify(READ_ERROR_TEXT, now);
                false
            }
        }
    }

    pub fn clear_file(&mut self) {
        self.session.clear_file();
    }

    // Notification

    pub fn dismiss_notification(&mut self, reason: DismissReason) -> bool {
        self.session.dismiss_notification(reason)
    }

    /// Tick animation frame and notification timer (called by Tick event)
    pub fn tick(&mut self, now: Instant) {
        if self.session.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.session.tick(now);
    }

    // Transcript scrolling

    /// Re-attach to the bottom whenever the transcript or loading flag changed.
    pub fn sync_auto_scroll(&mut self) {
        let current = (self.session.transcript().len(), self.session.is_loading());
        if current != self.seen {
            self.seen = current;
            self.follow_tail = true;
        }
    }

    /// Apply the rendered line count to the scroll position.
    pub fn update_scroll_bounds(&mut self, total_lines: u16) {
        self.max_scroll = total_lines.saturating_sub(self.chat_height);
        if self.follow_tail {
            self.transcript_scroll = self.max_scroll;
        } else {
            self.transcript_scroll = self.transcript_scroll.min(self.max_scroll);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.transcript_scroll = self.transcript_scroll.saturating_add(lines).min(self.max_scroll);
        self.follow_tail = self.transcript_scroll >= self.max_scroll;
    }

    pub fn scroll_to_top(&mut self) {
        self.transcript_scroll = 0;
        self.follow_tail = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.transcript_scroll = self.max_scroll;
        self.follow_tail = true;
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    // View picker

    pub fn open_view_picker(&mut self) {
        let current_idx = View::all()
            .iter()
            .position(|v| *v == self.view)
            .unwrap_or(0);
        self.view_picker_state.select(Some(current_idx));
        self.show_view_picker = true;
    }

    pub fn view_picker_nav_down(&mut self) {
        let len = View::all().len();
        let i = self.view_picker_state.selected().unwrap_or(0);
        self.view_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn view_picker_nav_up(&mut self) {
        let i = self.view_picker_state.selected().unwrap_or(0);
        self.view_picker_state.select(Some(i.saturating_sub(1)));
    }

    /// Apply the highlighted view. Returns it so the caller can persist it.
    pub fn select_view(&mut self) -> Option<View> {
        self.show_view_picker = false;
        let view = self
            .view_picker_state
            .selected()
            .and_then(|i| View::all().get(i).copied())?;
        self.view = view;
        Some(view)
    }
}

/// Turn prompt input into a path: trims quotes from drag-and-drop and expands `~`.
fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim().trim_matches(|c| c == '"' || c == '\'');

    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }

    PathBuf::from(trimmed)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Arc;
    use tokio::sync::mpsc;
    use typhoon_core::{ApiError, ChatBackend, SendRequest};

    /// Backend that echoes the message back.
    pub(crate) struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn send(&self, request: SendRequest) -> Result<String, ApiError> {
            Ok(format!("echo: {}", request.text))
        }
    }

    pub(crate) fn test_app() -> (App, mpsc::UnboundedReceiver<TurnOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(Arc::new(EchoBackend), tx);
        (App::new(session, View::Rich), rx)
    }

    #[test]
    fn test_editing_is_utf8_safe() {
        let (mut app, _rx) = test_app();
        for c in "สวัสดี".chars() {
            app.insert_char(c);
        }
        app.cursor_left();
        app.backspace();
        app.cursor_home();
        app.delete();

        assert_eq!(app.session.composer().text(), "วัสี");
        assert_eq!(app.input_cursor, 0);
    }

    #[test]
    fn test_insert_str_normalizes_newlines() {
        let (mut app, _rx) = test_app();
        app.insert_str("a\r\nb\rc");
        assert_eq!(app.session.composer().text(), "a\nb\nc");
        assert_eq!(app.input_cursor, 5);
    }

    #[tokio::test]
    async fn test_send_resets_cursor_and_settles() {
        let (mut app, mut rx) = test_app();
        app.insert_str("hello");

        assert!(matches!(app.send(), SendStatus::Dispatched(_)));
        assert_eq!(app.input_cursor, 0);
        assert!(app.session.is_loading());

        let outcome = rx.recv().await.unwrap();
        app.settle(outcome);

        assert!(!app.session.is_loading());
        assert_eq!(app.session.transcript().last().unwrap().text(), "echo: hello");
    }

    #[test]
    fn test_attach_unsupported_file_resets_prompt_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::File::create(&path).unwrap().write_all(b"plain").unwrap();

        let (mut app, _rx) = test_app();
        app.open_attach_prompt();
        app.attach_insert_str(&path.display().to_string());

        assert!(!app.attach_from_prompt(Instant::now()));
        assert!(!app.show_attach_prompt);
        assert!(app.attach_input.is_empty());
        assert!(app.session.composer().file().is_none());
        assert_eq!(
            app.session.notification().message(),
            typhoon_core::composer::UNSUPPORTED_FILE_TEXT
        );
    }

    #[test]
    fn test_attach_png_with_quoted_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        std::fs::File::create(&path).unwrap().write_all(b"\x89PNG").unwrap();

        let (mut app, _rx) = test_app();
        app.open_attach_prompt();
        app.attach_insert_str(&format!("'{}'", path.display()));

        assert!(app.attach_from_prompt(Instant::now()));
        assert_eq!(
            app.session.composer().file().map(|f| f.name.as_str()),
            Some("shot.png")
        );
        assert!(!app.session.notification().is_open());
    }

    #[test]
    fn test_attach_missing_file_notifies_read_error() {
        let (mut app, _rx) = test_app();
        app.open_attach_prompt();
        app.attach_insert_str("/definitely/not/here.pdf");

        assert!(!app.attach_from_prompt(Instant::now()));
        assert_eq!(app.session.notification().message(), READ_ERROR_TEXT);
    }

    #[test]
    fn test_scroll_detaches_and_reattaches_tail() {
        let (mut app, _rx) = test_app();
        app.chat_height = 10;
        app.update_scroll_bounds(30);
        assert_eq!(app.transcript_scroll, 20);

        app.scroll_up(5);
        assert!(!app.follow_tail);
        app.update_scroll_bounds(35);
        assert_eq!(app.transcript_scroll, 15);

        app.scroll_down(100);
        assert!(app.follow_tail);
        assert_eq!(app.transcript_scroll, 25);
    }

    #[test]
    fn test_view_picker_selects_view() {
        let (mut app, _rx) = test_app();
        app.open_view_picker();
        app.view_picker_nav_up();

        assert_eq!(app.select_view(), Some(View::Compact));
        assert_eq!(app.view, View::Compact);
        assert!(!app.show_view_picker);
    }
}
