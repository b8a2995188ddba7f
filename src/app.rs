use std::time::Instant;

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::book::Book;
use crate::config::Config;
use crate::keyboard::model::KeyboardModel;
use crate::session::autosave::Autosave;
use crate::session::input::KeyInput;
use crate::session::typing::TypingSession;
use crate::store::sync::{PendingSync, ProgressSync};
use crate::ui::theme::Theme;

pub struct App {
    pub session: TypingSession,
    pub sync: ProgressSync,
    pub autosave: Autosave,
    pub theme: Theme,
    pub keyboard: KeyboardModel,
    pub show_keyboard: bool,
    /// Terminal focus as reported by the terminal.
    pub terminal_focused: bool,
    /// Paused with Esc.
    pub paused: bool,
    pub should_quit: bool,
    pub status: Option<String>,
    /// Last char typed, highlighted on the keyboard diagram.
    pub last_typed: Option<char>,
    /// Remote saves that may still be in flight.
    pending: Vec<PendingSync>,
}

impl App {
    pub fn new(config: &Config, sync: ProgressSync, theme: Theme) -> Self {
        Self {
            session: TypingSession::new(),
            sync,
            autosave: Autosave::new(config.autosave_delay()),
            theme,
            keyboard: KeyboardModel::qwerty(),
            show_keyboard: config.show_keyboard,
            terminal_focused: true,
            paused: false,
            should_quit: false,
            status: None,
            last_typed: None,
            pending: Vec::new(),
        }
    }

    /// Whether keystrokes currently reach the session.
    pub fn is_focused(&self) -> bool {
        self.terminal_focused && !self.paused
    }

    /// Load `book` with its reconciled progress. Returns false when the book is
    /// already the current one, in which case nothing changes.
    pub fn open_book(&mut self, book: &Book) -> bool {
        if self.session.is_current(&book.id) {
            return false;
        }
        if self.session.book_id().is_some() {
            self.flush();
        }
        let progress = self.sync.load(&book.id, book.char_count());
        self.session
            .load(&book.id, &book.title, &book.text, progress.as_ref(), Utc::now());
        self.last_typed = None;
        if self.is_focused() {
            self.session.start_session(Utc::now());
        }
        true
    }

    fn gain_focus(&mut self) {
        self.session.start_session(Utc::now());
    }

    fn lose_focus(&mut self) {
        self.session.end_session();
        self.flush();
    }

    pub fn set_terminal_focus(&mut self, focused: bool) {
        let was_focused = self.is_focused();
        self.terminal_focused = focused;
        match (was_focused, self.is_focused()) {
            (false, true) => self.gain_focus(),
            (true, false) => self.lose_focus(),
            _ => {}
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        let was_focused = self.is_focused();
        self.paused = paused;
        match (was_focused, self.is_focused()) {
            (false, true) => self.gain_focus(),
            (true, false) => self.lose_focus(),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => {
                self.quit();
                return;
            }
            KeyCode::Char('s') if ctrl => {
                self.save_now();
                return;
            }
            KeyCode::Esc => {
                self.set_paused(true);
                return;
            }
            KeyCode::Enter if self.paused => {
                self.set_paused(false);
                return;
            }
            _ => {}
        }
        if !self.is_focused() {
            return;
        }

        let input = KeyInput::from_crossterm(&key);
        let was_complete = self.session.is_complete();
        let before = self.session.position();
        let applied = self.session.handle_key(&input, Utc::now());
        if applied.is_empty() {
            return;
        }
        self.last_typed = input.typed_char();
        self.status = None;

        if self.session.position() != before && self.session.position() > 0 {
            self.autosave.touch(Instant::now());
        }
        if !was_complete && self.session.is_complete() {
            info!(book_id = ?self.session.book_id(), "book finished");
            self.session.end_session();
            self.flush();
            self.status = Some("Finished!".to_string());
        }
    }

    /// Fire the debounced save once its deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.autosave.poll(now) {
            self.flush();
        }
    }

    /// Persist a snapshot now and disarm the debounce.
    pub fn flush(&mut self) {
        self.autosave.cancel();
        let Some(snapshot) = self.session.snapshot(Utc::now()) else {
            return;
        };
        match self.sync.save(&snapshot) {
            Ok(pending) => {
                self.pending.retain(|p| !p.is_finished());
                self.pending.push(pending);
            }
            Err(e) => {
                warn!(book_id = %snapshot.book_id, error = %e, "saving progress failed");
                self.status = Some(format!("Save failed: {e}"));
            }
        }
    }

    pub fn save_now(&mut self) {
        self.flush();
        if self.status.is_none() {
            self.status = Some("Progress saved".to_string());
        }
    }

    pub fn quit(&mut self) {
        self.session.end_session();
        self.flush();
        self.should_quit = true;
    }

    /// Block until every remote save started so far has finished. Each one is
    /// bounded by the sync timeout.
    pub fn wait_for_sync(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            info!(count = pending.len(), "waiting for remote saves");
        }
        for p in pending {
            p.wait();
        }
    }
}
