use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::keyboard::mapping::{ExpectedKey, resolve_expected_key};
use crate::session::input::{self, KeyInput, Transition};
use crate::session::stats::SessionStats;
use crate::store::schema::ProgressSnapshot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharClass {
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// No book loaded.
    Idle,
    /// Book loaded, cursor before the end.
    Loaded,
    /// Cursor at the end of the buffer.
    Complete,
}

/// State of one typing session over one book.
///
/// The buffer never changes after `load`. `typed` only holds indices visited
/// since the last load, all of them below `position`.
#[derive(Clone, Debug, Default)]
pub struct TypingSession {
    book_id: Option<String>,
    title: String,
    buffer: Vec<char>,
    position: usize,
    typed: HashMap<usize, CharClass>,
    stats: SessionStats,
    started_at: Option<DateTime<Utc>>,
    active: bool,
}

impl TypingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with a fresh or resumed book. A saved snapshot that
    /// does not fit the text is ignored and the book starts from scratch.
    pub fn load(
        &mut self,
        book_id: &str,
        title: &str,
        text: &str,
        progress: Option<&ProgressSnapshot>,
        now: DateTime<Utc>,
    ) {
        let buffer: Vec<char> = text.chars().collect();
        let progress = progress.filter(|p| {
            let fits = p.fits(buffer.len());
            if !fits {
                warn!(book_id, position = p.position_index, len = buffer.len(), "ignoring saved progress");
            }
            fits
        });

        let (position, stats) = match progress {
            Some(p) => (p.position_index, p.stats.clone()),
            None => (0, SessionStats::new(now)),
        };
        info!(book_id, position, len = buffer.len(), "book loaded");

        *self = Self {
            book_id: Some(book_id.to_string()),
            title: title.to_string(),
            buffer,
            position,
            typed: HashMap::new(),
            stats,
            started_at: None,
            active: false,
        };
    }

    pub fn is_current(&self, book_id: &str) -> bool {
        self.book_id.as_deref() == Some(book_id)
    }

    pub fn phase(&self) -> SessionPhase {
        if self.book_id.is_none() {
            SessionPhase::Idle
        } else if self.is_complete() {
            SessionPhase::Complete
        } else {
            SessionPhase::Loaded
        }
    }

    pub fn is_complete(&self) -> bool {
        self.position >= self.buffer.len()
    }

    pub fn book_id(&self) -> Option<&str> {
        self.book_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn buffer(&self) -> &[char] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn classification(&self, index: usize) -> Option<CharClass> {
        self.typed.get(&index).copied()
    }

    pub fn typed(&self) -> &HashMap<usize, CharClass> {
        &self.typed
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn progress(&self) -> f64 {
        if self.buffer.is_empty() {
            return 0.0;
        }
        self.position as f64 / self.buffer.len() as f64
    }

    /// Key the user should press next, for prompting.
    pub fn expected_key(&self) -> ExpectedKey {
        resolve_expected_key(&self.buffer, self.position)
    }

    /// Seconds since the session started; zero while unfocused.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> f64 {
        match (self.active, self.started_at) {
            (true, Some(start)) => ((now - start).num_milliseconds() as f64 / 1000.0).max(0.0),
            _ => 0.0,
        }
    }

    pub fn start_session(&mut self, now: DateTime<Utc>) {
        if self.book_id.is_none() || self.is_complete() {
            return;
        }
        self.started_at = Some(now);
        self.active = true;
        debug!(position = self.position, "session started");
    }

    /// Stop accruing time. The start timestamp is kept but no longer used.
    pub fn end_session(&mut self) {
        if self.active {
            debug!(position = self.position, "session ended");
        }
        self.active = false;
    }

    /// Classify the char at the cursor and advance. No-op at the end of the buffer.
    pub fn score(&mut self, expected: char, correct: bool, now: DateTime<Utc>) {
        if self.book_id.is_none() || self.position >= self.buffer.len() {
            return;
        }
        let class = if correct {
            CharClass::Correct
        } else {
            CharClass::Incorrect
        };
        self.typed.insert(self.position, class);
        self.position += 1;

        self.stats.total_typed += 1;
        if !correct {
            self.stats.total_errors += 1;
        }
        let elapsed = self.elapsed_secs(now);
        self.stats.recompute(elapsed);
        self.stats.last_session_at = now;
        debug!(?expected, correct, position = self.position, "scored");
    }

    /// Step back one char (Backspace). No-op at the start of the buffer.
    pub fn retreat(&mut self, now: DateTime<Utc>) {
        if self.position == 0 {
            return;
        }
        self.position -= 1;
        let removed = self.typed.remove(&self.position);

        self.stats.total_typed = self.stats.total_typed.saturating_sub(1);
        if removed == Some(CharClass::Incorrect) {
            self.stats.total_errors = self.stats.total_errors.saturating_sub(1);
        }
        let elapsed = self.elapsed_secs(now);
        self.stats.recompute(elapsed);
        debug!(position = self.position, "retreated");
    }

    pub fn apply(&mut self, transition: Transition, now: DateTime<Utc>) {
        match transition {
            Transition::Score { expected, correct } => self.score(expected, correct, now),
            Transition::Retreat => self.retreat(now),
        }
    }

    pub fn apply_all(&mut self, transitions: &[Transition], now: DateTime<Utc>) {
        for &transition in transitions {
            self.apply(transition, now);
        }
    }

    /// Interpret a key event against the current buffer and apply the result.
    /// Returns the transitions that were applied.
    pub fn handle_key(&mut self, key: &KeyInput, now: DateTime<Utc>) -> Vec<Transition> {
        if self.book_id.is_none() {
            return Vec::new();
        }
        let transitions = input::interpret(&self.buffer, self.position, key);
        self.apply_all(&transitions, now);
        transitions
    }

    /// Progress record for persistence, or `None` when no book is loaded.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<ProgressSnapshot> {
        let book_id = self.book_id.clone()?;
        Some(ProgressSnapshot {
            book_id,
            title: self.title.clone(),
            total_chars: self.buffer.len(),
            position_index: self.position,
            updated_at: now,
            stats: self.stats.clone(),
        })
    }
}
