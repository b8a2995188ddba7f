use crossterm::event::{KeyCode, KeyEvent, KeyEventState, KeyModifiers, ModifierKeyCode};

use crate::keyboard::display::{BACKSPACE, ENTER, SPACE, TAB};
use crate::keyboard::mapping::{
    ExpectedKey, base_key, newline_needs_space, resolve_expected_key, unshifted_symbol,
};

/// Identity of the physical key behind an input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyIdentity {
    Char(char),
    Enter,
    Tab,
    Backspace,
    /// Shift, Control, Alt, Meta or Caps Lock pressed on its own.
    Modifier,
    /// Navigation and function keys; never typed.
    Other,
}

/// One raw keyboard event as delivered by the terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyInput {
    pub key: KeyIdentity,
    pub shift: bool,
    pub caps_lock: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyInput {
    pub fn new(key: KeyIdentity) -> Self {
        Self {
            key,
            shift: false,
            caps_lock: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    pub fn char(ch: char) -> Self {
        Self::new(KeyIdentity::Char(ch))
    }

    pub fn backspace() -> Self {
        Self::new(KeyIdentity::Backspace)
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_caps_lock(mut self) -> Self {
        self.caps_lock = true;
        self
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Translate a crossterm key event. Terminals only report Caps Lock state with
    /// keyboard enhancement enabled, so an uppercase letter typed without Shift
    /// is also read as Caps Lock being on.
    pub fn from_crossterm(event: &KeyEvent) -> Self {
        let key = match event.code {
            KeyCode::Char(ch) => KeyIdentity::Char(ch),
            KeyCode::Enter => KeyIdentity::Enter,
            KeyCode::Tab => KeyIdentity::Tab,
            KeyCode::Backspace => KeyIdentity::Backspace,
            KeyCode::CapsLock | KeyCode::Modifier(_) => KeyIdentity::Modifier,
            _ => KeyIdentity::Other,
        };
        let shift = event.modifiers.contains(KeyModifiers::SHIFT)
            || matches!(
                event.code,
                KeyCode::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift)
            );
        let caps_lock = event.state.contains(KeyEventState::CAPS_LOCK)
            || matches!(key, KeyIdentity::Char(ch) if ch.is_uppercase() && !shift);

        Self {
            key,
            shift,
            caps_lock,
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            alt: event.modifiers.contains(KeyModifiers::ALT),
            meta: event
                .modifiers
                .intersects(KeyModifiers::META | KeyModifiers::SUPER),
        }
    }

    fn has_command_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }

    /// The char this event types, if it types one.
    pub fn typed_char(&self) -> Option<char> {
        match self.key {
            KeyIdentity::Char(ch) => Some(ch),
            KeyIdentity::Enter => Some(ENTER),
            KeyIdentity::Tab => Some(TAB),
            KeyIdentity::Backspace => Some(BACKSPACE),
            KeyIdentity::Modifier | KeyIdentity::Other => None,
        }
    }
}

/// A state change produced by interpreting one key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Classify the char at the cursor and advance by one.
    Score { expected: char, correct: bool },
    /// Step the cursor back by one and forget its classification.
    Retreat,
}

/// Decide whether `pressed` satisfies the expected key for `expected_char`.
///
/// This single predicate drives both the branch taken and the classification
/// stored for the position.
pub fn key_matches(
    expected: &ExpectedKey,
    expected_char: char,
    input: &KeyInput,
    pressed: char,
) -> bool {
    if expected.physical_key == SPACE {
        return pressed == SPACE;
    }
    if pressed == expected_char {
        return true;
    }

    if expected.needs_modifier() {
        let produced_shifted = pressed.is_uppercase() || unshifted_symbol(pressed).is_some();
        let modifier_active = input.shift || input.caps_lock || produced_shifted;
        return modifier_active && base_key(pressed) == expected.physical_key;
    }

    if expected_char.is_alphabetic() {
        return pressed.to_lowercase().eq(expected_char.to_lowercase());
    }

    false
}

/// Interpret one key event against an immutable view of the buffer.
///
/// Returns the complete chain of transitions to apply, including newlines that
/// are skipped without a keystroke. An empty list means the event is ignored.
pub fn interpret(buffer: &[char], position: usize, input: &KeyInput) -> Vec<Transition> {
    if input.key == KeyIdentity::Modifier {
        return Vec::new();
    }
    if input.key == KeyIdentity::Backspace {
        return vec![Transition::Retreat];
    }
    if input.has_command_modifier() {
        return Vec::new();
    }
    let Some(pressed) = input.typed_char() else {
        return Vec::new();
    };

    let mut transitions = Vec::new();
    let mut pos = position;
    while pos < buffer.len() && buffer[pos] == ENTER && !newline_needs_space(buffer, pos) {
        transitions.push(Transition::Score {
            expected: ENTER,
            correct: true,
        });
        pos += 1;
    }
    if pos >= buffer.len() {
        // Terminal: the skipped newlines are kept, the keystroke itself is dropped.
        return transitions;
    }

    let expected_char = buffer[pos];
    let expected = resolve_expected_key(buffer, pos);
    transitions.push(Transition::Score {
        expected: expected_char,
        correct: key_matches(&expected, expected_char, input, pressed),
    });
    transitions
}
