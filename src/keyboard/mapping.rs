//! Resolution of the physical key the user is expected to press next.
//!
//! `resolve_expected_key` is a pure function of the text buffer and the cursor
//! position. Rules, in priority order:
//!
//! 1. A newline whose next non-newline char is a letter is typed as a space.
//!    Any other newline resolves to whatever follows the newline run, and
//!    a newline run reaching the end of the buffer resolves to the terminal
//!    placeholder (`Enter`).
//! 2. A space is always typed explicitly.
//! 3. An uppercase letter is typed with Caps Lock when it starts a run of
//!    [`CAPS_LOCK_RUN`] uppercase letters, otherwise with Shift.
//! 4. A shifted punctuation symbol is typed as its base key plus Shift.
//! 5. Anything else is typed as itself.

use crate::keyboard::display::{ENTER, SPACE, key_label};

/// Minimum number of consecutive uppercase letters typed with Caps Lock.
pub const CAPS_LOCK_RUN: usize = 3;

/// Shifted symbol to unshifted base key on a US QWERTY layout.
pub const SHIFTED_SYMBOLS: &[(char, char)] = &[
    ('!', '1'),
    ('@', '2'),
    ('#', '3'),
    ('$', '4'),
    ('%', '5'),
    ('^', '6'),
    ('&', '7'),
    ('*', '8'),
    ('(', '9'),
    (')', '0'),
    ('_', '-'),
    ('+', '='),
    ('{', '['),
    ('}', ']'),
    ('|', '\\'),
    (':', ';'),
    ('"', '\''),
    ('<', ','),
    ('>', '.'),
    ('?', '/'),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedKey {
    /// Unshifted key cap to press (`' '` for space, `'\n'` for the terminal placeholder).
    pub physical_key: char,
    pub needs_shift: bool,
    pub needs_caps_lock: bool,
    /// Prompt text such as `"Shift + A"`. Never used for matching.
    pub display_label: String,
}

impl ExpectedKey {
    fn plain(ch: char) -> Self {
        Self {
            physical_key: ch,
            needs_shift: false,
            needs_caps_lock: false,
            display_label: key_label(ch),
        }
    }

    fn shifted(physical_key: char, literal: char) -> Self {
        Self {
            physical_key,
            needs_shift: true,
            needs_caps_lock: false,
            display_label: format!("Shift + {literal}"),
        }
    }

    fn caps_locked(physical_key: char, literal: char) -> Self {
        Self {
            physical_key,
            needs_shift: false,
            needs_caps_lock: true,
            display_label: format!("Caps Lock + {literal}"),
        }
    }

    pub fn terminal() -> Self {
        Self::plain(ENTER)
    }

    pub fn is_terminal(&self) -> bool {
        self.physical_key == ENTER
    }

    /// True when either Shift or Caps Lock produces the expected char.
    pub fn needs_modifier(&self) -> bool {
        self.needs_shift || self.needs_caps_lock
    }
}

pub fn unshifted_symbol(ch: char) -> Option<char> {
    SHIFTED_SYMBOLS
        .iter()
        .find(|(shifted, _)| *shifted == ch)
        .map(|&(_, base)| base)
}

fn to_lower(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

/// The unshifted key cap that produces `ch`: shifted symbols map to their base
/// key, letters to lowercase, everything else to itself.
pub fn base_key(ch: char) -> char {
    unshifted_symbol(ch).unwrap_or_else(|| to_lower(ch))
}

/// Index of the first non-newline char at or after `from`.
pub fn next_non_newline(buffer: &[char], from: usize) -> Option<usize> {
    buffer
        .iter()
        .enumerate()
        .skip(from)
        .find(|&(_, &ch)| ch != ENTER)
        .map(|(idx, _)| idx)
}

/// Whether the newline at `position` must be typed as a space (its lookahead
/// char is a letter). Each newline of a run is tested on its own.
pub fn newline_needs_space(buffer: &[char], position: usize) -> bool {
    buffer.get(position) == Some(&ENTER)
        && next_non_newline(buffer, position)
            .map(|idx| buffer[idx].is_alphabetic())
            .unwrap_or(false)
}

/// Whether the uppercase letter at `position` starts a Caps Lock run.
pub fn starts_caps_run(buffer: &[char], position: usize) -> bool {
    position + CAPS_LOCK_RUN <= buffer.len()
        && buffer[position..position + CAPS_LOCK_RUN]
            .iter()
            .all(|ch| ch.is_uppercase())
}

/// Resolve the key expected at `position`. Positions at or past the end of the
/// buffer resolve to the terminal placeholder.
pub fn resolve_expected_key(buffer: &[char], position: usize) -> ExpectedKey {
    let Some(&ch) = buffer.get(position) else {
        return ExpectedKey::terminal();
    };

    match ch {
        ENTER => match next_non_newline(buffer, position) {
            None => ExpectedKey::terminal(),
            Some(idx) if buffer[idx].is_alphabetic() => ExpectedKey::plain(SPACE),
            Some(idx) => resolve_expected_key(buffer, idx),
        },
        SPACE => ExpectedKey::plain(SPACE),
        c if c.is_uppercase() => {
            if starts_caps_run(buffer, position) {
                ExpectedKey::caps_locked(to_lower(c), c)
            } else {
                ExpectedKey::shifted(to_lower(c), c)
            }
        }
        c => match unshifted_symbol(c) {
            Some(base) => ExpectedKey::shifted(base, c),
            None => ExpectedKey::plain(c),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_plain_letter_needs_no_modifier() {
        let key = resolve_expected_key(&chars("abc"), 1);
        assert_eq!(key.physical_key, 'b');
        assert!(!key.needs_modifier());
        assert_eq!(key.display_label, "b");
    }

    #[test]
    fn test_short_uppercase_runs_need_shift() {
        for text in ["Ab", "ABc", "AB"] {
            let key = resolve_expected_key(&chars(text), 0);
            assert!(key.needs_shift, "{text}");
            assert!(!key.needs_caps_lock, "{text}");
            assert_eq!(key.physical_key, 'a');
            assert_eq!(key.display_label, "Shift + A");
        }
    }

    #[test]
    fn test_three_uppercase_letters_need_caps_lock() {
        let buffer = chars("NASA rocks");
        let key = resolve_expected_key(&buffer, 0);
        assert!(key.needs_caps_lock);
        assert!(!key.needs_shift);
        assert_eq!(key.physical_key, 'n');
        assert_eq!(key.display_label, "Caps Lock + N");

        // Run counted from the position itself: "SA " is only two long.
        let key = resolve_expected_key(&buffer, 2);
        assert!(key.needs_shift);
        assert!(!key.needs_caps_lock);
    }

    #[test]
    fn test_caps_run_at_buffer_end() {
        assert!(starts_caps_run(&chars("xYES"), 1));
        assert!(!starts_caps_run(&chars("xYE"), 1));
    }

    #[test]
    fn test_shifted_symbols_map_to_base_keys() {
        let buffer = chars("!@#$%^&*()_+{}|:\"<>?");
        let bases = "1234567890-=[]\\;',./";
        for (idx, base) in bases.chars().enumerate() {
            let key = resolve_expected_key(&buffer, idx);
            assert_eq!(key.physical_key, base);
            assert!(key.needs_shift);
            assert!(!key.needs_caps_lock);
            assert_eq!(key.display_label, format!("Shift + {}", buffer[idx]));
        }
    }

    #[test]
    fn test_space_is_explicit() {
        let key = resolve_expected_key(&chars("a b"), 1);
        assert_eq!(key.physical_key, ' ');
        assert_eq!(key.display_label, "Space");
    }

    #[test]
    fn test_newline_before_letter_is_space() {
        let buffer = chars("A\n\nB");
        for position in [1, 2] {
            let key = resolve_expected_key(&buffer, position);
            assert_eq!(key.physical_key, ' ');
            assert!(!key.needs_modifier());
        }
    }

    #[test]
    fn test_newline_before_symbol_resolves_to_lookahead() {
        let buffer = chars("a\n\n\"Hi\"");
        let key = resolve_expected_key(&buffer, 1);
        assert_eq!(key.physical_key, '\'');
        assert!(key.needs_shift);
    }

    #[test]
    fn test_trailing_newlines_resolve_to_terminal() {
        let buffer = chars("end\n\n");
        assert!(resolve_expected_key(&buffer, 3).is_terminal());
        assert!(resolve_expected_key(&buffer, 5).is_terminal());
        assert_eq!(ExpectedKey::terminal().display_label, "Enter");
    }

    #[test]
    fn test_base_key() {
        assert_eq!(base_key('Q'), 'q');
        assert_eq!(base_key('?'), '/');
        assert_eq!(base_key('7'), '7');
    }

    #[test]
    fn test_newline_needs_space_is_per_position() {
        let buffer = chars("x\n\n1\nz");
        assert!(!newline_needs_space(&buffer, 1));
        assert!(!newline_needs_space(&buffer, 2));
        assert!(newline_needs_space(&buffer, 4));
        assert!(!newline_needs_space(&buffer, 0));
    }
}
