/// Key display adapter for sentinel chars.
///
/// Sentinel chars (`'\x08'`, `'\t'`, `'\n'`) stand in for non-printable keys at the
/// input boundary (`KeyInput::from_crossterm`) and inside the text buffer (`'\n'`).
/// Rendering code goes through these helpers instead of matching sentinels directly.

/// Sentinel char for Backspace.
pub const BACKSPACE: char = '\x08';
/// Sentinel char for Tab.
pub const TAB: char = '\t';
/// Sentinel char for Enter. Also the newline char of the text buffer.
pub const ENTER: char = '\n';
/// Space character (not a sentinel, but labelled like one).
pub const SPACE: char = ' ';

/// Human-readable name for a key character (including sentinels).
/// Returns `""` for printable chars; callers use `ch.to_string()` for those.
pub fn key_display_name(ch: char) -> &'static str {
    match ch {
        BACKSPACE => "Backspace",
        TAB => "Tab",
        ENTER => "Enter",
        SPACE => "Space",
        _ => "",
    }
}

/// Label suitable for prompts: named keys by name, everything else as itself.
pub fn key_label(ch: char) -> String {
    match key_display_name(ch) {
        "" => ch.to_string(),
        name => name.to_string(),
    }
}

/// Glyph used when a buffer char is drawn inline in the text window.
pub fn buffer_glyph(ch: char) -> String {
    match ch {
        ENTER => "\u{21b5}".to_string(), // ↵
        TAB => "\u{2192}".to_string(),   // →
        _ => ch.to_string(),
    }
}
