use std::fs;
use std::path::Path;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;

pub const DEFAULT_THEME: &str = "default";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub colors: ThemeColors,
}

/// Hex colors, `#rrggbb`. Missing entries fall back to the built-in palette.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    pub fg: String,
    pub text_correct: String,
    pub text_incorrect: String,
    pub text_incorrect_bg: String,
    pub text_pending: String,
    pub text_cursor_bg: String,
    pub text_cursor_fg: String,
    pub expected_key: String,
    pub modifier_key: String,
    pub pressed_key: String,
    pub accent: String,
    pub border: String,
    pub border_paused: String,
    pub bar_filled: String,
    pub bar_empty: String,
    pub warning: String,
}

impl Theme {
    /// Look up `<config_dir>/bookdr/themes/<name>.toml`.
    pub fn load(name: &str) -> Option<Self> {
        let path = Config::config_dir()
            .join("themes")
            .join(format!("{name}.toml"));
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        match toml::from_str::<Theme>(&content) {
            Ok(theme) => Some(theme),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed theme");
                None
            }
        }
    }

    /// The named theme, or the built-in one when it can't be found.
    pub fn resolve(name: &str) -> Self {
        if name == DEFAULT_THEME {
            return Self::default();
        }
        Self::load(name).unwrap_or_else(|| {
            warn!(theme = name, "theme not found, using default");
            Self::default()
        })
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: DEFAULT_THEME.to_string(),
            colors: ThemeColors::default(),
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            fg: "#cdd6f4".to_string(),
            text_correct: "#a6e3a1".to_string(),
            text_incorrect: "#f38ba8".to_string(),
            text_incorrect_bg: "#45273a".to_string(),
            text_pending: "#7f849c".to_string(),
            text_cursor_bg: "#f5e0dc".to_string(),
            text_cursor_fg: "#1e1e2e".to_string(),
            expected_key: "#f9e2af".to_string(),
            modifier_key: "#fab387".to_string(),
            pressed_key: "#89dceb".to_string(),
            accent: "#89b4fa".to_string(),
            border: "#45475a".to_string(),
            border_paused: "#f9e2af".to_string(),
            bar_filled: "#89b4fa".to_string(),
            bar_empty: "#313244".to_string(),
            warning: "#f9e2af".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Color::Rgb(r, g, b);
            }
        }
        Color::White
    }

    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_correct(&self) -> Color { Self::parse_color(&self.text_correct) }
    pub fn text_incorrect(&self) -> Color { Self::parse_color(&self.text_incorrect) }
    pub fn text_incorrect_bg(&self) -> Color { Self::parse_color(&self.text_incorrect_bg) }
    pub fn text_pending(&self) -> Color { Self::parse_color(&self.text_pending) }
    pub fn text_cursor_bg(&self) -> Color { Self::parse_color(&self.text_cursor_bg) }
    pub fn text_cursor_fg(&self) -> Color { Self::parse_color(&self.text_cursor_fg) }
    pub fn expected_key(&self) -> Color { Self::parse_color(&self.expected_key) }
    pub fn modifier_key(&self) -> Color { Self::parse_color(&self.modifier_key) }
    pub fn pressed_key(&self) -> Color { Self::parse_color(&self.pressed_key) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_paused(&self) -> Color { Self::parse_color(&self.border_paused) }
    pub fn bar_filled(&self) -> Color { Self::parse_color(&self.bar_filled) }
    pub fn bar_empty(&self) -> Color { Self::parse_color(&self.bar_empty) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(ThemeColors::parse_color("#ff8000"), Color::Rgb(255, 128, 0));
        assert_eq!(ThemeColors::parse_color("00ff00"), Color::Rgb(0, 255, 0));
        assert_eq!(ThemeColors::parse_color("#zzz"), Color::White);
    }

    #[test]
    fn test_partial_theme_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "name = \"mono\"\n[colors]\naccent = \"#ffffff\"\n").unwrap();
        let theme = Theme::load_from(file.path()).unwrap();
        assert_eq!(theme.name, "mono");
        assert_eq!(theme.colors.accent(), Color::Rgb(255, 255, 255));
        assert_eq!(theme.colors.fg, ThemeColors::default().fg);
    }

    #[test]
    fn test_malformed_theme_is_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "name = [").unwrap();
        assert!(Theme::load_from(file.path()).is_none());
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let theme = Theme::resolve("no-such-theme-anywhere");
        assert_eq!(theme.name, DEFAULT_THEME);
    }
}
