use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Widget};

use crate::keyboard::display::{ENTER, SPACE};
use crate::keyboard::mapping::ExpectedKey;
use crate::keyboard::model::KeyboardModel;
use crate::ui::theme::Theme;

const KEY_WIDTH: u16 = 4;
const ROW_OFFSETS: &[u16] = &[0, 2, 3, 5];

/// QWERTY diagram with the next physical key lit, plus a modifier line showing
/// Shift, Caps Lock, Space and Enter.
pub struct KeyboardDiagram<'a> {
    model: &'a KeyboardModel,
    expected: &'a ExpectedKey,
    pressed: Option<char>,
    theme: &'a Theme,
}

impl<'a> KeyboardDiagram<'a> {
    pub fn new(
        model: &'a KeyboardModel,
        expected: &'a ExpectedKey,
        pressed: Option<char>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            model,
            expected,
            pressed,
            theme,
        }
    }

    fn key_style(&self, lit: bool, pressed: bool) -> Style {
        let colors = &self.theme.colors;
        if lit {
            Style::default()
                .fg(colors.text_cursor_fg())
                .bg(colors.expected_key())
                .add_modifier(Modifier::BOLD)
        } else if pressed {
            Style::default().fg(colors.pressed_key())
        } else {
            Style::default().fg(colors.text_pending())
        }
    }

    fn modifier_style(&self, lit: bool) -> Style {
        if lit {
            Style::default()
                .fg(self.theme.colors.text_cursor_fg())
                .bg(self.theme.colors.modifier_key())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.colors.text_pending())
        }
    }
}

/// Modifier line entries, left to right.
fn modifier_labels(expected: &ExpectedKey) -> [(&'static str, bool); 4] {
    [
        ("Caps Lock", expected.needs_caps_lock),
        ("Shift", expected.needs_shift),
        ("Space", expected.physical_key == SPACE),
        ("Enter", expected.physical_key == ENTER),
    ]
}

impl Widget for KeyboardDiagram<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(format!(" {} ", self.expected.display_label))
            .border_style(Style::default().fg(self.theme.colors.border()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height < 2 || inner.width < 20 {
            return;
        }

        let lit = self.model.find_key_position(self.expected.physical_key);
        let pressed = self.pressed.and_then(|ch| {
            self.model
                .find_key_position(ch)
                .or_else(|| self.model.find_key_position(ch.to_ascii_lowercase()))
        });

        let key_rows = (inner.height - 1) as usize;
        for (row_idx, row) in self.model.rows.iter().enumerate().take(key_rows) {
            let y = inner.y + row_idx as u16;
            let offset = ROW_OFFSETS.get(row_idx).copied().unwrap_or(0);
            for (col_idx, key) in row.iter().enumerate() {
                let x = inner.x + offset + col_idx as u16 * KEY_WIDTH;
                if x + KEY_WIDTH > inner.x + inner.width {
                    break;
                }
                let style = self.key_style(
                    lit == Some((row_idx, col_idx)),
                    pressed == Some((row_idx, col_idx)),
                );
                buf.set_string(x, y, format!("[{}]", key.base), style);
            }
        }

        let y = inner.y + inner.height - 1;
        let mut x = inner.x;
        for (label, on) in modifier_labels(self.expected) {
            let text = format!("[{label}]");
            let width = text.chars().count() as u16;
            if x + width > inner.x + inner.width {
                break;
            }
            buf.set_string(x, y, &text, self.modifier_style(on));
            x += width + 1;
        }
    }
}
