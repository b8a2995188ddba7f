use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::keyboard::display::{ENTER, buffer_glyph};
use crate::session::typing::{CharClass, TypingSession};
use crate::ui::theme::Theme;

/// Chars drawn around the cursor.
pub const WINDOW_LEN: usize = 400;
/// Chars of already-typed text kept visible before the cursor.
pub const WINDOW_LEAD: usize = 200;

/// Visible slice `[start, end)` of a buffer of `len` chars.
pub fn text_window(len: usize, position: usize) -> (usize, usize) {
    let start = position.saturating_sub(WINDOW_LEAD).min(len);
    let end = (start + WINDOW_LEN).min(len);
    (start, end)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CellKind {
    Correct,
    Incorrect,
    Cursor,
    Pending,
}

fn cell_kind(session: &TypingSession, idx: usize) -> CellKind {
    if idx == session.position() {
        return CellKind::Cursor;
    }
    match session.classification(idx) {
        Some(CharClass::Correct) => CellKind::Correct,
        Some(CharClass::Incorrect) => CellKind::Incorrect,
        // Resumed text has no per-char record; show it as typed.
        None if idx < session.position() => CellKind::Correct,
        None => CellKind::Pending,
    }
}

pub struct TypingArea<'a> {
    session: &'a TypingSession,
    theme: &'a Theme,
    paused: bool,
}

impl<'a> TypingArea<'a> {
    pub fn new(session: &'a TypingSession, theme: &'a Theme, paused: bool) -> Self {
        Self {
            session,
            theme,
            paused,
        }
    }

    fn style_for(&self, kind: CellKind) -> Style {
        let colors = &self.theme.colors;
        match kind {
            CellKind::Correct => Style::default().fg(colors.text_correct()),
            CellKind::Incorrect => Style::default()
                .fg(colors.text_incorrect())
                .bg(colors.text_incorrect_bg())
                .add_modifier(Modifier::UNDERLINED),
            CellKind::Cursor => Style::default()
                .fg(colors.text_cursor_fg())
                .bg(colors.text_cursor_bg()),
            CellKind::Pending => Style::default().fg(colors.text_pending()),
        }
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let buffer = self.session.buffer();
        let (start, end) = text_window(buffer.len(), self.session.position());

        let mut lines: Vec<Line> = Vec::new();
        let mut spans: Vec<Span> = Vec::new();
        for (idx, &ch) in buffer.iter().enumerate().take(end).skip(start) {
            let style = self.style_for(cell_kind(self.session, idx));
            spans.push(Span::styled(buffer_glyph(ch), style));
            if ch == ENTER {
                lines.push(Line::from(std::mem::take(&mut spans)));
            }
        }
        if self.session.position() >= buffer.len() && !buffer.is_empty() {
            spans.push(Span::styled(" ", self.style_for(CellKind::Cursor)));
        }
        lines.push(Line::from(spans));
        lines
    }
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let (title, border) = if self.paused {
            (" Paused, press Enter to resume ", colors.border_paused())
        } else {
            (" Text ", colors.border())
        };
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(border));

        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn session(text: &str) -> TypingSession {
        let mut session = TypingSession::new();
        session.load("id", "Title", text, None, Utc::now());
        session.start_session(Utc::now());
        session
    }

    #[test]
    fn test_text_window_bounds() {
        assert_eq!(text_window(10, 0), (0, 10));
        assert_eq!(text_window(1000, 0), (0, 400));
        assert_eq!(text_window(1000, 500), (300, 700));
        assert_eq!(text_window(1000, 990), (790, 1000));
        assert_eq!(text_window(0, 0), (0, 0));
    }

    #[test]
    fn test_cell_kinds_follow_session() {
        let mut s = session("abc");
        s.score('a', true, Utc::now());
        s.score('b', false, Utc::now());
        assert_eq!(cell_kind(&s, 0), CellKind::Correct);
        assert_eq!(cell_kind(&s, 1), CellKind::Incorrect);
        assert_eq!(cell_kind(&s, 2), CellKind::Cursor);
    }

    #[test]
    fn test_newlines_break_lines() {
        let s = session("ab\ncd");
        let theme = Theme::default();
        let lines = TypingArea::new(&s, &theme, false).lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.last().unwrap().content, "\u{21b5}");
    }

    #[test]
    fn test_render_pending_text() {
        let s = session("hello");
        let theme = Theme::default();
        let area = Rect::new(0, 0, 20, 3);
        let mut buf = Buffer::empty(area);
        TypingArea::new(&s, &theme, false).render(area, &mut buf);
        let row: String = (1..6).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(row, "hello");
        assert_eq!(buf[(1, 1)].bg, theme.colors.text_cursor_bg());
    }
}
