use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::stats::SessionStats;
use crate::ui::theme::Theme;

/// Running numbers for the current book.
pub struct StatsSidebar<'a> {
    stats: &'a SessionStats,
    position: usize,
    total_chars: usize,
    elapsed_secs: f64,
    theme: &'a Theme,
}

impl<'a> StatsSidebar<'a> {
    pub fn new(
        stats: &'a SessionStats,
        position: usize,
        total_chars: usize,
        elapsed_secs: f64,
        theme: &'a Theme,
    ) -> Self {
        Self {
            stats,
            position,
            total_chars,
            elapsed_secs,
            theme,
        }
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let percent = if self.total_chars == 0 {
            0.0
        } else {
            self.position as f64 / self.total_chars as f64 * 100.0
        };
        vec![
            ("WPM", self.stats.wpm.to_string()),
            ("Accuracy", format!("{}%", self.stats.accuracy)),
            ("Typed", self.stats.total_typed.to_string()),
            ("Errors", self.stats.total_errors.to_string()),
            ("Position", format!("{}/{}", self.position, self.total_chars)),
            ("Progress", format!("{percent:.1}%")),
            ("Session", format_elapsed(self.elapsed_secs)),
        ]
    }
}

/// `m:ss`, or `h:mm:ss` past an hour.
pub fn format_elapsed(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// One-line summary for layouts without a sidebar.
pub fn compact_stats(stats: &SessionStats) -> String {
    format!(
        "{} wpm  {}% acc  {} errors",
        stats.wpm, stats.accuracy, stats.total_errors
    )
}

impl Widget for StatsSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let label_style = Style::default().fg(colors.text_pending());
        let value_style = Style::default()
            .fg(colors.accent())
            .add_modifier(Modifier::BOLD);

        let lines: Vec<Line> = self
            .rows()
            .into_iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(format!(" {label:<10}"), label_style),
                    Span::styled(value, value_style),
                ])
            })
            .collect();

        let block = Block::bordered()
            .title(" Stats ")
            .border_style(Style::default().fg(colors.border()));
        Paragraph::new(lines).block(block).render(area, buf);
    }
}
