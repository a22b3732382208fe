use crate::themes::Theme;
use ratatui::text::{Line, Span};
use usage_core::formatting::format_percentage;

/// Configuration controlling visual appearance of a bar.
pub struct ProgressBarConfig {
    /// Total width in terminal columns of the bar portion (excluding label).
    pub width: u16,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for ProgressBarConfig {
    fn default() -> Self {
        Self {
            width: 30,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

// ── ShareBar ─────────────────────────────────────────────────────────────────

/// Horizontal bar showing one group's share of a total, e.g. a SKU's
/// percentage of all consumed quantity.
pub struct ShareBar<'a> {
    /// Share in percent, clamped to `[0.0, 100.0]`.
    pub percentage: f64,
    pub theme: &'a Theme,
    pub config: ProgressBarConfig,
}

impl<'a> ShareBar<'a> {
    pub fn new(percentage: f64, theme: &'a Theme) -> Self {
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            percentage,
            theme,
            config: ProgressBarConfig::default(),
        }
    }

    pub fn with_width(mut self, width: u16) -> Self {
        self.config.width = width;
        self
    }

    /// Number of filled cells for the current share.
    pub fn filled_cells(&self) -> u16 {
        ((self.percentage / 100.0) * self.config.width as f64).round() as u16
    }

    /// Render the bar followed by the percentage label.
    pub fn to_line(&self) -> Line<'a> {
        let filled = self.filled_cells().min(self.config.width);
        let empty = self.config.width.saturating_sub(filled);

        let filled_str: String =
            std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
        let empty_str: String =
            std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

        Line::from(vec![
            Span::styled(filled_str, self.theme.share_style(self.percentage)),
            Span::styled(empty_str, self.theme.progress_empty),
            Span::styled(
                format!(" {:>6}", format_percentage(self.percentage, 1)),
                self.theme.progress_label,
            ),
        ])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_cells(line: &Line) -> (usize, usize) {
        (
            line.spans[0].content.chars().count(),
            line.spans[1].content.chars().count(),
        )
    }

    #[test]
    fn test_share_bar_half() {
        let theme = Theme::dark();
        let line = ShareBar::new(50.0, &theme).with_width(20).to_line();
        assert_eq!(bar_cells(&line), (10, 10));
        assert!(line.spans[2].content.contains("50.0%"));
    }

    #[test]
    fn test_share_bar_clamps() {
        let theme = Theme::dark();
        let over = ShareBar::new(250.0, &theme).with_width(10).to_line();
        assert_eq!(bar_cells(&over), (10, 0));

        let under = ShareBar::new(-5.0, &theme).with_width(10).to_line();
        assert_eq!(bar_cells(&under), (0, 10));

        let nan = ShareBar::new(f64::NAN, &theme);
        assert_eq!(nan.percentage, 0.0);
    }

    #[test]
    fn test_share_bar_uses_share_style() {
        let theme = Theme::dark();
        let line = ShareBar::new(75.0, &theme).to_line();
        assert_eq!(line.spans[0].style, theme.progress_high);
        let line = ShareBar::new(10.0, &theme).to_line();
        assert_eq!(line.spans[0].style, theme.progress_low);
    }

    #[test]
    fn test_default_width() {
        let theme = Theme::dark();
        let line = ShareBar::new(0.0, &theme).to_line();
        assert_eq!(bar_cells(&line), (0, 30));
    }
}
