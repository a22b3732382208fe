use crate::themes::Theme;
use ratatui::text::{Line, Span};
use usage_core::formatting::{format_currency, format_percentage};
use usage_core::models::{CostAnomaly, UsageTotals};

// ── AnomalyIndicator ─────────────────────────────────────────────────────────

/// One-line summary of a cost anomaly with a tiered marker.
///
/// | Excess over average | Marker |
/// |---------------------|--------|
/// | ≥ 200 %             | 🔥     |
/// | ≥ 100 %             | ⚠️     |
/// | < 100 %             | 📈     |
pub struct AnomalyIndicator<'a> {
    pub anomaly: &'a CostAnomaly,
    pub theme: &'a Theme,
}

impl<'a> AnomalyIndicator<'a> {
    pub fn new(anomaly: &'a CostAnomaly, theme: &'a Theme) -> Self {
        Self { anomaly, theme }
    }

    pub fn marker(&self) -> &'static str {
        if self.anomaly.percentage >= 200.0 {
            "🔥"
        } else if self.anomaly.percentage >= 100.0 {
            "⚠️"
        } else {
            "📈"
        }
    }

    /// Format: `"🔥 2024-03-05  $100.00  +257.1% vs avg $28.00"`
    pub fn to_line(&self) -> Line<'a> {
        let style = self.theme.anomaly_style(self.anomaly.percentage);
        Line::from(vec![
            Span::raw(self.marker()),
            Span::raw(" "),
            Span::styled(self.anomaly.date.clone(), self.theme.label),
            Span::raw("  "),
            Span::styled(format_currency(self.anomaly.total_cost), style),
            Span::styled(
                format!("  +{}", format_percentage(self.anomaly.percentage, 1)),
                style,
            ),
            Span::styled(
                format!(" vs avg {}", format_currency(self.anomaly.average_cost)),
                self.theme.dim,
            ),
        ])
    }
}

// ── CostIndicator ────────────────────────────────────────────────────────────

/// Gross / discount / net cost breakdown for the filtered record set.
pub struct CostIndicator<'a> {
    pub totals: &'a UsageTotals,
    pub theme: &'a Theme,
}

impl<'a> CostIndicator<'a> {
    pub fn new(totals: &'a UsageTotals, theme: &'a Theme) -> Self {
        Self { totals, theme }
    }

    /// Share of the gross amount that was discounted, in percent.
    pub fn discount_rate(&self) -> f64 {
        if self.totals.total_gross_amount > 0.0 {
            self.totals.total_discount_amount / self.totals.total_gross_amount * 100.0
        } else {
            0.0
        }
    }

    /// Format: `"💲 Gross: $1.32  Discount: -$0.33 (25.0%)  Net: $0.99"`
    pub fn to_line(&self) -> Line<'a> {
        Line::from(vec![
            Span::styled("💲 Gross: ", self.theme.label),
            Span::styled(format_currency(self.totals.total_gross_amount), self.theme.value),
            Span::styled("  Discount: ", self.theme.label),
            Span::styled(
                format_currency(-self.totals.total_discount_amount),
                self.theme.success,
            ),
            Span::styled(
                format!(" ({})", format_percentage(self.discount_rate(), 1)),
                self.theme.dim,
            ),
            Span::styled("  Net: ", self.theme.label),
            Span::styled(format_currency(self.totals.total_net_amount), self.theme.bold),
        ])
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
