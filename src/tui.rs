use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const PAID_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const UNPAID_STYLE: Style = Style::new().fg(Color::Red);
pub const MUTED_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Payment state as a colored Span. Ineligible entries show a dash, since no
/// payment is expected for them.
pub fn paid_span(payment_eligible: bool, is_paid: bool) -> Span<'static> {
    if !payment_eligible {
        Span::styled("\u{2014}", MUTED_STYLE)
    } else if is_paid {
        Span::styled("Paid", PAID_STYLE)
    } else {
        Span::styled("Unpaid", UNPAID_STYLE)
    }
}
