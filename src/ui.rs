use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::runtime::Navigator;
use crate::theme::Theme;

const KEY_HINTS: &str = "q back  ctrl+c quit ";

pub fn render(frame: &mut Frame, navigator: &mut Navigator, theme: &Theme) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], navigator, theme);
    if let Some(screen) = navigator.top_mut() {
        screen.render(frame, root[1], theme);
    }
    render_footer(frame, root[2], navigator, theme);
}

fn render_header(frame: &mut Frame, area: Rect, navigator: &Navigator, theme: &Theme) {
    const LOGO: &str = " deckhand ";

    // Oldest crumbs are dropped first when the bar overflows.
    let budget = (area.width as usize).saturating_sub(LOGO.chars().count() + 1);
    let labels = navigator
        .breadcrumbs()
        .iter()
        .map(|crumb| format!(" {} ", compact_text(crumb, 18)))
        .collect::<Vec<_>>();
    let mut start = 0;
    while start < labels.len()
        && labels[start..]
            .iter()
            .map(|label| label.chars().count() + 1)
            .sum::<usize>()
            > budget
    {
        start += 1;
    }
    let visible = &labels[start..];
    let crumb_bg = |index: usize| {
        if index + 1 == visible.len() {
            theme.status_bg
        } else {
            theme.panel
        }
    };

    let mut spans = Vec::new();
    let first_bg = if visible.is_empty() {
        theme.background
    } else {
        crumb_bg(0)
    };
    push_powerline_segment(&mut spans, LOGO, Color::Black, theme.accent, first_bg);
    for (index, label) in visible.iter().enumerate() {
        let last = index + 1 == visible.len();
        let next_bg = if last {
            theme.background
        } else {
            crumb_bg(index + 1)
        };
        let fg = if last { theme.text } else { theme.muted };
        push_powerline_segment(&mut spans, label.clone(), fg, crumb_bg(index), next_bg);
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.background)),
        area,
    );
}

fn render_footer(frame: &mut Frame, area: Rect, navigator: &Navigator, theme: &Theme) {
    let status = navigator.status();
    let failed = status_is_failure(status);
    let (status_fg, status_bg) = if failed {
        (Color::Black, theme.warn)
    } else {
        (theme.text, theme.status_bg)
    };
    let icon = if failed { "!" } else { "•" };

    let hint_width = KEY_HINTS.chars().count() as u16;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(hint_width)])
        .split(area);

    let status_width = (chunks[0].width as usize).saturating_sub(5).max(8);
    let mut spans = Vec::new();
    push_powerline_segment(
        &mut spans,
        format!(" {icon} {} ", compact_text(status, status_width)),
        status_fg,
        status_bg,
        theme.background,
    );
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.background)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(KEY_HINTS)
            .style(Style::default().fg(theme.hint).bg(theme.background))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn status_is_failure(status: &str) -> bool {
    let status = status.to_ascii_lowercase();
    ["failed", "error", "unreachable", "not found", "denied"]
        .iter()
        .any(|needle| status.contains(needle))
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("", Style::default().fg(bg).bg(next_bg)));
}

pub(crate) fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
