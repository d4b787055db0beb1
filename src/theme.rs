use ratatui::style::{Color, Modifier, Style};

/// Colors shared by every screen. Built once at startup and passed down by reference.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub panel: Color,
    pub text: Color,
    pub accent: Color,
    pub muted: Color,
    pub hint: Color,
    pub warn: Color,
    pub error: Color,
    pub spinner: Color,
    pub header_rule: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub status_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(9, 15, 25),
            panel: Color::Rgb(16, 27, 44),
            text: Color::White,
            accent: Color::Rgb(52, 211, 153),
            muted: Color::Rgb(140, 156, 178),
            hint: Color::Indexed(241),
            warn: Color::Rgb(251, 191, 36),
            error: Color::Rgb(186, 13, 53),
            spinner: Color::Indexed(205),
            header_rule: Color::Indexed(240),
            selected_fg: Color::Indexed(229),
            selected_bg: Color::Indexed(57),
            status_bg: Color::Rgb(30, 64, 175),
        }
    }
}

impl Theme {
    pub fn border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.accent)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn selected_row(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.selected_fg).bg(self.selected_bg)
        } else {
            Style::default()
                .fg(self.muted)
                .add_modifier(Modifier::REVERSED)
        }
    }
}
