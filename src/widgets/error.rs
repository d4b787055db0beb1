use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::runtime::{Command, Message, Screen};
use crate::theme::Theme;
use crate::ui::centered_rect;

/// Full-body error notice. Any key dismisses it.
pub struct ErrorScreen {
    message: String,
}

impl ErrorScreen {
    pub fn new(error: &anyhow::Error) -> Self {
        Self {
            message: compact_error(error),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Screen for ErrorScreen {
    fn title(&self) -> String {
        "error".to_string()
    }

    fn update(&mut self, message: Message) -> Command {
        match message {
            Message::Key(_) => Command::Pop,
            _ => Command::None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup = centered_rect(70, 40, area);
        let paragraph = Paragraph::new(Text::from(self.message().to_string()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .style(
                Style::default()
                    .fg(theme.error)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(theme.error))
                    .padding(Padding::new(4, 4, 2, 1)),
            );
        frame.render_widget(Clear, popup);
        frame.render_widget(paragraph, popup);
    }
}

/// First error plus up to two causes, one per line.
pub fn compact_error(error: &anyhow::Error) -> String {
    let mut out = Vec::new();
    for (index, cause) in error.chain().enumerate() {
        if index == 0 {
            out.push(cause.to_string());
        } else if index <= 2 {
            out.push(format!("caused by: {cause}"));
        } else {
            break;
        }
    }

    out.join("\n")
}
