//! Centered confirmation dialog.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::state::modal::{ButtonStyle, ModalState};
use crate::theme::{style_default, style_focused_border, C_ACCENT, C_BUTTON_CONFIRM, C_SECONDARY};

pub fn draw(frame: &mut Frame, area: Rect, modal: &ModalState) {
    let Some(confirm) = modal.confirm.as_ref().filter(|_| modal.is_visible) else {
        return;
    };

    let width = area.width.min(60);
    let height = 7.min(area.height);
    let dialog = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let lines = vec![
        Line::from(Span::styled(modal.message.as_str(), style_default())),
        Line::default(),
        Line::from(vec![
            button(&confirm.button_text, 'y', confirm.button_style),
            Span::raw("   "),
            button("Cancel", 'n', ButtonStyle::Secondary),
        ]),
    ];

    frame.render_widget(Clear, dialog);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(style_focused_border()),
            ),
        dialog,
    );
}

fn button(text: &str, key: char, style: ButtonStyle) -> Span<'static> {
    let color = match style {
        ButtonStyle::Secondary => C_SECONDARY,
        ButtonStyle::Destruct => C_ACCENT,
        ButtonStyle::Confirm => C_BUTTON_CONFIRM,
    };
    Span::styled(
        format!("[{}] {}", key, text),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}
