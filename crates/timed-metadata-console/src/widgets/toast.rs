//! Notification toasts, stacked in the top-right corner, newest on top.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::state::notifications::{NotificationsState, Severity};
use crate::theme::{C_TOAST_ERROR, C_TOAST_SUCCESS};
use crate::widgets::fit_width;

pub fn draw(frame: &mut Frame, area: Rect, notifications: &NotificationsState) {
    if notifications.is_empty() {
        return;
    }
    let max_width = (area.width / 2).clamp(30, 70).min(area.width);
    let mut y = area.y + 1;

    for notification in notifications.entries() {
        if y >= area.y + area.height {
            break;
        }
        let (color, icon) = match notification.severity {
            Severity::Success => (C_TOAST_SUCCESS, "✓"),
            Severity::Error => (C_TOAST_ERROR, "✗"),
        };
        let text = fit_width(
            &format!(" {} {} ", icon, notification.message),
            max_width as usize,
        );
        let w = unicode_width::UnicodeWidthStr::width(text.as_str()) as u16;
        let toast_area = Rect {
            x: area.x + area.width.saturating_sub(w + 1),
            y,
            width: w,
            height: 1,
        };
        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))),
            toast_area,
        );
        y += 1;
    }
}
