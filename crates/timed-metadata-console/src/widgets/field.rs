//! FieldEditor: wraps tui-input for the title line and the payload editor.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input, InputRequest};

use crate::theme::{style_default, style_input, style_muted};

const CURSOR: char = '▏';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Metadata,
}

pub enum FieldAction {
    Changed(String),
    Done,
    /// Esc: editing is over and the global escape applies too.
    Escape,
    None,
}

pub struct FieldEditor {
    input: Input,
    field: Field,
}

impl FieldEditor {
    pub fn new(field: Field, value: &str) -> Self {
        Self {
            input: Input::new(value.to_string()),
            field,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    pub fn cursor(&self) -> usize {
        self.input.cursor()
    }

    /// Restore a previous value, e.g. after the dashboard rejected an edit.
    pub fn revert(&mut self, value: &str, cursor: usize) {
        self.input = Input::new(value.to_string()).with_cursor(cursor);
    }

    /// Follow the form when it changed underneath the editor.
    pub fn sync(&mut self, value: &str) {
        if self.input.value() != value {
            self.input = Input::new(value.to_string());
        }
    }

    /// Esc always ends editing. Enter finishes the title and inserts a line
    /// break in the payload.
    pub fn handle_key(&mut self, key: KeyEvent) -> FieldAction {
        match (key.code, self.field) {
            (KeyCode::Esc, _) => FieldAction::Escape,
            (KeyCode::Enter, Field::Title) => FieldAction::Done,
            (KeyCode::Enter, Field::Metadata) => {
                self.input.handle(InputRequest::InsertChar('\n'));
                FieldAction::Changed(self.input.value().to_string())
            }
            _ => match self.input.handle_event(&Event::Key(key)) {
                Some(change) if change.value => FieldAction::Changed(self.input.value().to_string()),
                _ => FieldAction::None,
            },
        }
    }

    /// Single-line render with horizontal scroll, used for the title.
    pub fn draw_line(&self, frame: &mut Frame, area: Rect) {
        let scroll = self.input.visual_scroll(area.width.saturating_sub(1) as usize);
        let visible: String = self.input.value().chars().skip(scroll).collect();
        let paragraph = Paragraph::new(Line::from(Span::styled(visible, style_input())))
            .style(style_input());
        frame.render_widget(paragraph, area);

        let cursor_x = area.x + (self.input.visual_cursor() - scroll) as u16;
        frame.set_cursor_position((cursor_x.min(area.x + area.width.saturating_sub(1)), area.y));
    }

    /// Wrapped multi-line render with a cursor marker, used for the payload.
    pub fn draw_block(&self, frame: &mut Frame, area: Rect) {
        let text = with_cursor_marker(self.input.value(), self.input.cursor());
        frame.render_widget(
            Paragraph::new(text)
                .style(style_input())
                .wrap(Wrap { trim: false }),
            area,
        );
    }
}

/// Read-only payload view for when the editor is not active.
pub fn draw_payload(frame: &mut Frame, area: Rect, payload: &str, enabled: bool) {
    let paragraph = if payload.is_empty() {
        Paragraph::new(Span::styled("Type here...", style_muted()))
    } else {
        Paragraph::new(payload.to_string())
            .style(if enabled { style_default() } else { style_muted() })
            .wrap(Wrap { trim: false })
    };
    frame.render_widget(paragraph, area);
}

fn with_cursor_marker(value: &str, cursor: usize) -> String {
    let mut out = String::with_capacity(value.len() + CURSOR.len_utf8());
    let mut placed = false;
    for (i, c) in value.chars().enumerate() {
        if i == cursor {
            out.push(CURSOR);
            placed = true;
        }
        out.push(c);
    }
    if !placed {
        out.push(CURSOR);
    }
    out
}
