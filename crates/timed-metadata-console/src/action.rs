//! Action enum: everything a key press can ask the app to do.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // ── Records ──────────────────────────────────────────────────────────────
    SelectPrev,
    SelectNext,
    Add,
    Delete,
    Save,
    Send,
    /// Refetch the selection and flag it if it changed upstream.
    CheckSelected,
    AcceptLatest,
    Reload,

    // ── Channels ─────────────────────────────────────────────────────────────
    CycleChannel,

    // ── Editor ───────────────────────────────────────────────────────────────
    EditTitle,
    EditMetadata,

    // ── Modal / notifications ────────────────────────────────────────────────
    Confirm,
    Cancel,
    DismissNotification,
    Escape,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
    Noop,
}

impl Action {
    /// Key map while the confirmation modal is open.
    pub fn from_modal_key(key: KeyEvent) -> Self {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => Action::Confirm,
            KeyCode::Char('n') => Action::Cancel,
            KeyCode::Esc => Action::Escape,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            _ => Action::Noop,
        }
    }

    /// Key map in normal (non-editing) mode.
    pub fn from_key(key: KeyEvent) -> Self {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Action::Quit,
                KeyCode::Char('s') => Action::Save,
                _ => Action::Noop,
            };
        }
        match key.code {
            KeyCode::Char('q') => Action::Quit,
            KeyCode::Up | KeyCode::Char('k') => Action::SelectPrev,
            KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
            KeyCode::Char('a') => Action::Add,
            KeyCode::Char('d') => Action::Delete,
            KeyCode::Char('s') => Action::Save,
            KeyCode::Char('p') => Action::Send,
            KeyCode::Char('r') => Action::CheckSelected,
            KeyCode::Char('R') => Action::AcceptLatest,
            KeyCode::Char('g') => Action::Reload,
            KeyCode::Char('c') => Action::CycleChannel,
            KeyCode::Char('t') => Action::EditTitle,
            KeyCode::Char('e') | KeyCode::Enter => Action::EditMetadata,
            KeyCode::Char('x') => Action::DismissNotification,
            KeyCode::Esc => Action::Escape,
            _ => Action::Noop,
        }
    }
}
