//! App: terminal event loop around the dashboard.
//!
//! - Key presses are read on a blocking thread and forwarded over an mpsc
//!   channel.
//! - Dashboard events (gateway responses, notification expiry) arrive on
//!   the dashboard's own channel.
//! - The loop redraws, then waits on whichever comes first.

use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use timed_metadata_proto::payload::{format_byte_length, normalized_byte_len};
use timed_metadata_proto::protocol::{PublicRecord, SentFlag};

use crate::action::Action;
use crate::dashboard::{Dashboard, DashboardEvent};
use crate::theme::{
    style_default, style_hint, style_muted, style_secondary, style_selected, C_ACCENT, C_BG,
    C_SECONDARY, C_SENT, C_STALE,
};
use crate::widgets::{
    field::{self, Field, FieldAction, FieldEditor},
    fit_width, modal,
    pane::{pane, Badge},
    toast,
};

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct App {
    dashboard: Dashboard,
    editor: Option<FieldEditor>,
    api_url: String,
    spinner: usize,
    should_quit: bool,
}

impl App {
    pub fn new(dashboard: Dashboard, api_url: String) -> Self {
        Self {
            dashboard,
            editor: None,
            api_url,
            spinner: 0,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut events: mpsc::Receiver<DashboardEvent>) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard events ──────────────────────────────────
        let (key_tx, mut key_rx) = mpsc::channel::<Event>(64);
        tokio::task::spawn_blocking(move || loop {
            match event::poll(Duration::from_millis(200)) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if key_tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {
                    if key_tx.is_closed() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        let mut spinner_tick = tokio::time::interval(Duration::from_millis(100));
        spinner_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        self.dashboard.load();
        info!("console started against {}", self.api_url);

        // ── Main loop ─────────────────────────────────────────────────────────
        loop {
            terminal.draw(|f| self.draw(f))?;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(ev) = key_rx.recv() => self.handle_terminal_event(ev),
                Some(ev) = events.recv() => {
                    self.dashboard.handle_event(ev);
                    self.sync_editor();
                }
                _ = spinner_tick.tick() => {
                    if self.dashboard.is_busy() {
                        self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        info!("console exiting");
        Ok(())
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_terminal_event(&mut self, ev: Event) {
        let Event::Key(key) = ev else {
            return;
        };
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.dashboard.modal().is_visible {
            self.dispatch(Action::from_modal_key(key));
        } else if self.editor.is_some() {
            self.handle_editor_key(key);
        } else {
            self.dispatch(Action::from_key(key));
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            self.dispatch(Action::from_key(key));
            return;
        }
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let (before, cursor) = (editor.text().to_string(), editor.cursor());

        match editor.handle_key(key) {
            FieldAction::Done => self.editor = None,
            FieldAction::Escape => {
                self.editor = None;
                self.dispatch(Action::Escape);
            }
            FieldAction::Changed(value) => match editor.field() {
                Field::Title => {
                    self.dashboard.edit_title(value);
                    self.sync_editor();
                }
                Field::Metadata => {
                    if !self.dashboard.edit_metadata(value) {
                        editor.revert(&before, cursor);
                    }
                }
            },
            FieldAction::None => {}
        }
    }

    /// Keep an open editor in step with the form, which may be reloaded by a
    /// response while the user is typing.
    fn sync_editor(&mut self) {
        let form = self.dashboard.form();
        if let Some(editor) = self.editor.as_mut() {
            match editor.field() {
                Field::Title => editor.sync(&form.title),
                Field::Metadata => editor.sync(&form.metadata),
            }
        }
        if self.dashboard.records().selected().is_none() {
            self.editor = None;
        }
    }

    fn dispatch(&mut self, action: Action) {
        debug!("dispatch: {:?}", action);
        match action {
            Action::SelectPrev => self.select_offset(-1),
            Action::SelectNext => self.select_offset(1),
            Action::Add => self.dashboard.request_add(),
            Action::Delete => self.dashboard.request_delete(),
            Action::Save => self.dashboard.save(),
            Action::Send => self.dashboard.send(),
            Action::CheckSelected => self.dashboard.check_selected(),
            Action::AcceptLatest => self.dashboard.accept_latest(),
            Action::Reload => self.dashboard.load(),
            Action::CycleChannel => self.dashboard.cycle_channel(),
            Action::EditTitle => self.open_editor(Field::Title),
            Action::EditMetadata => self.open_editor(Field::Metadata),
            Action::Confirm => self.dashboard.confirm_modal(),
            Action::Cancel => self.dashboard.hide_modal(),
            Action::DismissNotification => {
                let newest = self.dashboard.notifications().entries().next().map(|n| n.id);
                if let Some(id) = newest {
                    self.dashboard.dismiss_notification(id);
                }
            }
            Action::Escape => self.dashboard.escape(),
            Action::Quit => self.should_quit = true,
            Action::Noop => {}
        }
    }

    fn select_offset(&mut self, delta: isize) {
        let records = self.dashboard.records();
        if records.records.is_empty() {
            return;
        }
        let target = (records.selected_idx as isize + delta)
            .clamp(0, records.records.len() as isize - 1) as usize;
        if target == records.selected_idx {
            return;
        }
        let id = records.records[target].id.clone();
        self.dashboard.request_select(&id);
    }

    fn open_editor(&mut self, field: Field) {
        if self.dashboard.records().selected().is_none() {
            return;
        }
        let form = self.dashboard.form();
        let value = match field {
            Field::Title => &form.title,
            Field::Metadata => &form.metadata,
        };
        self.editor = Some(FieldEditor::new(field, value));
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_header(frame, rows[0]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(rows[1]);
        self.draw_list(frame, cols[0]);
        self.draw_editor(frame, cols[1]);
        self.draw_status_bar(frame, rows[2]);

        toast::draw(frame, area, self.dashboard.notifications());
        modal::draw(frame, area, self.dashboard.modal());
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let channel = self
            .dashboard
            .channels()
            .selected
            .as_ref()
            .map(|c| format!("{} ({})", c.name, c.id()))
            .unwrap_or_else(|| "no channel".to_string());
        let mut spans = vec![
            Span::styled(
                " PutMetadata Dashboard ",
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {} ", self.api_url), style_muted()),
            Span::styled(format!(" channel: {} ", channel), style_secondary()),
        ];
        if self.dashboard.is_busy() {
            spans.push(Span::styled(
                format!(" {} ", SPINNER_FRAMES[self.spinner]),
                style_secondary(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_list(&self, frame: &mut Frame, area: Rect) {
        let records = self.dashboard.records();
        let count = records.records.len().to_string();
        let block = pane(
            "timed metadata",
            self.editor.is_none(),
            Some(Badge {
                text: &count,
                color: C_SECONDARY,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if records.records.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  nothing here yet, press a to add", style_muted())),
                inner,
            );
            return;
        }

        let width = inner.width.saturating_sub(13) as usize;
        let items: Vec<ListItem> = records
            .records
            .iter()
            .map(|r| list_item(r, width))
            .collect();
        let mut state = ListState::default().with_selected(Some(records.selected_idx));
        frame.render_stateful_widget(
            List::new(items).highlight_style(style_selected()),
            inner,
            &mut state,
        );
    }

    fn draw_editor(&self, frame: &mut Frame, area: Rect) {
        let stale = self.dashboard.records().is_stale;
        let block = pane(
            "editor",
            self.editor.is_some(),
            stale.then_some(Badge {
                text: "STALE · R to load",
                color: C_STALE,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(1),
            ])
            .split(inner);

        let form = self.dashboard.form();
        let enabled = self.dashboard.records().selected().is_some();

        match self.editor.as_ref().filter(|e| e.field() == Field::Title) {
            Some(editor) => editor.draw_line(frame, rows[0]),
            None => {
                let title = if form.title.is_empty() {
                    Span::styled("Title/Name", style_muted())
                } else {
                    Span::styled(form.title.as_str(), style_default())
                };
                frame.render_widget(Paragraph::new(title), rows[0]);
            }
        }

        let size = Line::from(vec![
            Span::styled(
                format_byte_length(form.metadata.len()),
                style_default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                format_byte_length(normalized_byte_len(&form.metadata)),
                style_secondary(),
            ),
        ]);
        frame.render_widget(Paragraph::new(size), rows[1]);

        match self.editor.as_ref().filter(|e| e.field() == Field::Metadata) {
            Some(editor) => editor.draw_block(frame, rows[2]),
            None => field::draw_payload(frame, rows[2], &form.metadata, enabled),
        }
    }

    fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hints: Vec<(&str, &str, bool)> = if self.dashboard.modal().is_visible {
            vec![("y", "confirm", true), ("n", "cancel", true)]
        } else if self.editor.is_some() {
            vec![("esc", "done", true), ("^s", "save", !self.dashboard.save_disabled())]
        } else {
            let selected = self.dashboard.records().selected().is_some();
            vec![
                ("a", "add", true),
                ("t/e", "edit", selected),
                ("s", "save", !self.dashboard.save_disabled()),
                ("p", "send", !self.dashboard.send_disabled()),
                ("d", "delete", selected),
                ("r", "check", selected),
                ("c", "channel", true),
                ("x", "dismiss", !self.dashboard.notifications().is_empty()),
                ("q", "quit", true),
            ]
        };

        let mut spans = Vec::new();
        for (key, label, enabled) in hints {
            spans.push(Span::styled(format!(" {}", key), style_hint(enabled)));
            spans.push(Span::styled(format!(" {} ", label), style_muted()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn list_item(record: &PublicRecord, width: usize) -> ListItem<'static> {
    let date = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(record.created_millis())
        .map(|d| d.with_timezone(&chrono::Local).format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let sent = match record.sent {
        SentFlag::Yes => Span::styled("✓ ", Style::default().fg(C_SENT)),
        SentFlag::No => Span::raw("  "),
    };
    ListItem::new(Line::from(vec![
        sent,
        Span::styled(fit_width(&record.title, width), style_default()),
        Span::raw(" "),
        Span::styled(date, style_muted()),
    ]))
}
