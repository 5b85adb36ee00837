use std::io::{self, Write};
use std::time::Instant;

use base64::Engine;
use crossterm::event::{KeyCode, KeyEvent};
use keydeck_core::validation::{validate_create, ValidCreate};
use keydeck_core::{ApiKeyRecord, SortOrder, UpdateApiKey};
use keydeck_service::BlockingKeyList;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::components::create_dialog::{CreateDialog, CreateRequest, DialogEvent};
use crate::components::key_table::{KeyTable, TableAction};
use crate::components::toast::ToastQueue;

pub const COPIED: &str = "API key copied to clipboard";
pub const COPY_FAILED: &str = "Failed to copy to clipboard";

/// What the app is currently doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Browsing the table (inline rename lives inside the table)
    Normal,
    /// Create dialog open
    Creating,
    ConfirmRegenerate { id: String, name: String },
    ConfirmDelete { id: String, name: String },
}

/// Store work deferred until after the next frame, so the loading and
/// creating states are drawn before the blocking call starts.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Fetch,
    Create(ValidCreate),
}

/// Destination for the copy action.
pub trait Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()>;
}

/// Sets the system clipboard through the terminal with an OSC 52 escape.
pub struct Osc52Clipboard;

impl Clipboard for Osc52Clipboard {
    fn copy(&mut self, text: &str) -> io::Result<()> {
        let mut out = io::stdout();
        out.write_all(osc52_sequence(text).as_bytes())?;
        out.flush()
    }
}

pub fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    format!("\x1b]52;c;{encoded}\x07")
}

pub fn regenerate_prompt(name: &str) -> String {
    format!(
        "Are you sure you want to regenerate the API key \"{name}\"? The old key will stop working immediately."
    )
}

pub fn delete_prompt(name: &str) -> String {
    format!("Are you sure you want to delete the API key \"{name}\"? This action cannot be undone.")
}

pub struct App {
    keys: BlockingKeyList,
    table: KeyTable,
    dialog: CreateDialog,
    toasts: ToastQueue,
    clipboard: Box<dyn Clipboard>,
    sort_order: SortOrder,
    mode: Mode,
    pending: Option<Pending>,
}

impl App {
    /// `toasts` must be the notifier the key list was built with. The
    /// initial fetch runs on the first `tick`.
    pub fn new(keys: BlockingKeyList, toasts: ToastQueue) -> Self {
        Self::with_clipboard(keys, toasts, Box::new(Osc52Clipboard))
    }

    pub fn with_clipboard(
        keys: BlockingKeyList,
        toasts: ToastQueue,
        clipboard: Box<dyn Clipboard>,
    ) -> Self {
        Self {
            keys,
            table: KeyTable::new(),
            dialog: CreateDialog::new(),
            toasts,
            clipboard,
            sort_order: SortOrder::default(),
            mode: Mode::Normal,
            pending: Some(Pending::Fetch),
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn keys(&self) -> &[ApiKeyRecord] {
        self.keys.keys()
    }

    pub fn is_loading(&self) -> bool {
        self.keys.is_loading()
    }

    pub fn table(&self) -> &KeyTable {
        &self.table
    }

    pub fn dialog(&self) -> &CreateDialog {
        &self.dialog
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn is_input_mode(&self) -> bool {
        matches!(self.mode, Mode::Creating) || self.table.is_editing()
    }

    /// True while a store call is queued for the next `tick`.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True while toasts are waiting to expire.
    pub fn needs_polling(&self) -> bool {
        !self.toasts.is_empty()
    }

    /// Run queued store work and expire old toasts. Returns true if the
    /// screen changed.
    pub fn tick(&mut self) -> bool {
        let ran = match self.pending.take() {
            Some(Pending::Fetch) => {
                self.refresh();
                true
            }
            Some(Pending::Create(valid)) => {
                self.finish_create(valid);
                true
            }
            None => false,
        };
        self.toasts.prune(Instant::now()) || ran
    }

    /// Refetch in the current order, keeping the selected key if it survives.
    fn refresh(&mut self) {
        let selected_id = self.table.selected(self.keys.keys()).map(|k| k.id.clone());
        // Failures are already reported through the toast queue.
        let _ = self.keys.fetch(self.sort_order);
        self.table.sync(self.keys.keys().len());
        if let Some(id) = selected_id {
            self.table.select_by_id(self.keys.keys(), &id);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.mode.clone() {
            Mode::Normal => self.handle_normal(key),
            Mode::Creating => self.handle_creating(key),
            Mode::ConfirmRegenerate { id, .. } => self.handle_confirm_regenerate(key, id),
            Mode::ConfirmDelete { id, .. } => self.handle_confirm_delete(key, id),
        }
    }

    fn handle_normal(&mut self, key: KeyEvent) {
        if !self.table.is_editing() && key.code == KeyCode::Char('n') {
            self.dialog.reset();
            self.mode = Mode::Creating;
            return;
        }
        if let Some(action) = self.table.handle_key(key, self.keys.keys()) {
            self.apply_action(action);
        }
    }

    fn apply_action(&mut self, action: TableAction) {
        match action {
            TableAction::ToggleSort => {
                self.sort_order = self.sort_order.toggled();
                self.refresh();
            }
            TableAction::Copy(value) => match self.clipboard.copy(&value) {
                Ok(()) => self.toasts.success(COPIED),
                Err(e) => {
                    tracing::error!("copy to clipboard: {e}");
                    self.toasts.error(COPY_FAILED);
                }
            },
            TableAction::Rename(record) => {
                let _ = self
                    .keys
                    .update(&record.id, &UpdateApiKey::rename(record.name));
            }
            TableAction::Regenerate(id) => {
                if let Some(key) = self.keys.find(&id) {
                    self.mode = Mode::ConfirmRegenerate {
                        id,
                        name: key.name.clone(),
                    };
                }
            }
            TableAction::Delete(id) => {
                if let Some(key) = self.keys.find(&id) {
                    self.mode = Mode::ConfirmDelete {
                        id,
                        name: key.name.clone(),
                    };
                }
            }
        }
    }

    fn handle_creating(&mut self, key: KeyEvent) {
        match self.dialog.handle_key(key) {
            Some(DialogEvent::Submit(request)) => self.submit_create(request),
            Some(DialogEvent::Cancel) => self.mode = Mode::Normal,
            None => {}
        }
    }

    fn submit_create(&mut self, request: CreateRequest) {
        let valid = match validate_create(&request.name, &request.max_usage) {
            Ok(valid) => valid,
            Err(e) => {
                self.toasts.error(e.to_string());
                return;
            }
        };

        self.dialog.set_creating(true);
        self.pending = Some(Pending::Create(valid));
    }

    fn finish_create(&mut self, valid: ValidCreate) {
        let result = self.keys.create(&valid.name, valid.max_usage);
        self.dialog.set_creating(false);

        if let Ok(record) = result {
            self.table.sync(self.keys.keys().len());
            self.table.select_by_id(self.keys.keys(), &record.id);
            self.mode = Mode::Normal;
        }
    }

    fn handle_confirm_regenerate(&mut self, key: KeyEvent, id: String) {
        if is_confirm(key) {
            let _ = self.keys.regenerate(&id);
        }
        self.mode = Mode::Normal;
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, id: String) {
        if is_confirm(key) && self.keys.delete(&id).is_ok() {
            self.table.sync(self.keys.keys().len());
        }
        self.mode = Mode::Normal;
    }

    // -- Rendering --

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_title_bar(frame, layout[0]);
        self.table.render(
            frame,
            layout[1],
            self.keys.keys(),
            self.keys.is_loading(),
            self.sort_order,
        );
        self.render_status_bar(frame, layout[2]);

        match &self.mode {
            Mode::Normal => {}
            Mode::Creating => self.dialog.render(frame, centered_rect(50, 50, area)),
            Mode::ConfirmRegenerate { name, .. } => {
                self.render_confirm(frame, " Regenerate API Key ", &regenerate_prompt(name), area)
            }
            Mode::ConfirmDelete { name, .. } => {
                self.render_confirm(frame, " Delete API Key ", &delete_prompt(name), area)
            }
        }

        self.toasts.render(frame, area);
    }

    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(" keydeck ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("| "),
            Span::styled("API Keys", Style::default().fg(Color::Yellow)),
            Span::styled(
                format!(" (sorted by name, {})", self.sort_order),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(title, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let hints = match &self.mode {
            Mode::Normal if self.table.is_editing() => {
                vec![("Enter", "save"), ("Esc", "cancel")]
            }
            Mode::Normal => vec![
                ("q", "quit"),
                ("j/k", "keys"),
                ("n", "new"),
                ("s", "sort"),
                ("v", "show/hide"),
                ("c", "copy"),
                ("e", "rename"),
                ("r", "regenerate"),
                ("d", "del"),
            ],
            Mode::Creating => {
                vec![("Tab", "next field"), ("Enter", "create"), ("Esc", "cancel")]
            }
            Mode::ConfirmRegenerate { .. } | Mode::ConfirmDelete { .. } => {
                vec![("y", "confirm"), ("any", "cancel")]
            }
        };

        let spans: Vec<Span> = hints
            .into_iter()
            .flat_map(|(key, desc)| {
                vec![
                    Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow).bold()),
                    Span::raw(format!(" {desc} ")),
                ]
            })
            .collect();

        frame.render_widget(Line::from(spans), area);
    }

    fn render_confirm(&self, frame: &mut Frame, title: &str, prompt: &str, area: Rect) {
        let popup = centered_rect(50, 25, area);
        frame.render_widget(Clear, popup);

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red));

        let text = format!("{prompt}\n\n(y)es / (any key) cancel");
        let paragraph = Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, popup);
    }
}

fn is_confirm(key: KeyEvent) -> bool {
    matches!(
        key.code,
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter
    )
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
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
