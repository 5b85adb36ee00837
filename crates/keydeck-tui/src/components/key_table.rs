use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent};
use keydeck_core::{ApiKeyRecord, SortOrder};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

pub const LOADING_TEXT: &str = "Loading...";
pub const EMPTY_TEXT: &str = "No API keys found. Create one to get started.";

const GAUGE_WIDTH: usize = 10;

/// Requests the table hands back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    ToggleSort,
    Copy(String),
    /// The full record with only `name` changed.
    Rename(ApiKeyRecord),
    Regenerate(String),
    Delete(String),
}

struct RenameEditor {
    id: String,
    input: String,
}

/// List of keys with per-row actions.
///
/// Rows are always passed in by the caller; the table only remembers the
/// selection, which values are revealed and the inline rename buffer.
pub struct KeyTable {
    state: TableState,
    revealed: HashSet<String>,
    editing: Option<RenameEditor>,
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyTable {
    pub fn new() -> Self {
        Self {
            state: TableState::default(),
            revealed: HashSet::new(),
            editing: None,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state.selected()
    }

    pub fn selected<'a>(&self, keys: &'a [ApiKeyRecord]) -> Option<&'a ApiKeyRecord> {
        keys.get(self.state.selected()?)
    }

    /// Keep the selection inside `0..len` after the list changed.
    pub fn sync(&mut self, len: usize) {
        match (len, self.state.selected()) {
            (0, _) => self.state.select(None),
            (_, None) => self.state.select(Some(0)),
            (len, Some(i)) if i >= len => self.state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn select_by_id(&mut self, keys: &[ApiKeyRecord], id: &str) -> bool {
        match keys.iter().position(|k| k.id == id) {
            Some(idx) => {
                self.state.select(Some(idx));
                true
            }
            None => false,
        }
    }

    pub fn is_revealed(&self, id: &str) -> bool {
        self.revealed.contains(id)
    }

    pub fn toggle_reveal(&mut self, id: &str) {
        if !self.revealed.remove(id) {
            self.revealed.insert(id.to_string());
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn edit_buffer(&self) -> Option<&str> {
        self.editing.as_ref().map(|e| e.input.as_str())
    }

    pub fn handle_key(&mut self, key: KeyEvent, keys: &[ApiKeyRecord]) -> Option<TableAction> {
        if self.editing.is_some() {
            return self.handle_rename_key(key, keys);
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                let current = self.state.selected().unwrap_or(0);
                if current + 1 < keys.len() {
                    self.state.select(Some(current + 1));
                }
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let current = self.state.selected().unwrap_or(0);
                if current > 0 {
                    self.state.select(Some(current - 1));
                }
                None
            }
            KeyCode::Char('g') => {
                if !keys.is_empty() {
                    self.state.select(Some(0));
                }
                None
            }
            KeyCode::Char('G') => {
                if !keys.is_empty() {
                    self.state.select(Some(keys.len() - 1));
                }
                None
            }
            KeyCode::Char('s') => Some(TableAction::ToggleSort),
            KeyCode::Char('v') | KeyCode::Char(' ') => {
                let id = self.selected(keys)?.id.clone();
                self.toggle_reveal(&id);
                None
            }
            KeyCode::Char('c') | KeyCode::Char('y') => {
                Some(TableAction::Copy(self.selected(keys)?.value.clone()))
            }
            KeyCode::Char('e') => {
                let key = self.selected(keys)?;
                self.editing = Some(RenameEditor {
                    id: key.id.clone(),
                    input: key.name.clone(),
                });
                None
            }
            KeyCode::Char('r') => Some(TableAction::Regenerate(self.selected(keys)?.id.clone())),
            KeyCode::Char('d') => Some(TableAction::Delete(self.selected(keys)?.id.clone())),
            _ => None,
        }
    }

    fn handle_rename_key(&mut self, key: KeyEvent, keys: &[ApiKeyRecord]) -> Option<TableAction> {
        let editor = self.editing.as_mut()?;
        match key.code {
            KeyCode::Enter => {
                let name = editor.input.trim().to_string();
                if name.is_empty() {
                    return None;
                }
                let id = editor.id.clone();
                self.editing = None;
                let mut record = keys.iter().find(|k| k.id == id)?.clone();
                record.name = name;
                Some(TableAction::Rename(record))
            }
            KeyCode::Esc => {
                self.editing = None;
                None
            }
            KeyCode::Backspace => {
                editor.input.pop();
                None
            }
            KeyCode::Char(c) => {
                editor.input.push(c);
                None
            }
            _ => None,
        }
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        area: Rect,
        keys: &[ApiKeyRecord],
        is_loading: bool,
        order: SortOrder,
    ) {
        let block = Block::default()
            .title(format!(" API Keys ({}) ", keys.len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        if keys.is_empty() {
            let text = if is_loading { LOADING_TEXT } else { EMPTY_TEXT };
            let paragraph = Paragraph::new(text)
                .block(block)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(paragraph, area);
            return;
        }

        let header = Row::new(vec![
            Cell::from(format!("NAME {}", order.symbol())),
            Cell::from("USAGE"),
            Cell::from("KEY"),
            Cell::from("OPTIONS"),
        ])
        .style(Style::default().fg(Color::DarkGray).bold());

        let rows: Vec<Row> = keys.iter().map(|key| self.row(key)).collect();

        let widths = [
            Constraint::Percentage(25),
            Constraint::Length(24),
            Constraint::Min(30),
            Constraint::Length(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan).bold())
            .highlight_symbol("> ");

        let mut state = self.state.clone();
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn row<'a>(&self, key: &'a ApiKeyRecord) -> Row<'a> {
        let name_cell = match &self.editing {
            Some(editor) if editor.id == key.id => Cell::from(Line::from(vec![
                Span::styled(editor.input.clone(), Style::default().fg(Color::Yellow)),
                Span::styled("▏", Style::default().fg(Color::Yellow)),
            ])),
            _ => Cell::from(key.name.as_str()),
        };

        let gauge_color = if key.is_exhausted() {
            Color::Red
        } else {
            Color::Gray
        };
        let usage_cell = Cell::from(Line::from(vec![
            Span::raw(format!("{:<9} ", key.usage_label())),
            Span::styled(usage_bar(key.usage_ratio()), Style::default().fg(gauge_color)),
        ]));

        let shown = if self.is_revealed(&key.id) {
            key.value.clone()
        } else {
            key.masked_value()
        };
        let eye = if self.is_revealed(&key.id) { "hide" } else { "show" };

        Row::new(vec![
            name_cell,
            usage_cell,
            Cell::from(shown),
            Cell::from(format!("v:{eye}")),
        ])
    }
}

/// Text gauge of `GAUGE_WIDTH` cells for a ratio in `0.0..=1.0`.
fn usage_bar(ratio: f64) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * GAUGE_WIDTH as f64).round() as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(GAUGE_WIDTH - filled)
    )
}
