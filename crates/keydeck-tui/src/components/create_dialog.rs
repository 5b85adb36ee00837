use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    MaxUsage,
}

/// Raw field values. Validation is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub name: String,
    pub max_usage: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    Submit(CreateRequest),
    Cancel,
}

/// Two-field form for a new key.
pub struct CreateDialog {
    name: String,
    max_usage: String,
    focus: Field,
    creating: bool,
}

impl Default for CreateDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl CreateDialog {
    pub fn new() -> Self {
        Self {
            name: String::new(),
            max_usage: String::new(),
            focus: Field::Name,
            creating: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_usage(&self) -> &str {
        &self.max_usage
    }

    pub fn focus(&self) -> Field {
        self.focus
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn set_creating(&mut self, creating: bool) {
        self.creating = creating;
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.max_usage.clear();
        self.focus = Field::Name;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<DialogEvent> {
        if self.creating {
            return None;
        }
        match key.code {
            KeyCode::Enter => {
                let request = CreateRequest {
                    name: self.name.clone(),
                    max_usage: self.max_usage.clone(),
                };
                self.reset();
                Some(DialogEvent::Submit(request))
            }
            KeyCode::Esc => {
                self.reset();
                Some(DialogEvent::Cancel)
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                self.focus = match self.focus {
                    Field::Name => Field::MaxUsage,
                    Field::MaxUsage => Field::Name,
                };
                None
            }
            KeyCode::Backspace => {
                self.active_input().pop();
                None
            }
            KeyCode::Char(c) => {
                self.active_input().push(c);
                None
            }
            _ => None,
        }
    }

    fn active_input(&mut self) -> &mut String {
        match self.focus {
            Field::Name => &mut self.name,
            Field::MaxUsage => &mut self.max_usage,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(Clear, area);

        let block = Block::default()
            .title(" Create New API Key ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(inner);

        self.render_field(frame, "Key Name", &self.name, Field::Name, rows[0]);
        self.render_field(
            frame,
            "Max Usage Limit",
            &self.max_usage,
            Field::MaxUsage,
            rows[1],
        );

        let footer = if self.creating {
            Line::from(Span::styled(
                " Creating...",
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::from(vec![
                Span::styled(" Enter", Style::default().fg(Color::Yellow).bold()),
                Span::raw(" create "),
                Span::styled(" Tab", Style::default().fg(Color::Yellow).bold()),
                Span::raw(" next field "),
                Span::styled(" Esc", Style::default().fg(Color::Yellow).bold()),
                Span::raw(" cancel "),
            ])
        };
        frame.render_widget(footer, rows[3]);
    }

    fn render_field(&self, frame: &mut Frame, label: &str, value: &str, field: Field, area: Rect) {
        let border_style = if self.focus == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(format!(" {label} "))
            .borders(Borders::ALL)
            .border_style(border_style);
        frame.render_widget(Paragraph::new(value).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(dialog: &mut CreateDialog, s: &str) {
        for c in s.chars() {
            assert_eq!(dialog.handle_key(key(KeyCode::Char(c))), None);
        }
    }

    #[test]
    fn tab_switches_focus() {
        let mut dialog = CreateDialog::new();
        assert_eq!(dialog.focus(), Field::Name);
        dialog.handle_key(key(KeyCode::Tab));
        assert_eq!(dialog.focus(), Field::MaxUsage);
        dialog.handle_key(key(KeyCode::Tab));
        assert_eq!(dialog.focus(), Field::Name);
    }

    #[test]
    fn submit_emits_raw_values_and_resets() {
        let mut dialog = CreateDialog::new();
        type_str(&mut dialog, " Prod ");
        dialog.handle_key(key(KeyCode::Tab));
        type_str(&mut dialog, "10x");
        dialog.handle_key(key(KeyCode::Backspace));

        let event = dialog.handle_key(key(KeyCode::Enter));
        assert_eq!(
            event,
            Some(DialogEvent::Submit(CreateRequest {
                name: " Prod ".into(),
                max_usage: "10".into(),
            }))
        );
        assert_eq!(dialog.name(), "");
        assert_eq!(dialog.max_usage(), "");
        assert_eq!(dialog.focus(), Field::Name);
    }

    #[test]
    fn cancel_resets() {
        let mut dialog = CreateDialog::new();
        type_str(&mut dialog, "draft");
        assert_eq!(dialog.handle_key(key(KeyCode::Esc)), Some(DialogEvent::Cancel));
        assert_eq!(dialog.name(), "");
    }

    #[test]
    fn ignores_keys_while_creating() {
        let mut dialog = CreateDialog::new();
        dialog.set_creating(true);
        assert_eq!(dialog.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(dialog.handle_key(key(KeyCode::Char('a'))), None);
        assert_eq!(dialog.name(), "");
    }
}
