use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use keydeck_service::{NoticeKind, Notifier};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(3);

/// Most toasts drawn at once; older ones stay queued until they expire.
const MAX_VISIBLE: usize = 3;

#[derive(Debug, Clone)]
pub struct Toast {
    pub kind: NoticeKind,
    pub message: String,
    created: Instant,
}

/// Transient notifications, newest last.
///
/// Cheap to clone: every clone shares one queue, so the key list can push
/// into it while the app renders from it.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Toast>>>,
    lifetime: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::with_lifetime(TOAST_LIFETIME)
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            inner: Arc::default(),
            lifetime,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, kind: NoticeKind, message: impl Into<String>) {
        self.lock().push_back(Toast {
            kind,
            message: message.into(),
            created: Instant::now(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeKind::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message);
    }

    /// Drop toasts older than the lifetime. Returns true if any were removed.
    pub fn prune(&self, now: Instant) -> bool {
        let lifetime = self.lifetime;
        let mut queue = self.lock();
        let before = queue.len();
        queue.retain(|t| now.saturating_duration_since(t.created) < lifetime);
        queue.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn latest(&self) -> Option<(NoticeKind, String)> {
        self.lock().back().map(|t| (t.kind, t.message.clone()))
    }

    pub fn snapshot(&self) -> Vec<(NoticeKind, String)> {
        self.lock()
            .iter()
            .map(|t| (t.kind, t.message.clone()))
            .collect()
    }

    /// Stack the newest toasts in the top-right corner of `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let queue = self.lock();
        let width = area.width.min(44);
        let height = 3;

        for (i, toast) in queue.iter().rev().take(MAX_VISIBLE).enumerate() {
            let y = area.y + 1 + (i as u16) * height;
            if y + height > area.y + area.height {
                break;
            }
            let rect = Rect {
                x: area.x + area.width.saturating_sub(width + 1),
                y,
                width,
                height,
            };
            let (color, icon) = match toast.kind {
                NoticeKind::Success => (Color::Green, "✓"),
                NoticeKind::Error => (Color::Red, "✗"),
            };
            frame.render_widget(Clear, rect);
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color));
            let paragraph = Paragraph::new(Line::from(vec![
                Span::styled(format!("{icon} "), Style::default().fg(color).bold()),
                Span::raw(toast.message.as_str()),
            ]))
            .block(block)
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, rect);
        }
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, kind: NoticeKind, message: &str) {
        self.push(kind, message);
    }
}
