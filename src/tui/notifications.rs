//! Notifications module for the TUI
//!
//! Provides toast notifications with auto-dismiss and overflow handling.
//! Editor handoff results are reported here.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::Error;

/// Maximum number of toasts to display at once
const MAX_VISIBLE_TOASTS: usize = 3;

/// Default auto-dismiss duration in seconds
const DEFAULT_DISMISS_SECONDS: u64 = 5;

/// Width of the toast column
const TOAST_WIDTH: u16 = 48;

/// Notification level (determines styling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Informational message
    Info,
    /// Success message (task reloaded, etc.)
    Success,
    /// Warning message
    Warning,
    /// Error message
    Error,
}

impl NotificationLevel {
    /// Get color for this level
    pub fn color(&self) -> Color {
        match self {
            NotificationLevel::Info => Color::Blue,
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Warning => Color::Yellow,
            NotificationLevel::Error => Color::Red,
        }
    }

    /// Get icon/prefix for this level
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        }
    }
}

/// A single toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    /// Unique ID for this toast
    pub id: u64,
    /// Notification level
    pub level: NotificationLevel,
    /// Message content
    pub message: String,
    /// When the toast was created
    pub created_at: Instant,
    /// How long before auto-dismiss (None = manual dismiss only)
    pub duration: Option<Duration>,
    /// Whether this toast has been dismissed
    pub dismissed: bool,
}

impl Toast {
    /// Create a new toast
    pub fn new(id: u64, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            created_at: Instant::now(),
            duration: Some(Duration::from_secs(DEFAULT_DISMISS_SECONDS)),
            dismissed: false,
        }
    }

    /// Create a toast that won't auto-dismiss
    pub fn sticky(id: u64, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            duration: None,
            ..Self::new(id, level, message)
        }
    }

    /// Check if this toast should be dismissed due to timeout
    pub fn is_expired(&self) -> bool {
        self.duration
            .is_some_and(|duration| self.created_at.elapsed() >= duration)
    }

    /// Mark this toast as dismissed
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }
}

/// Notification manager - owns the active toasts
#[derive(Debug)]
pub struct NotificationManager {
    /// Active toasts (newest first)
    toasts: VecDeque<Toast>,
    /// Next toast ID
    next_id: u64,
    /// Count of pending (overflow) toasts not displayed
    pub overflow_count: usize,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    /// Create a new notification manager
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            next_id: 1,
            overflow_count: 0,
        }
    }

    /// Add a new notification
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let toast = if level == NotificationLevel::Error {
            Toast::sticky(self.next_id, level, message)
        } else {
            Toast::new(self.next_id, level, message)
        };
        self.next_id += 1;
        self.toasts.push_front(toast);
        self.update_overflow();
    }

    /// Add an info notification
    pub fn info(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    /// Add a success notification
    pub fn success(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    /// Add a warning notification
    pub fn warning(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    /// Add an error notification
    pub fn error(&mut self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    /// Report a failure: warnings for recoverable errors, errors otherwise
    pub fn report(&mut self, error: &Error) {
        if error.is_fatal() {
            self.error(error.to_string());
        } else {
            self.warning(error.to_string());
        }
    }

    /// Remove expired and dismissed toasts
    pub fn cleanup(&mut self) {
        self.toasts.retain(|t| !t.dismissed && !t.is_expired());
        self.update_overflow();
    }

    /// Dismiss all toasts
    pub fn dismiss_all(&mut self) {
        for toast in &mut self.toasts {
            toast.dismiss();
        }
        self.cleanup();
    }

    /// Get visible toasts (limited by MAX_VISIBLE_TOASTS)
    pub fn visible_toasts(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter().take(MAX_VISIBLE_TOASTS)
    }

    /// Check if there are any visible toasts
    pub fn has_toasts(&self) -> bool {
        !self.toasts.is_empty()
    }

    /// Update overflow count
    fn update_overflow(&mut self) {
        self.overflow_count = self.toasts.len().saturating_sub(MAX_VISIBLE_TOASTS);
    }

    /// Render visible toasts stacked in the top-right corner of `area`
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = TOAST_WIDTH.min(area.width);
        let mut y = area.y + 1;
        for toast in self.visible_toasts() {
            let inner_width = width.saturating_sub(2).max(1) as usize;
            let lines = (toast.message.chars().count() + 2).div_ceil(inner_width) as u16;
            let height = lines + 2;
            if y + height > area.y + area.height {
                break;
            }
            let rect = Rect::new(area.x + area.width - width, y, width, height);
            let color = toast.level.color();
            let body = Paragraph::new(format!("{} {}", toast.level.icon(), toast.message))
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color)),
                );
            frame.render_widget(Clear, rect);
            frame.render_widget(body, rect);
            y += height;
        }
    }
}
