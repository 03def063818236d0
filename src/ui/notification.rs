//! Notification overlays
//!
//! A notification is a titled box of messages drawn over whatever step is on
//! screen. Blocking notifications wait for a key; non-blocking ones are drawn
//! and control returns immediately (progress while the catalog producer
//! runs). Neither touches the step stack.

use crate::theme::Severity;
use crate::ui::keybindings::HelpSection;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Trailing line of a blocking notification
pub const ACK_HINT: &str = "Press any key to continue";

/// An overlay message box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub messages: Vec<String>,
    pub severity: Severity,
    pub blocking: bool,
}

impl Notification {
    /// A notification that waits for acknowledgement
    pub fn blocking(
        title: impl Into<String>,
        messages: Vec<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            messages,
            severity,
            blocking: true,
        }
    }

    /// A notification that is drawn and immediately returns
    pub fn non_blocking(
        title: impl Into<String>,
        messages: Vec<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            messages,
            severity,
            blocking: false,
        }
    }

    /// Messages wrapped to `width`, plus the acknowledgement hint if blocking.
    pub fn body_lines(&self, width: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .messages
            .iter()
            .flat_map(|message| wrap(message, width))
            .collect();
        if self.blocking {
            lines.push(String::new());
            lines.push(ACK_HINT.to_string());
        }
        lines
    }

    /// Outer box size (including a one-cell border) for a screen of the given size.
    pub fn box_size(&self, screen_width: u16, screen_height: u16, max_pct: u16) -> (u16, u16) {
        let max_inner = (u32::from(screen_width) * u32::from(max_pct) / 100) as usize;
        let max_inner = max_inner.saturating_sub(2).max(1);
        let lines = self.body_lines(max_inner);
        let widest = lines
            .iter()
            .map(|l| l.width())
            .chain(std::iter::once(self.title.width() + 2))
            .max()
            .unwrap_or(0)
            .min(max_inner);
        let width = u16::try_from(widest + 4).unwrap_or(screen_width).min(screen_width);
        let height = u16::try_from(lines.len() + 2)
            .unwrap_or(screen_height)
            .min(screen_height);
        (width, height)
    }
}

/// A blocking warning
pub fn warning_notification(messages: Vec<String>) -> Notification {
    Notification::blocking("WARNING", messages, Severity::Warning)
}

/// A blocking error
pub fn error_notification(messages: Vec<String>) -> Notification {
    Notification::blocking("ERROR", messages, Severity::Error)
}

/// A progress message that does not wait
pub fn nonblocking_notification(messages: Vec<String>) -> Notification {
    Notification::non_blocking("", messages, Severity::Info)
}

/// The `:help` overlay built from the key registry
pub fn help_notification(sections: &[HelpSection]) -> Notification {
    let mut messages = Vec::new();
    for section in sections {
        messages.push(format!("-- {} --", section.title));
        for (key, desc) in &section.items {
            messages.push(format!("  {key:<14}{desc}"));
        }
        messages.push(String::new());
    }
    if messages.last().is_some_and(String::is_empty) {
        messages.pop();
    }
    Notification::blocking("HELP", messages, Severity::Info)
}

/// Greedy word wrap on display width; overlong words are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ') {
        let sep = usize::from(!line.is_empty());
        if line.width() + sep + word.width() <= width {
            if sep == 1 {
                line.push(' ');
            }
            line.push_str(word);
            continue;
        }
        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        for ch in word.chars() {
            if !line.is_empty() && line.width() + ch.width().unwrap_or(0) > width {
                lines.push(std::mem::take(&mut line));
            }
            line.push(ch);
        }
    }
    lines.push(line);
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_blocking_adds_ack_hint() {
        let n = warning_notification(vec!["careful".into()]);
        let lines = n.body_lines(40);
        assert_eq!(lines.last().map(String::as_str), Some(ACK_HINT));
        let n = nonblocking_notification(vec!["working".into()]);
        assert_eq!(n.body_lines(40), vec!["working"]);
    }

    #[test]
    fn test_box_fits_screen() {
        let n = warning_notification(vec!["x".repeat(500)]);
        let (w, h) = n.box_size(80, 10, 80);
        assert!(w <= 80);
        assert!(h <= 10);
    }

    #[test]
    fn test_help_lists_sections() {
        let sections = vec![HelpSection {
            title: "General".into(),
            items: vec![("esc".into(), "back".into())],
        }];
        let n = help_notification(&sections);
        assert!(n.blocking);
        assert_eq!(n.messages[0], "-- General --");
        assert!(n.messages[1].contains("back"));
    }
}
