//! Rendering contract
//!
//! The navigator never touches the terminal directly. It hands the current
//! [`Step`] to a [`Frontend`], together with a [`Presentation`] describing how
//! cells are colorized and how content is headed and filtered, and gets back
//! one [`Interaction`].
//!
//! Submodules:
//! - `menu` / `content` / `notification`: pure projections from data to text
//! - `highlight`: YAML syntax coloring of content lines
//! - `keybindings`: per-view key registry driving the footer and `:help`
//! - `terminal`: the ratatui + crossterm implementation of [`Frontend`]

pub mod content;
pub mod highlight;
pub mod keybindings;
pub mod menu;
pub mod notification;
pub mod terminal;

use crate::engine::steps::{Step, StepKind};
use crate::error::Result;
use crate::record::Record;
use crate::theme::CellStyle;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

pub use notification::Notification;

/// Maps `(column_index, column_name, record)` to a cell style.
pub type Colorizer = Rc<dyn Fn(usize, &str, &Record) -> CellStyle>;

/// Builds the fixed header line of a content view from `(record, terminal_width)`.
pub type HeadingFn = Rc<dyn Fn(&Record, u16) -> Option<Heading>>;

/// Returns `true` for visible keys that may be shown in a content view.
pub type KeyFilter = Rc<dyn Fn(&str) -> bool>;

/// A content view heading line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub text: String,
    pub style: CellStyle,
}

/// How the steps of one navigation session are drawn.
#[derive(Clone, Default)]
pub struct Presentation {
    pub colorizer: Option<Colorizer>,
    pub heading: Option<HeadingFn>,
    pub key_filter: Option<KeyFilter>,
}

impl fmt::Debug for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Presentation")
            .field("colorizer", &self.colorizer.is_some())
            .field("heading", &self.heading.is_some())
            .field("key_filter", &self.key_filter.is_some())
            .finish()
    }
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colorizer<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, &str, &Record) -> CellStyle + 'static,
    {
        self.colorizer = Some(Rc::new(f));
        self
    }

    pub fn with_heading<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record, u16) -> Option<Heading> + 'static,
    {
        self.heading = Some(Rc::new(f));
        self
    }

    pub fn with_key_filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.key_filter = Some(Rc::new(f));
        self
    }

    /// Style for one menu cell; uncolorized cells use the default entry color.
    pub fn cell_style(&self, column_index: usize, column: &str, record: &Record) -> CellStyle {
        match &self.colorizer {
            Some(colorizer) => colorizer(column_index, column, record),
            None => CellStyle::default(),
        }
    }

    /// Heading for a content view, if this presentation has one
    pub fn heading_for(&self, record: &Record, width: u16) -> Option<Heading> {
        self.heading.as_ref().and_then(|heading| heading(record, width))
    }

    /// True if `key` passes the key filter (no filter keeps everything)
    pub fn keeps_key(&self, key: &str) -> bool {
        self.key_filter.as_ref().is_none_or(|filter| filter(key))
    }
}

/// Requests the frontend cannot satisfy itself and hands up to the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `:q` / `:quit`
    Quit,
    /// `:help`
    Help,
    /// Any other colon command, verbatim without the leading `:`
    Command(String),
}

/// The result of rendering a step once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// A menu row was activated; the value indexes the step's records.
    Select(usize),
    /// The user backed out of this step.
    Back,
    /// A content step paged to another sibling record.
    Page(usize),
    /// Something for the outer driver to decide.
    Request(Request),
    /// Ctrl+C during a blocking render.
    Interrupt,
}

/// A terminal surface the navigator can render onto.
pub trait Frontend {
    /// Render a menu step and block for one interaction.
    fn show_menu(&mut self, step: &Step, presentation: &Presentation) -> Result<Interaction>;

    /// Render a content step and block for one interaction.
    fn show_content(&mut self, step: &Step, presentation: &Presentation) -> Result<Interaction>;

    /// Draw a notification overlay. Blocking notifications wait for a key.
    fn notify(&mut self, notification: &Notification) -> Result<()>;

    /// Wait up to `timeout` for input; true if the user asked to interrupt.
    fn poll_interrupt(&mut self, timeout: Duration) -> Result<bool>;
}

/// Dispatch on the step kind.
pub fn render(
    frontend: &mut dyn Frontend,
    step: &Step,
    presentation: &Presentation,
) -> Result<Interaction> {
    match step.kind() {
        StepKind::Menu { .. } => frontend.show_menu(step, presentation),
        StepKind::Content => frontend.show_content(step, presentation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Decoration;

    #[test]
    fn test_default_presentation_keeps_everything() {
        let presentation = Presentation::new();
        let record = Record::new().with("name", "x");
        assert!(presentation.keeps_key("anything"));
        assert_eq!(presentation.cell_style(0, "name", &record), CellStyle::default());
        assert!(presentation.heading_for(&record, 80).is_none());
    }

    #[test]
    fn test_colorizer_receives_cell_position() {
        let presentation = Presentation::new().with_colorizer(|idx, name, _| {
            if idx == 1 && name == "version" {
                CellStyle::new(9, Decoration::Bold)
            } else {
                CellStyle::plain(2)
            }
        });
        let record = Record::new();
        assert_eq!(presentation.cell_style(1, "version", &record).color, 9);
        assert_eq!(presentation.cell_style(0, "name", &record).color, 2);
    }

    #[test]
    fn test_key_filter_applies() {
        let presentation = Presentation::new().with_key_filter(|key| key != "secret");
        assert!(presentation.keeps_key("name"));
        assert!(!presentation.keeps_key("secret"));
    }
}
