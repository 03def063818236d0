//! Navigation frames and the navigation history.
//!
//! A [`Step`] is one frame in the drill-down hierarchy: a named view over an
//! ordered list of [`Record`]s with a cursor. A [`StepStack`] is the history of
//! frames; the last one is what the user is looking at.
//!
//! # Change tracking
//!
//! Setting the cursor or replacing the records compares against the previous
//! value and raises the `changed` flag only if something actually differs.
//! Callers clear the flag after doing their (possibly expensive) preparation.
//!
//! # Invariants
//!
//! - A set cursor is dereferenced modulo `len(records)`, so selection wraps
//! - A menu never names a column that is hidden in any of its records
//! - `StepStack::current` on an empty stack is a defect and panics;
//!   `StepStack::pop_one` on an empty stack is normal and returns `None`

use crate::error::{NavError, Result};
use crate::record::{json_kind, Record};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Name of the sentinel step that ends navigation for the caller.
pub const QUIT_STEP: &str = "quit";

/// Produces the next step when a menu row is activated.
///
/// `Ok(None)` means the selection produced nothing and navigation steps back.
pub type SelectFn = Rc<dyn Fn(&Step) -> Result<Option<Step>>>;

/// Runs before a step is rendered each time it becomes current.
pub type ShowFn = Rc<dyn Fn(&mut Step)>;

/// What a step renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// Tabular list; the cursor selects a row.
    Menu {
        /// Visible field names rendered as columns, in order.
        columns: Vec<String>,
    },
    /// Detail view of one record; the cursor pages through siblings.
    Content,
}

impl StepKind {
    /// Short lowercase label, used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Menu { .. } => "menu",
            Self::Content => "content",
        }
    }
}

/// One frame in the drill-down hierarchy.
pub struct Step {
    name: String,
    kind: StepKind,
    records: Vec<Record>,
    cursor: Option<usize>,
    cursor_changed: bool,
    records_changed: bool,
    on_select: Option<SelectFn>,
    on_show: Option<ShowFn>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("records", &self.records.len())
            .field("cursor", &self.cursor)
            .field("changed", &self.changed())
            .field("on_select", &self.on_select.is_some())
            .field("on_show", &self.on_show.is_some())
            .finish()
    }
}

impl Step {
    /// Create a step of any kind.
    ///
    /// # Errors
    ///
    /// Returns a contract violation if a menu column is hidden in any record.
    pub fn new(name: impl Into<String>, kind: StepKind, records: Vec<Record>) -> Result<Self> {
        let step = Self {
            name: name.into(),
            kind,
            records,
            cursor: None,
            cursor_changed: false,
            records_changed: false,
            on_select: None,
            on_show: None,
        };
        step.check_columns(&step.records)?;
        Ok(step)
    }

    /// Create a menu step.
    pub fn menu(
        name: impl Into<String>,
        records: Vec<Record>,
        columns: Vec<String>,
    ) -> Result<Self> {
        Self::new(name, StepKind::Menu { columns }, records)
    }

    /// Create a content step showing `records[cursor]`.
    pub fn content(name: impl Into<String>, records: Vec<Record>, cursor: Option<usize>) -> Self {
        Self {
            name: name.into(),
            kind: StepKind::Content,
            records,
            cursor,
            cursor_changed: false,
            records_changed: false,
            on_select: None,
            on_show: None,
        }
    }

    /// The sentinel step that asks the caller to stop navigating.
    pub fn quit() -> Self {
        Self::content(QUIT_STEP, Vec::new(), None)
    }

    /// Builder: set the initial cursor (does not raise `changed`)
    pub fn with_cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Builder: attach the select callback
    pub fn with_on_select<F>(mut self, f: F) -> Self
    where
        F: Fn(&Step) -> Result<Option<Step>> + 'static,
    {
        self.on_select = Some(Rc::new(f));
        self
    }

    /// Builder: attach the pre-render callback
    pub fn with_on_show<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Step) + 'static,
    {
        self.on_show = Some(Rc::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    pub fn is_menu(&self) -> bool {
        matches!(self.kind, StepKind::Menu { .. })
    }

    pub fn is_quit(&self) -> bool {
        self.name == QUIT_STEP
    }

    /// Menu columns; empty for content steps.
    pub fn columns(&self) -> &[String] {
        match &self.kind {
            StepKind::Menu { columns } => columns,
            StepKind::Content => &[],
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn has_on_select(&self) -> bool {
        self.on_select.is_some()
    }

    pub fn has_on_show(&self) -> bool {
        self.on_show.is_some()
    }

    /// True iff the cursor or the records changed since the flag was last cleared.
    pub fn changed(&self) -> bool {
        self.cursor_changed || self.records_changed
    }

    /// Force both change flags to `value`.
    pub fn set_changed(&mut self, value: bool) {
        self.cursor_changed = value;
        self.records_changed = value;
    }

    /// Move the cursor. Returns whether it differs from the previous value.
    pub fn set_cursor(&mut self, cursor: Option<usize>) -> bool {
        self.cursor_changed = self.cursor != cursor;
        self.cursor = cursor;
        self.cursor_changed
    }

    /// Move the cursor from a dynamically-typed value.
    ///
    /// # Errors
    ///
    /// Contract violation unless `value` is `null` or a non-negative integer.
    pub fn set_cursor_value(&mut self, value: &Value) -> Result<bool> {
        let cursor = match value {
            Value::Null => None,
            Value::Number(n) => match n.as_u64().and_then(|n| usize::try_from(n).ok()) {
                Some(n) => Some(n),
                None => {
                    return Err(NavError::contract(format!(
                        "step '{}': cursor must be a non-negative integer, got {n}",
                        self.name
                    )));
                }
            },
            other => {
                return Err(NavError::contract(format!(
                    "step '{}': cursor must be an integer or null, got {}",
                    self.name,
                    json_kind(other)
                )));
            }
        };
        Ok(self.set_cursor(cursor))
    }

    /// Replace the records wholesale. Returns whether they differ by value.
    ///
    /// # Errors
    ///
    /// Contract violation if a menu column would become a hidden field.
    pub fn set_records(&mut self, records: Vec<Record>) -> Result<bool> {
        self.check_columns(&records)?;
        self.records_changed = self.records != records;
        self.records = records;
        Ok(self.records_changed)
    }

    /// Replace the records from a dynamically-typed value.
    ///
    /// # Errors
    ///
    /// Contract violation unless `value` is a sequence of mappings.
    pub fn set_records_value(&mut self, value: Value) -> Result<bool> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(NavError::contract(format!(
                    "step '{}': records must be a sequence, got {}",
                    self.name,
                    json_kind(&other)
                )));
            }
        };
        let records = items
            .into_iter()
            .map(Record::from_wire)
            .collect::<Result<Vec<_>>>()?;
        self.set_records(records)
    }

    /// Cursor position reduced modulo the record count.
    pub fn selected_index(&self) -> Option<usize> {
        match (self.cursor, self.records.len()) {
            (None, _) | (_, 0) => None,
            (Some(cursor), len) => Some(cursor % len),
        }
    }

    /// The record under the cursor, if any.
    pub fn selected(&self) -> Option<&Record> {
        self.selected_index().map(|idx| &self.records[idx])
    }

    /// Invoke the select callback. No callback means "nothing to select".
    pub fn select(&self) -> Result<Option<Step>> {
        match &self.on_select {
            Some(on_select) => on_select(self),
            None => Ok(None),
        }
    }

    /// Invoke the pre-render callback with the cursor saved and restored around it.
    pub fn show(&mut self) {
        let Some(on_show) = self.on_show.clone() else {
            return;
        };
        let cursor = self.cursor;
        on_show(self);
        self.set_cursor(cursor);
    }

    fn check_columns(&self, records: &[Record]) -> Result<()> {
        for column in self.columns() {
            if records.iter().any(|record| record.is_hidden(column)) {
                return Err(NavError::contract(format!(
                    "menu '{}' names hidden field '{column}' as a column",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Navigation history with stack discipline.
///
/// Only the top two frames are reachable.
#[derive(Debug, Default)]
pub struct StepStack {
    steps: Vec<Step>,
}

impl StepStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a step; it becomes `current`.
    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    /// Remove and return the current step; `None` means history is exhausted.
    pub fn pop_one(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step on top of the stack.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty; check [`StepStack::is_empty`] first.
    #[track_caller]
    pub fn current(&self) -> &Step {
        match self.steps.last() {
            Some(step) => step,
            None => panic!("StepStack::current called on an empty stack"),
        }
    }

    /// Mutable access to the step on top of the stack.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty.
    #[track_caller]
    pub fn current_mut(&mut self) -> &mut Step {
        match self.steps.last_mut() {
            Some(step) => step,
            None => panic!("StepStack::current_mut called on an empty stack"),
        }
    }

    /// The step below the current one.
    ///
    /// # Panics
    ///
    /// Panics if the stack holds fewer than two steps.
    #[track_caller]
    pub fn previous(&self) -> &Step {
        let len = self.steps.len();
        if len < 2 {
            panic!("StepStack::previous called with {len} step(s) on the stack");
        }
        &self.steps[len - 2]
    }

    /// Mutable access to the step below the current one.
    ///
    /// # Panics
    ///
    /// Panics if the stack holds fewer than two steps.
    #[track_caller]
    pub fn previous_mut(&mut self) -> &mut Step {
        let len = self.steps.len();
        if len < 2 {
            panic!("StepStack::previous_mut called with {len} step(s) on the stack");
        }
        &mut self.steps[len - 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(n: usize) -> Vec<Record> {
        (0..n).map(|i| Record::new().with("name", format!("row{i}"))).collect()
    }

    #[test]
    fn test_new_step_is_unchanged() {
        let step = Step::menu("m", rows(3), vec!["name".into()]).unwrap();
        assert!(!step.changed());
        assert_eq!(step.cursor(), None);
        assert!(step.selected().is_none());
    }

    #[test]
    fn test_set_cursor_tracks_change() {
        let mut step = Step::content("c", rows(3), Some(1));
        assert!(!step.set_cursor(Some(1)));
        assert!(!step.changed());
        assert!(step.set_cursor(Some(2)));
        assert!(step.changed());
        step.set_changed(false);
        assert!(!step.changed());
    }

    #[test]
    fn test_set_records_compares_by_value() {
        let mut step = Step::menu("m", rows(2), vec!["name".into()]).unwrap();
        assert!(!step.set_records(rows(2)).unwrap());
        assert!(step.set_records(rows(3)).unwrap());
        assert!(step.changed());
    }

    #[test]
    fn test_selected_wraps() {
        let step = Step::content("c", rows(3), Some(7));
        assert_eq!(step.selected_index(), Some(1));
        assert_eq!(step.selected().unwrap().text("name"), Some("row1"));
    }

    #[test]
    fn test_hidden_column_is_rejected() {
        let records = vec![Record::new().with("name", "x").with_hidden("shadowed", true)];
        let err = Step::menu("m", records, vec!["shadowed".into()]).unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_set_records_value_rejects_non_sequence() {
        let mut step = Step::content("c", Vec::new(), None);
        let err = step.set_records_value(json!({"name": "x"})).unwrap_err();
        assert!(err.is_contract_violation());
        let err = step.set_records_value(json!([1, 2])).unwrap_err();
        assert!(err.is_contract_violation());
        assert!(step.set_records_value(json!([{"name": "x"}])).unwrap());
    }

    #[test]
    fn test_set_cursor_value_rejects_wrong_shape() {
        let mut step = Step::content("c", rows(2), None);
        assert!(step.set_cursor_value(&json!("1")).unwrap_err().is_contract_violation());
        assert!(step.set_cursor_value(&json!(-1)).unwrap_err().is_contract_violation());
        assert!(step.set_cursor_value(&json!(1)).unwrap());
        assert!(step.set_cursor_value(&Value::Null).unwrap());
        assert_eq!(step.cursor(), None);
    }

    #[test]
    fn test_show_restores_cursor() {
        let mut step = Step::content("c", rows(3), Some(2)).with_on_show(|s| {
            s.set_cursor(Some(0));
            let mut records = s.records().to_vec();
            records.push(Record::new().with("name", "extra"));
            let _ = s.set_records(records);
        });
        step.show();
        assert_eq!(step.cursor(), Some(2));
        assert_eq!(step.records().len(), 4);
    }

    #[test]
    fn test_stack_current_and_previous() {
        let mut stack = StepStack::new();
        stack.push(Step::content("a", Vec::new(), None));
        stack.push(Step::content("b", Vec::new(), None));
        assert_eq!(stack.current().name(), "b");
        assert_eq!(stack.previous().name(), "a");
        assert_eq!(stack.pop_one().unwrap().name(), "b");
        assert_eq!(stack.pop_one().unwrap().name(), "a");
        assert!(stack.pop_one().is_none());
    }

    #[test]
    #[should_panic(expected = "empty stack")]
    fn test_current_on_empty_stack_panics() {
        let stack = StepStack::new();
        let _ = stack.current();
    }
}
