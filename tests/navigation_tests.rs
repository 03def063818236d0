//! Tests for the navigation loop
//!
//! A scripted frontend plays back interactions and records which steps it
//! was asked to draw.
//!
//! These tests verify:
//! - Selecting with no follow-up step returns to the previous step
//! - Back, quit and interrupt end navigation the right way
//! - Cursor restore around `on_show`, and the content-to-menu cursor sync
//! - Delegated requests can push steps

use collnav::ui::{Frontend, Interaction, Notification, Presentation, Request};
use collnav::{Delegate, NavOutcome, NavState, Navigator, NoDelegate, Record, Result, Step, Transition};
use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

/// Plays back a script; an exhausted script backs out.
#[derive(Default)]
struct Scripted {
    script: VecDeque<Interaction>,
    shown: Vec<(String, Option<usize>)>,
    notes: Vec<Notification>,
}

impl Scripted {
    fn new(script: impl IntoIterator<Item = Interaction>) -> Self {
        Self {
            script: script.into_iter().collect(),
            ..Self::default()
        }
    }

    fn next(&mut self, step: &Step) -> Interaction {
        self.shown.push((step.name().to_string(), step.cursor()));
        self.script.pop_front().unwrap_or(Interaction::Back)
    }
}

impl Frontend for Scripted {
    fn show_menu(&mut self, step: &Step, _: &Presentation) -> Result<Interaction> {
        Ok(self.next(step))
    }
    fn show_content(&mut self, step: &Step, _: &Presentation) -> Result<Interaction> {
        Ok(self.next(step))
    }
    fn notify(&mut self, notification: &Notification) -> Result<()> {
        self.notes.push(notification.clone());
        Ok(())
    }
    fn poll_interrupt(&mut self, _: Duration) -> Result<bool> {
        Ok(false)
    }
}

fn rows(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record::new().with("name", format!("r{i}")))
        .collect()
}

fn leaf_menu(name: &str, n: usize) -> Step {
    Step::menu(name, rows(n), vec!["name".into()]).unwrap()
}

/// root menu whose selection opens a 3-row leaf menu
fn two_level() -> Navigator {
    let root = leaf_menu("root", 2).with_on_select(|_| Ok(Some(leaf_menu("leaf", 3))));
    Navigator::new(root, Presentation::new())
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_select_without_follow_up_pops_one_level() {
    let mut nav = two_level();
    let mut frontend = Scripted::new([Interaction::Select(0), Interaction::Select(2)]);

    assert_eq!(nav.step_once(&mut frontend, &mut NoDelegate).unwrap(), Transition::Pushed);
    assert_eq!(nav.stack().len(), 2);
    assert_eq!(nav.step_once(&mut frontend, &mut NoDelegate).unwrap(), Transition::Popped);
    assert_eq!(nav.stack().len(), 1);
    assert_eq!(nav.stack().current().name(), "root");
    assert_eq!(nav.state(), NavState::Running);
}

#[test]
fn test_select_sets_cursor_before_callback() {
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    let root = leaf_menu("root", 5).with_on_select(move |step| {
        sink.set(step.selected_index());
        Ok(None)
    });
    let mut nav = Navigator::new(root, Presentation::new());
    let mut frontend = Scripted::new([Interaction::Select(3)]);
    nav.step_once(&mut frontend, &mut NoDelegate).unwrap();
    assert_eq!(seen.get(), Some(3));
}

#[test]
fn test_back_from_root_exhausts() {
    let nav = two_level();
    let mut frontend = Scripted::new([Interaction::Select(1), Interaction::Back, Interaction::Back]);
    assert!(matches!(
        nav.run(&mut frontend, &mut NoDelegate).unwrap(),
        NavOutcome::Exhausted
    ));
    let names: Vec<&str> = frontend.shown.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["root", "leaf", "root"]);
}

// =============================================================================
// Quit and interrupt
// =============================================================================

#[test]
fn test_quit_from_deep_step() {
    let nav = two_level();
    let mut frontend = Scripted::new([
        Interaction::Select(0),
        Interaction::Request(Request::Quit),
    ]);
    match nav.run(&mut frontend, &mut NoDelegate).unwrap() {
        NavOutcome::Quit(step) => assert!(step.is_quit()),
        NavOutcome::Exhausted => panic!("expected the quit step"),
    }
}

#[test]
fn test_interrupt_unwinds_everything() {
    let mut nav = two_level();
    let mut frontend = Scripted::new([Interaction::Select(0), Interaction::Interrupt]);
    nav.step_once(&mut frontend, &mut NoDelegate).unwrap();
    let t = nav.step_once(&mut frontend, &mut NoDelegate).unwrap();
    assert_eq!(t, Transition::Finished(NavState::Exhausted));
    assert!(nav.stack().is_empty());
}

// =============================================================================
// Cursor handling
// =============================================================================

#[test]
fn test_on_show_cannot_move_cursor() {
    let root = Step::content("root", rows(3), Some(1)).with_on_show(|step| {
        step.set_cursor(Some(0));
        let _ = step.set_records(rows(4));
    });
    let mut nav = Navigator::new(root, Presentation::new());
    let mut frontend = Scripted::new([Interaction::Page(1)]);
    nav.step_once(&mut frontend, &mut NoDelegate).unwrap();
    assert_eq!(frontend.shown[0], ("root".to_string(), Some(1)));
    assert_eq!(nav.stack().current().records().len(), 4);
}

#[test]
fn test_popping_content_moves_menu_cursor() {
    let root = leaf_menu("menu", 4)
        .with_on_select(|step| Ok(Some(Step::content("page", step.records().to_vec(), step.cursor()))));
    let mut nav = Navigator::new(root, Presentation::new());
    let mut frontend = Scripted::new([
        Interaction::Select(1),
        Interaction::Page(3),
        Interaction::Back,
    ]);
    for _ in 0..3 {
        nav.step_once(&mut frontend, &mut NoDelegate).unwrap();
    }
    assert_eq!(nav.stack().len(), 1);
    assert_eq!(nav.stack().current().cursor(), Some(3));
}

// =============================================================================
// Delegation
// =============================================================================

struct Opener;

impl Delegate for Opener {
    fn handle(
        &mut self,
        request: &Request,
        _: &Step,
        frontend: &mut dyn Frontend,
    ) -> Result<Option<Step>> {
        match request {
            Request::Command(cmd) if cmd == "open" => Ok(Some(leaf_menu("opened", 1))),
            _ => {
                frontend.notify(&collnav::ui::notification::warning_notification(vec![
                    "nope".into(),
                ]))?;
                Ok(None)
            }
        }
    }
}

#[test]
fn test_delegate_can_push_or_stay() {
    let mut nav = two_level();
    let mut frontend = Scripted::new([
        Interaction::Request(Request::Command("bogus".into())),
        Interaction::Request(Request::Command("open".into())),
    ]);
    let mut delegate = Opener;
    assert_eq!(nav.step_once(&mut frontend, &mut delegate).unwrap(), Transition::Stayed);
    assert_eq!(frontend.notes.len(), 1);
    assert_eq!(nav.step_once(&mut frontend, &mut delegate).unwrap(), Transition::Pushed);
    assert_eq!(nav.stack().current().name(), "opened");
}

#[test]
fn test_contract_violation_from_callback_propagates() {
    let root = leaf_menu("root", 1).with_on_select(|_| {
        let hidden = vec![Record::new().with_hidden("name", "x")];
        Step::menu("bad", hidden, vec!["name".into()]).map(Some)
    });
    let mut nav = Navigator::new(root, Presentation::new());
    let mut frontend = Scripted::new([Interaction::Select(0)]);
    let err = nav.step_once(&mut frontend, &mut NoDelegate).unwrap_err();
    assert!(err.is_contract_violation());
}
