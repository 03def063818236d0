//! Navigation loop
//!
//! Drives a [`StepStack`] against a [`Frontend`] one interaction at a time:
//!
//! 1. run the current step's `on_show` (cursor saved and restored)
//! 2. render it and block for one [`Interaction`]
//! 3. push the step produced by a selection, or pop when nothing was produced
//!
//! Requests the frontend cannot satisfy (`:help`, unknown colon commands) are
//! returned to the outer driver through [`Delegate`] rather than handled by
//! recursing into another action.

use crate::engine::steps::{Step, StepKind, StepStack};
use crate::error::Result;
use crate::ui::{self, Frontend, Interaction, Presentation, Request};
use tracing::{debug, info};

/// Where the loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Running,
    /// The stack is empty: nothing was selected
    Exhausted,
    /// A step named `quit` became current
    Quit,
}

/// How a finished navigation session ended
#[derive(Debug)]
pub enum NavOutcome {
    Exhausted,
    /// The sentinel step, handed back so the caller can unwind further
    Quit(Step),
}

/// What one iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Pushed,
    Popped,
    Stayed,
    Finished(NavState),
}

/// The outer driver: decides what to do with requests the loop hands up.
pub trait Delegate {
    /// Handle a request. `Ok(Some(step))` pushes the step; `Ok(None)` stays.
    fn handle(
        &mut self,
        request: &Request,
        current: &Step,
        frontend: &mut dyn Frontend,
    ) -> Result<Option<Step>>;
}

/// A delegate that ignores every request
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDelegate;

impl Delegate for NoDelegate {
    fn handle(&mut self, request: &Request, _: &Step, _: &mut dyn Frontend) -> Result<Option<Step>> {
        debug!("Ignoring request {:?}", request);
        Ok(None)
    }
}

/// The navigation state machine
#[derive(Debug)]
pub struct Navigator {
    stack: StepStack,
    presentation: Presentation,
}

impl Navigator {
    /// Start a session with `root` as the first step
    pub fn new(root: Step, presentation: Presentation) -> Self {
        let mut stack = StepStack::new();
        stack.push(root);
        Self {
            stack,
            presentation,
        }
    }

    pub fn stack(&self) -> &StepStack {
        &self.stack
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn state(&self) -> NavState {
        if self.stack.is_empty() {
            NavState::Exhausted
        } else if self.stack.current().is_quit() {
            NavState::Quit
        } else {
            NavState::Running
        }
    }

    /// Run until the stack is exhausted or the quit step is reached.
    pub fn run(
        mut self,
        frontend: &mut dyn Frontend,
        delegate: &mut dyn Delegate,
    ) -> Result<NavOutcome> {
        loop {
            match self.step_once(frontend, delegate)? {
                Transition::Finished(NavState::Exhausted) => return Ok(NavOutcome::Exhausted),
                Transition::Finished(NavState::Quit) => {
                    return Ok(match self.stack.pop_one() {
                        Some(quit) => NavOutcome::Quit(quit),
                        None => NavOutcome::Exhausted,
                    });
                }
                _ => {}
            }
        }
    }

    /// Execute one iteration of the loop.
    pub fn step_once(
        &mut self,
        frontend: &mut dyn Frontend,
        delegate: &mut dyn Delegate,
    ) -> Result<Transition> {
        match self.state() {
            NavState::Running => {}
            finished => return Ok(Transition::Finished(finished)),
        }

        self.stack.current_mut().show();
        let interaction = ui::render(frontend, self.stack.current(), &self.presentation)?;
        debug!(
            "Step '{}' ({}) -> {:?}",
            self.stack.current().name(),
            self.stack.current().kind().label(),
            interaction
        );

        let transition = match interaction {
            Interaction::Select(index) => {
                self.stack.current_mut().set_cursor(Some(index));
                match self.stack.current().select()? {
                    Some(next) => self.push(next),
                    None => self.pop(),
                }
            }
            Interaction::Back => self.pop(),
            Interaction::Page(index) => {
                self.stack.current_mut().set_cursor(Some(index));
                Transition::Stayed
            }
            Interaction::Request(Request::Quit) => self.push(Step::quit()),
            Interaction::Request(request) => {
                match delegate.handle(&request, self.stack.current(), frontend)? {
                    Some(next) => self.push(next),
                    None => Transition::Stayed,
                }
            }
            Interaction::Interrupt => {
                info!("Interrupted, unwinding {} step(s)", self.stack.len());
                while self.stack.pop_one().is_some() {}
                Transition::Finished(NavState::Exhausted)
            }
        };

        Ok(match (transition, self.state()) {
            (Transition::Finished(state), _) => Transition::Finished(state),
            (_, NavState::Running) => transition,
            (_, finished) => Transition::Finished(finished),
        })
    }

    fn push(&mut self, step: Step) -> Transition {
        debug!("Push '{}' at depth {}", step.name(), self.stack.len() + 1);
        self.stack.push(step);
        Transition::Pushed
    }

    fn pop(&mut self) -> Transition {
        let Some(popped) = self.stack.pop_one() else {
            return Transition::Finished(NavState::Exhausted);
        };
        debug!("Pop '{}', depth now {}", popped.name(), self.stack.len());
        // The menu under a content view follows the page the user ended on
        if popped.kind() == &StepKind::Content && !self.stack.is_empty() {
            self.stack.current_mut().set_cursor(popped.cursor());
        }
        Transition::Popped
    }
}
