//! Actions: the code that feeds data into a navigation session.
//!
//! An action turns producer output into a root step, wires up the select
//! callbacks that build deeper steps, and runs the navigator.

pub mod collections;

use crate::engine::steps::Step;

/// How an action ended
#[derive(Debug)]
pub enum ActionOutcome {
    /// There was nothing to browse; the user has been told why
    NoneFound,
    /// The user backed out of the root step
    Exhausted,
    /// The user asked to quit; the sentinel step is returned for the caller
    Quit(Step),
}
