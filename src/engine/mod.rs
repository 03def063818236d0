//! Engine modules: the navigation state machine and the content cache.
//!
//! The engine layer knows nothing about terminals or catalog payloads. It
//! moves [`steps::Step`]s on and off a stack in response to interactions and
//! keeps expensive documents in a persistent cache.

pub mod cache;
pub mod navigator;
pub mod steps;
