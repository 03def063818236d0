//! collnav library
//!
//! A drill-down terminal browser for catalogued collections and their plugin
//! documentation. The core is a step navigation engine: a stack of menu and
//! content steps driven by a navigation loop against a pluggable frontend,
//! with plugin documents read from a versioned key-value content cache.

pub mod actions;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod producer;
pub mod record;
pub mod theme;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, CommandDelegate};
pub use catalog::{Catalog, CatalogOutcome, CatalogSettings, Collection};
pub use config::NavConfig;
pub use engine::cache::{CacheSession, ContentCache};
pub use engine::navigator::{Delegate, NavOutcome, NavState, Navigator, NoDelegate, Transition};
pub use engine::steps::{Step, StepKind, StepStack};
pub use error::{NavError, Result};
pub use record::Record;
pub use ui::{Frontend, Interaction, Notification, Presentation, Request};
