//! Outer driver
//!
//! Owns the settings and the content cache, runs the catalog producer while a
//! progress notification is on screen, then hands the ingested catalog to the
//! collections action. Requests the navigator cannot handle itself come back
//! here through [`CommandDelegate`].

use crate::actions::{collections, ActionOutcome};
use crate::catalog;
use crate::config::NavConfig;
use crate::engine::cache::ContentCache;
use crate::engine::navigator::Delegate;
use crate::engine::steps::Step;
use crate::error::Result;
use crate::producer::{spawn_producer, CatalogSource, ProducerPoll};
use crate::ui::keybindings::{KeybindingContext, View};
use crate::ui::notification::{
    error_notification, help_notification, nonblocking_notification, warning_notification,
};
use crate::ui::{Frontend, Request};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shown while the catalog producer runs
pub const COLLECTING_MESSAGE: &str =
    "Collecting collection content, this may take a minute the first time...";

/// Warning lines for a colon command nobody recognised.
pub fn unknown_command_messages(entry: &str) -> Vec<String> {
    vec![
        format!("Could not find a match for ':{entry}'"),
        "Try ':help' for some suggestions.".to_string(),
    ]
}

/// Handles `:help` and unknown colon commands.
#[derive(Default)]
pub struct CommandDelegate {
    keys: KeybindingContext,
}

impl CommandDelegate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Delegate for CommandDelegate {
    fn handle(
        &mut self,
        request: &Request,
        current: &Step,
        frontend: &mut dyn Frontend,
    ) -> Result<Option<Step>> {
        match request {
            Request::Help => {
                let view = if current.is_menu() {
                    View::Menu
                } else {
                    View::Content
                };
                frontend.notify(&help_notification(&self.keys.get_help_content(view)))?;
            }
            Request::Command(entry) => {
                warn!("Unknown command ':{}' in step '{}'", entry, current.name());
                frontend.notify(&warning_notification(unknown_command_messages(entry)))?;
            }
            Request::Quit => debug!("Quit request reached the delegate"),
        }
        Ok(None)
    }
}

/// The application
pub struct App {
    config: NavConfig,
    cache: Rc<ContentCache>,
    interrupted: Arc<AtomicBool>,
}

impl App {
    /// `interrupted` is raised by the process signal handler.
    pub fn new(config: NavConfig, interrupted: Arc<AtomicBool>) -> Self {
        let cache = Rc::new(ContentCache::new(config.cache_path.clone()));
        Self {
            config,
            cache,
            interrupted,
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Open the cache once (running the version guard) and release it.
    pub fn prepare_cache(&self) -> Result<()> {
        debug!(
            "Collection doc cache: 'path' is '{}'",
            self.cache.path().display()
        );
        self.cache.session().map(drop)
    }

    /// `cache check`: the stored version and entry count.
    pub fn cache_check(&self) -> Result<String> {
        let session = self.cache.session()?;
        let version = session.stored_version()?;
        Ok(format!(
            "{}: version '{}', {} entries",
            session.path().display(),
            version.as_deref().unwrap_or("None"),
            session.len()?
        ))
    }

    /// `cache clear`: delete and rebuild.
    pub fn cache_clear(&self) -> Result<String> {
        self.cache.rebuild()?;
        self.cache.close();
        Ok(format!(
            "{}: rebuilt at version '{}'",
            self.cache.path().display(),
            self.cache.expected_version()
        ))
    }

    /// Run the producer with a progress notification on screen.
    ///
    /// `Ok(None)` when the user interrupted the wait.
    pub fn collect(
        &self,
        frontend: &mut dyn Frontend,
        source: CatalogSource,
    ) -> Result<Option<Result<String>>> {
        let handle = spawn_producer(source);
        let progress = nonblocking_notification(vec![COLLECTING_MESSAGE.to_string()]);
        loop {
            frontend.notify(&progress)?;
            if let ProducerPoll::Done(result) = handle.poll() {
                return Ok(Some(result));
            }
            if frontend.poll_interrupt(self.config.refresh())?
                || self.interrupted.load(Ordering::SeqCst)
            {
                info!("Catalog collection interrupted");
                handle.cancel();
                return Ok(None);
            }
        }
    }

    /// The `collections` command.
    pub fn run_collections(
        &self,
        frontend: &mut dyn Frontend,
        source: CatalogSource,
    ) -> Result<ActionOutcome> {
        self.prepare_cache()?;
        let settings = self.config.catalog_settings();
        let source = source.with_paths(&settings.adjacent_collection_dir, self.cache.path());

        let output = match self.collect(frontend, source)? {
            None => return Ok(ActionOutcome::Exhausted),
            Some(Ok(output)) => output,
            Some(Err(e)) => {
                error!("{}", e);
                frontend.notify(&error_notification(vec![e.to_string()]))?;
                return Ok(ActionOutcome::Exhausted);
            }
        };

        let outcome = catalog::ingest(&output, &settings);
        let mut delegate = CommandDelegate::new();
        let result = collections::run(
            frontend,
            &mut delegate,
            outcome,
            &settings,
            Rc::clone(&self.cache),
        )?;
        info!("Collections browser finished: {:?}", result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cache::CACHE_VERSION;
    use crate::ui::{Interaction, Notification, Presentation};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        notes: Vec<Notification>,
    }

    impl Frontend for Recorder {
        fn show_menu(&mut self, _: &Step, _: &Presentation) -> Result<Interaction> {
            Ok(Interaction::Back)
        }
        fn show_content(&mut self, _: &Step, _: &Presentation) -> Result<Interaction> {
            Ok(Interaction::Back)
        }
        fn notify(&mut self, notification: &Notification) -> Result<()> {
            self.notes.push(notification.clone());
            Ok(())
        }
        fn poll_interrupt(&mut self, _: Duration) -> Result<bool> {
            Ok(false)
        }
    }

    fn app(dir: &TempDir) -> App {
        let config = NavConfig {
            cache_path: dir.path().join("doc.db"),
            ..NavConfig::default()
        };
        App::new(config, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_unknown_command_warns_and_stays() {
        let mut delegate = CommandDelegate::new();
        let mut frontend = Recorder::default();
        let step = Step::content("c", Vec::new(), None);
        let pushed = delegate
            .handle(&Request::Command("bogus".into()), &step, &mut frontend)
            .unwrap();
        assert!(pushed.is_none());
        assert_eq!(frontend.notes[0].title, "WARNING");
        assert_eq!(frontend.notes[0].messages[0], "Could not find a match for ':bogus'");
    }

    #[test]
    fn test_help_is_blocking() {
        let mut delegate = CommandDelegate::new();
        let mut frontend = Recorder::default();
        let step = Step::content("c", Vec::new(), None);
        delegate.handle(&Request::Help, &step, &mut frontend).unwrap();
        assert!(frontend.notes[0].blocking);
        assert_eq!(frontend.notes[0].title, "HELP");
    }

    #[test]
    fn test_cache_commands() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        assert!(app.cache_check().unwrap().contains(CACHE_VERSION));
        assert!(!app.cache().is_open());
        assert!(app.cache_clear().unwrap().contains("rebuilt"));
        assert!(!app.cache().is_open());
    }

    #[test]
    fn test_unreadable_cache_file_does_not_abort() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        std::fs::write(dir.path().join("doc.db"), "definitely not sqlite".repeat(100)).unwrap();
        app.prepare_cache().unwrap();
        assert!(!app.cache().is_open());
        assert!(app.cache_check().unwrap().contains(CACHE_VERSION));
    }

    #[test]
    fn test_missing_catalog_file_notifies_error() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let mut frontend = Recorder::default();
        let source = CatalogSource::File(dir.path().join("absent.json"));
        let outcome = app.run_collections(&mut frontend, source).unwrap();
        assert!(matches!(outcome, ActionOutcome::Exhausted));
        let last = frontend.notes.last().unwrap();
        assert_eq!(last.title, "ERROR");
    }

    #[test]
    fn test_empty_catalog_is_none_found() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir);
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"collections": {}, "errors": [], "stats": {}, "collection_scan_paths": "/a:/b"}"#,
        )
        .unwrap();
        let mut frontend = Recorder::default();
        let outcome = app
            .run_collections(&mut frontend, CatalogSource::File(path))
            .unwrap();
        assert!(matches!(outcome, ActionOutcome::NoneFound));
        assert_eq!(frontend.notes.last().unwrap().title, "WARNING");
    }
}
