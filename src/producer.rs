//! producer.rs - Runs the catalog producer in a dedicated background thread.
//!
//! The producer is either a command whose stdout is the catalog document or a
//! file holding a previously captured document. Either way the blocking work
//! happens on a worker thread and the result comes back over an `mpsc`
//! channel, so the UI thread can keep redrawing its progress notification and
//! watch for Ctrl+C.

use crate::error::{NavError, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, warn};

/// Where the catalog document comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Run `program args...` and read its stdout
    Command { program: String, args: Vec<String> },
    /// Read a captured document from disk
    File(PathBuf),
}

impl CatalogSource {
    /// Build a command source from `argv`; `None` if `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::Command {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// Tell a command producer where the adjacent collections and the doc
    /// cache live (`-a <dir> -c <cache>`). File sources are unchanged.
    pub fn with_paths(self, adjacent_collection_dir: &Path, cache_path: &Path) -> Self {
        match self {
            Self::Command { program, mut args } => {
                args.extend([
                    "-a".to_string(),
                    adjacent_collection_dir.display().to_string(),
                    "-c".to_string(),
                    cache_path.display().to_string(),
                ]);
                Self::Command { program, args }
            }
            file => file,
        }
    }
}

/// State of a running producer
#[derive(Debug)]
pub enum ProducerPoll {
    Pending,
    Done(Result<String>),
}

/// Handle to a producer running on a worker thread.
#[derive(Debug)]
pub struct ProducerHandle {
    rx: Receiver<Result<String>>,
    child: Arc<Mutex<Option<Child>>>,
}

impl ProducerHandle {
    /// Check for a result without blocking.
    pub fn poll(&self) -> ProducerPoll {
        match self.rx.try_recv() {
            Ok(result) => ProducerPoll::Done(result),
            Err(TryRecvError::Empty) => ProducerPoll::Pending,
            Err(TryRecvError::Disconnected) => ProducerPoll::Done(Err(NavError::producer(
                "catalog worker exited without a result",
            ))),
        }
    }

    /// Block until the producer finishes.
    pub fn wait(self) -> Result<String> {
        self.rx
            .recv()
            .map_err(|_| NavError::producer("catalog worker exited without a result"))?
    }

    /// Kill the producer process, if one is running.
    pub fn cancel(&self) {
        let mut guard = match self.child.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(child) = guard.as_mut() {
            match child.kill() {
                Ok(()) => debug!("Catalog producer {} killed", child.id()),
                Err(e) => debug!("Catalog producer already gone: {}", e),
            }
        }
    }
}

/// Start the producer on a worker thread.
pub fn spawn_producer(source: CatalogSource) -> ProducerHandle {
    let (tx, rx) = mpsc::channel();
    let child: Arc<Mutex<Option<Child>>> = Arc::new(Mutex::new(None));
    let worker_child = Arc::clone(&child);

    thread::spawn(move || {
        debug!("Catalog producer thread started: {:?}", source);
        let result = match source {
            CatalogSource::File(path) => std::fs::read_to_string(&path).map_err(|e| {
                NavError::producer(format!("failed to read {}: {}", path.display(), e))
            }),
            CatalogSource::Command { program, args } => run_command(&program, &args, &worker_child),
        };
        if tx.send(result).is_err() {
            debug!("Catalog result dropped, nobody is waiting");
        }
    });

    ProducerHandle { rx, child }
}

fn run_command(
    program: &str,
    args: &[String],
    slot: &Arc<Mutex<Option<Child>>>,
) -> Result<String> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| NavError::producer(format!("failed to start '{}': {}", program, e)))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    if let Ok(mut guard) = slot.lock() {
        *guard = Some(child);
    }

    let stderr_reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut buf);
        }
        buf
    });

    let mut output = String::new();
    if let Some(mut stdout) = stdout {
        stdout.read_to_string(&mut output)?;
    }
    let errors = stderr_reader.join().unwrap_or_default();

    let status = match slot.lock() {
        Ok(mut guard) => match guard.take() {
            Some(mut child) => Some(child.wait()?),
            None => None,
        },
        Err(_) => None,
    };

    if !errors.trim().is_empty() {
        error!("Error while running catalog collection script: {}", errors.trim());
    }
    match status {
        Some(status) if !status.success() => {
            warn!("Catalog producer exited with {}", status);
        }
        _ => {}
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_from_argv() {
        assert_eq!(CatalogSource::from_argv(&[]), None);
        let argv = vec!["cat".to_string(), "x.json".to_string()];
        assert_eq!(
            CatalogSource::from_argv(&argv),
            Some(CatalogSource::Command {
                program: "cat".into(),
                args: vec!["x.json".into()],
            })
        );
    }

    #[test]
    fn test_with_paths_appends_to_commands_only() {
        let source = CatalogSource::Command {
            program: "catalog".into(),
            args: vec!["--json".into()],
        }
        .with_paths(Path::new("/p/collections"), Path::new("/c/doc.db"));
        assert_eq!(
            source,
            CatalogSource::Command {
                program: "catalog".into(),
                args: vec![
                    "--json".into(),
                    "-a".into(),
                    "/p/collections".into(),
                    "-c".into(),
                    "/c/doc.db".into(),
                ],
            }
        );
        let file = CatalogSource::File(PathBuf::from("x.json"));
        assert_eq!(file.clone().with_paths(Path::new("a"), Path::new("c")), file);
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{\"collections\": {{}}}}").unwrap();
        let handle = spawn_producer(CatalogSource::File(file.path().to_path_buf()));
        assert_eq!(handle.wait().unwrap(), "{\"collections\": {}}");
    }

    #[test]
    fn test_missing_file_is_producer_error() {
        let handle = spawn_producer(CatalogSource::File(PathBuf::from("/nonexistent/x.json")));
        assert!(matches!(handle.wait(), Err(NavError::Producer(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_source() {
        let handle = spawn_producer(CatalogSource::Command {
            program: "echo".into(),
            args: vec!["{}".into()],
        });
        assert_eq!(handle.wait().unwrap().trim(), "{}");
    }
}
