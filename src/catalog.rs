//! Catalog payload ingestion
//!
//! The external cataloging process prints one JSON document describing every
//! collection it found. This module turns that text into sorted
//! [`Collection`]s plus display records, and never lets a parse failure reach
//! the navigation loop: a malformed payload is logged and reported as "none
//! found".

use crate::error::{NavError, Result};
use crate::record::Record;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Version shown for a collection whose `collection_info` has none
pub const MISSING_VERSION: &str = "missing";

/// One catalogued plugin reference inside a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    #[serde(rename = "type")]
    pub plugin_type: String,
}

/// One catalogued collection as produced by the catalog process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub known_as: String,
    #[serde(default)]
    pub collection_info: Map<String, Value>,
    #[serde(default)]
    pub hidden_by: Vec<String>,
    pub path: String,
    #[serde(default)]
    pub plugin_checksums: BTreeMap<String, PluginRef>,
    #[serde(default)]
    pub runtime: Value,
    /// Everything else the producer sent, kept for display
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Collection {
    /// `collection_info.version`, or [`MISSING_VERSION`]
    pub fn version(&self) -> String {
        match self.collection_info.get("version") {
            Some(Value::String(v)) => v.clone(),
            Some(Value::Null) | None => MISSING_VERSION.to_string(),
            Some(other) => other.to_string(),
        }
    }

    pub fn is_shadowed(&self) -> bool {
        !self.hidden_by.is_empty()
    }

    /// Runtime routing entry for a plugin, if any
    pub fn routing(&self, section: &str, short_name: &str) -> Option<&Value> {
        self.runtime
            .get("plugin_routing")
            .and_then(|routing| routing.get(section))
            .and_then(|section| section.get(short_name))
    }
}

/// One error reported by the catalog process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogError {
    pub path: String,
    pub error: String,
}

/// The raw catalog document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogPayload {
    pub collections: BTreeMap<String, Collection>,
    #[serde(default)]
    pub errors: Vec<CatalogError>,
    #[serde(default)]
    pub stats: Map<String, Value>,
    pub collection_scan_paths: String,
    #[serde(default)]
    pub messages: Vec<String>,
}

/// Where a collection lives relative to an execution environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MountType {
    BindMount,
    Contained,
}

/// Settings that shape how a payload is interpreted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogSettings {
    pub execution_environment: bool,
    pub adjacent_collection_dir: PathBuf,
    pub share_directory: Option<PathBuf>,
}

impl CatalogSettings {
    /// Classify a collection path. Paths beside (not inside) the adjacent
    /// collections directory are bind-mounted too, but that is logged.
    pub fn mount_type(&self, known_as: &str, path: &str) -> MountType {
        let path = Path::new(path);
        if path.starts_with(&self.adjacent_collection_dir) {
            return MountType::BindMount;
        }
        match self.adjacent_collection_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && path.starts_with(parent) => {
                error!(
                    "{} was mounted and catalogued in the execution environment but was outside \
                     the adjacent 'collections' directory. This may cause issues outside the local \
                     development environment.",
                    known_as
                );
                MountType::BindMount
            }
            _ => MountType::Contained,
        }
    }
}

/// A successfully ingested catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    /// Sorted by `known_as`
    pub collections: Vec<Collection>,
    pub scan_paths: Vec<String>,
    pub stats: Map<String, Value>,
}

impl Catalog {
    /// Display records for the collection menu, same order as `collections`.
    pub fn records(&self, settings: &CatalogSettings) -> Vec<Record> {
        self.collections
            .iter()
            .map(|c| collection_record(c, settings))
            .collect()
    }

    /// Menu columns for the collection menu
    pub fn columns(settings: &CatalogSettings) -> Vec<String> {
        let mut columns = vec!["name", "version", "shadowed"];
        if settings.execution_environment {
            columns.push("type");
        }
        columns.push("path");
        columns.into_iter().map(String::from).collect()
    }
}

/// Result of ingesting producer output
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOutcome {
    Found(Catalog),
    /// No collections; the scan paths explain where we looked
    NoneFound { scan_paths: Vec<String> },
}

/// Drop anything printed before the JSON document.
pub fn extract_json(output: &str) -> Option<&str> {
    output.find('{').map(|start| &output[start..])
}

/// Parse producer output into a payload.
///
/// # Errors
///
/// [`NavError::Payload`] if no JSON object is present or it lacks required keys.
pub fn parse(output: &str) -> Result<CatalogPayload> {
    let json = extract_json(output)
        .ok_or_else(|| NavError::payload("no JSON document in catalog output"))?;
    if json.len() != output.len() {
        debug!("Discarded {} byte(s) before catalog JSON", output.len() - json.len());
    }
    serde_json::from_str(json).map_err(|e| NavError::payload(e.to_string()))
}

/// Parse, log and sort producer output. Never fails: malformed output is
/// logged and reported as none found.
pub fn ingest(output: &str, settings: &CatalogSettings) -> CatalogOutcome {
    let payload = match parse(output) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Unable to extract collection json from stdout");
            debug!("error json loading output: '{}'", e);
            debug!("{}", output);
            return CatalogOutcome::NoneFound {
                scan_paths: Vec::new(),
            };
        }
    };
    debug!("json loading output succeeded");

    for err in &payload.errors {
        error!("{} {}", err.path, err.error);
    }
    for message in &payload.messages {
        info!("[catalog]: {}", message);
    }
    debug!("catalog collections scan path: {}", payload.collection_scan_paths);
    for (stat, value) in &payload.stats {
        debug!("{}: {}", stat, value);
    }

    let scan_paths: Vec<String> = payload
        .collection_scan_paths
        .split(':')
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    if payload.collections.is_empty() {
        let env = if settings.execution_environment {
            "execution"
        } else {
            "local"
        };
        warn!(
            "No collections found in {} environment, searched in {}",
            env, payload.collection_scan_paths
        );
        return CatalogOutcome::NoneFound { scan_paths };
    }

    let mut collections: Vec<Collection> = payload.collections.into_values().collect();
    collections.sort_by(|a, b| a.known_as.cmp(&b.known_as));

    CatalogOutcome::Found(Catalog {
        collections,
        scan_paths,
        stats: payload.stats,
    })
}

/// The collection as a record, with derived display fields.
pub fn collection_record(collection: &Collection, settings: &CatalogSettings) -> Record {
    let raw = match serde_json::to_value(collection) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    let mut record = Record::from_wire_map(raw);
    record.set("name", collection.known_as.clone());
    record.set("version", collection.version());
    record.set("shadowed", collection.is_shadowed());
    record.set_hidden("shadowed", collection.is_shadowed());
    if settings.execution_environment {
        let mount = settings.mount_type(&collection.known_as, &collection.path);
        record.set("type", mount.to_string());
    }
    record
}

/// Lines of the "no collections found" warning.
pub fn none_found_messages(scan_paths: &[String], settings: &CatalogSettings) -> Vec<String> {
    let mut messages = vec!["humph. no collections were found in the following paths:".to_string()];
    for path in scan_paths {
        let shared = settings
            .share_directory
            .as_ref()
            .is_some_and(|share| Path::new(path).starts_with(share));
        if shared {
            continue;
        }
        if settings.execution_environment {
            let mount = if Path::new(path).starts_with(&settings.adjacent_collection_dir) {
                MountType::BindMount
            } else {
                MountType::Contained
            };
            messages.push(format!("- {path} ({mount})"));
        } else {
            messages.push(format!("- {path}"));
        }
    }
    messages.push("[HINT] Try installing some or try a different execution environment".to_string());
    messages
}
