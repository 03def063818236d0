//! Collections browser
//!
//! Three levels:
//!
//! 1. `all_collections`: one row per catalogued collection
//! 2. `all_plugins`: the plugins of the selected collection, documents read
//!    from the content cache by checksum
//! 3. `plugin_content`: one plugin's documentation, pageable across siblings

use crate::actions::ActionOutcome;
use crate::catalog::{self, Catalog, CatalogOutcome, CatalogSettings, Collection, PluginRef};
use crate::engine::cache::ContentCache;
use crate::engine::navigator::{Delegate, NavOutcome, Navigator};
use crate::engine::steps::Step;
use crate::error::{NavError, Result};
use crate::record::Record;
use crate::theme::{CellStyle, Colors, Decoration};
use crate::ui::menu::pad;
use crate::ui::notification::warning_notification;
use crate::ui::{Frontend, Heading, Presentation};
use serde_json::{Map, Value};
use std::rc::Rc;
use tracing::{debug, error};

/// Columns of the plugin menu
pub const PLUGIN_COLUMNS: [&str; 5] = ["name", "type", "added", "deprecated", "description"];

/// Color for one collection or plugin menu cell.
pub fn color_menu(_column_index: usize, _column: &str, record: &Record) -> CellStyle {
    if record.flag("shadowed") {
        CellStyle::plain(Colors::MUTED)
    } else if record.flag("deprecated") {
        CellStyle::plain(Colors::ALERT)
    } else {
        CellStyle::plain(Colors::DEFAULT)
    }
}

/// `FULL.NAME: description`, padded to the terminal width and underlined.
pub fn content_heading(record: &Record, width: u16) -> Option<Heading> {
    let full_name = record.text("full_name")?;
    let description = record.display_value("description");
    let text = format!("{}: {}", full_name.to_uppercase(), description);
    Some(Heading {
        text: pad(&text, usize::from(width)),
        style: CellStyle::new(Colors::DEFAULT, Decoration::Underline),
    })
}

/// Content views skip the derived menu columns; the raw document already
/// carries the same information.
pub fn content_key_filter(key: &str) -> bool {
    !PLUGIN_COLUMNS.contains(&key)
}

/// How every step of this action is drawn
pub fn presentation() -> Presentation {
    Presentation::new()
        .with_colorizer(color_menu)
        .with_heading(content_heading)
        .with_key_filter(content_key_filter)
}

/// The root menu of collections.
pub fn build_main_menu(
    catalog: &Catalog,
    settings: &CatalogSettings,
    cache: Rc<ContentCache>,
) -> Result<Step> {
    let collections = Rc::new(catalog.collections.clone());
    let step = Step::menu(
        "all_collections",
        catalog.records(settings),
        Catalog::columns(settings),
    )?;
    Ok(step.with_on_select(move |step| {
        let Some(collection) = step.selected_index().and_then(|idx| collections.get(idx)) else {
            return Ok(None);
        };
        build_plugin_menu(collection, &cache).map(Some)
    }))
}

/// The plugin menu for one collection.
///
/// Missing or unreadable cache entries are logged and skipped; a cache that
/// cannot be opened gives an empty menu.
pub fn build_plugin_menu(collection: &Collection, cache: &ContentCache) -> Result<Step> {
    let records = match cache.session() {
        Ok(session) => plugin_records(collection, &session),
        Err(e) if e.is_contract_violation() => return Err(e),
        Err(e) => {
            error!("Unable to open the collection doc cache: {}", e);
            Vec::new()
        }
    };
    let columns = PLUGIN_COLUMNS.iter().map(|c| c.to_string()).collect();
    Ok(Step::menu("all_plugins", records, columns)?.with_on_select(|step| {
        Ok(Some(build_plugin_content(step)))
    }))
}

/// Resolve and sort every plugin of a collection.
pub fn plugin_records(collection: &Collection, cache: &ContentCache) -> Vec<Record> {
    let mut plugins: Vec<Record> = Vec::new();
    for (checksum, plugin_ref) in &collection.plugin_checksums {
        let resolved = cache
            .get(checksum)
            .and_then(|blob| plugin_record(collection, plugin_ref, &blob));
        match resolved {
            Ok(Some(record)) => plugins.push(record),
            Ok(None) => debug!("Skipping {} plugin without documentation", plugin_ref.plugin_type),
            Err(e) => {
                error!("error loading plugin doc {:?}", plugin_ref);
                debug!("error was {}", e);
            }
        }
    }
    plugins.sort_by(|a, b| a.display_value("name").cmp(&b.display_value("name")));
    plugins
}

/// Build one plugin record from its cached document.
///
/// `Ok(None)` when the document has no `doc` (nothing to show).
pub fn plugin_record(
    collection: &Collection,
    plugin_ref: &PluginRef,
    blob: &str,
) -> Result<Option<Record>> {
    let loaded: Value = serde_json::from_str(blob)?;
    let plugin = loaded
        .get("plugin")
        .and_then(Value::as_object)
        .ok_or_else(|| NavError::payload("document has no 'plugin' mapping"))?;
    let doc = match plugin.get("doc") {
        None => return Err(NavError::payload("plugin has no 'doc'")),
        Some(Value::Null) => return Ok(None),
        Some(doc) => doc,
    };
    let plugin_type = plugin_ref.plugin_type.as_str();
    let short_name = doc
        .get("name")
        .or_else(|| doc.get(plugin_type))
        .and_then(Value::as_str)
        .ok_or_else(|| NavError::payload(format!("doc has neither 'name' nor '{plugin_type}'")))?;
    let description = doc
        .get("short_description")
        .cloned()
        .ok_or_else(|| NavError::payload("doc has no 'short_description'"))?;

    let runtime_section = if plugin_type == "module" {
        "modules"
    } else {
        plugin_type
    };
    let routing = collection.routing(runtime_section, short_name).cloned();
    let deprecated = routing
        .as_ref()
        .is_some_and(|info| info.get("deprecation").is_some());

    let mut collection_info = collection.collection_info.clone();
    collection_info.insert("name".into(), collection.known_as.clone().into());
    collection_info.insert("shadowed_by".into(), collection.hidden_by.clone().into());
    collection_info.insert("path".into(), collection.path.clone().into());

    let mut record = Record::from_wire_map(plugin.clone());
    record.set("name", short_name);
    record.set("type", plugin_type);
    record.set("added", doc.get("version_added").cloned().unwrap_or(Value::Null));
    record.set("deprecated", deprecated);
    record.set("description", description);
    record.set("full_name", format!("{}.{}", collection.known_as, short_name));
    record.set("collection_info", Value::Object(collection_info));
    record.set(
        "additional_information",
        routing.unwrap_or_else(|| Value::Object(Map::new())),
    );
    record.set_hidden("deprecated", deprecated);
    Ok(Some(record))
}

/// Content view over the plugin menu's records, opened at its cursor.
pub fn build_plugin_content(menu: &Step) -> Step {
    Step::content("plugin_content", menu.records().to_vec(), menu.cursor())
}

/// Browse an ingested catalog.
pub fn run(
    frontend: &mut dyn Frontend,
    delegate: &mut dyn Delegate,
    outcome: CatalogOutcome,
    settings: &CatalogSettings,
    cache: Rc<ContentCache>,
) -> Result<ActionOutcome> {
    let catalog = match outcome {
        CatalogOutcome::Found(catalog) => catalog,
        CatalogOutcome::NoneFound { scan_paths } => {
            let messages = catalog::none_found_messages(&scan_paths, settings);
            frontend.notify(&warning_notification(messages))?;
            return Ok(ActionOutcome::NoneFound);
        }
    };

    let root = build_main_menu(&catalog, settings, Rc::clone(&cache))?;
    let navigator = Navigator::new(root, presentation());
    let result = navigator.run(frontend, delegate);
    cache.close();

    Ok(match result? {
        NavOutcome::Exhausted => ActionOutcome::Exhausted,
        NavOutcome::Quit(step) => ActionOutcome::Quit(step),
    })
}
