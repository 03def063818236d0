//! Content projection
//!
//! A content step shows one record as YAML under an optional heading. Hidden
//! fields are left out unless the user toggled them on; the presentation's key
//! filter can drop further visible keys.

use crate::engine::steps::Step;
use crate::error::Result;
use crate::record::Record;
use crate::ui::{Heading, Presentation};
use serde_json::{Map, Value};

/// A content view ready to draw
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentView {
    pub heading: Option<Heading>,
    pub lines: Vec<String>,
}

/// The fields of `record` that should be displayed.
pub fn displayed_fields(
    record: &Record,
    presentation: &Presentation,
    show_hidden: bool,
) -> Map<String, Value> {
    let source = if show_hidden {
        record.all_fields()
    } else {
        record.visible_fields().clone()
    };
    source
        .into_iter()
        .filter(|(key, _)| !record.visible_fields().contains_key(key) || presentation.keeps_key(key))
        .collect()
}

/// Serialize a field map as YAML lines.
pub fn to_yaml_lines(fields: &Map<String, Value>) -> Result<Vec<String>> {
    if fields.is_empty() {
        return Ok(vec!["{}".to_string()]);
    }
    let yaml = serde_yaml::to_string(fields)?;
    Ok(yaml
        .strip_prefix("---\n")
        .unwrap_or(&yaml)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Build the view for the record under the step's cursor.
pub fn build_content(
    step: &Step,
    presentation: &Presentation,
    width: u16,
    show_hidden: bool,
) -> Result<ContentView> {
    let Some(record) = step.selected() else {
        return Ok(ContentView::default());
    };
    let fields = displayed_fields(record, presentation, show_hidden);
    Ok(ContentView {
        heading: presentation.heading_for(record, width),
        lines: to_yaml_lines(&fields)?,
    })
}

/// Next or previous sibling among `indices`, wrapping around.
///
/// `indices` are the rows visible under the menu filter; when `current` is not
/// one of them the nearest one in the paging direction is chosen.
pub fn page(indices: &[usize], current: usize, forward: bool) -> Option<usize> {
    let after = indices.iter().copied().filter(|&i| i > current);
    let before = indices.iter().copied().filter(|&i| i < current);
    if forward {
        after.chain(before).next()
    } else {
        let mut ordered: Vec<usize> = before.collect();
        ordered.reverse();
        let mut wrapped: Vec<usize> = after.collect();
        wrapped.reverse();
        ordered.into_iter().chain(wrapped).next()
    }
}

/// Direct jump to page `n`, wrapping modulo the record count.
pub fn goto(n: usize, len: usize) -> Option<usize> {
    (len > 0).then(|| n % len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> Record {
        Record::new()
            .with("name", "ping")
            .with("added", "historical")
            .with("secret", "s3cr3t")
            .with_hidden("deprecated", false)
    }

    #[test]
    fn test_hidden_fields_are_not_displayed_by_default() {
        let fields = displayed_fields(&record(), &Presentation::new(), false);
        assert!(fields.contains_key("name"));
        assert!(!fields.contains_key("deprecated"));
        assert!(!fields.contains_key("__deprecated"));
    }

    #[test]
    fn test_hidden_toggle_shows_prefixed_fields() {
        let fields = displayed_fields(&record(), &Presentation::new(), true);
        assert_eq!(fields.get("__deprecated"), Some(&json!(false)));
    }

    #[test]
    fn test_key_filter_drops_visible_keys() {
        let presentation = Presentation::new().with_key_filter(|k| k != "secret");
        let fields = displayed_fields(&record(), &presentation, false);
        assert!(!fields.contains_key("secret"));
        assert!(fields.contains_key("name"));
    }

    #[test]
    fn test_yaml_lines_keep_field_order() {
        let fields = displayed_fields(&record(), &Presentation::new(), false);
        let lines = to_yaml_lines(&fields).unwrap();
        assert_eq!(lines[0], "name: ping");
        assert_eq!(lines[1], "added: historical");
    }

    #[test]
    fn test_page_wraps_within_indices() {
        let indices = [0, 2, 4];
        assert_eq!(page(&indices, 2, true), Some(4));
        assert_eq!(page(&indices, 4, true), Some(0));
        assert_eq!(page(&indices, 0, false), Some(4));
        assert_eq!(page(&indices, 3, false), Some(2));
        assert_eq!(page(&[1], 1, true), None);
    }

    #[test]
    fn test_goto_wraps() {
        assert_eq!(goto(7, 3), Some(1));
        assert_eq!(goto(0, 0), None);
    }
}
