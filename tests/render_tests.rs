//! Tests for the pure rendering projections
//!
//! These tests verify:
//! - Overlong cells are clipped to the terminal width without panicking
//! - Neighbouring cells and rows keep their text
//! - Content views hide hidden fields until toggled
//! - Content lines are syntax colored unless color is unavailable
//! - Palettes degrade to plain styles when color is unavailable

use collnav::actions::collections;
use collnav::theme::{CellStyle, Decoration, Palette};
use collnav::ui::content::build_content;
use collnav::ui::highlight::highlight_yaml;
use collnav::ui::menu::{build_menu, filter_indices};
use collnav::ui::notification::{help_notification, warning_notification};
use collnav::ui::keybindings::{KeybindingContext, View};
use collnav::{Presentation, Record, Step};
use ratatui::style::{Color, Modifier};
use unicode_width::UnicodeWidthStr;

fn plugin_menu() -> Step {
    let records = vec![
        Record::new()
            .with("name", "ping")
            .with("description", "Try to connect to host")
            .with_hidden("deprecated", false),
        Record::new()
            .with("name", "uri")
            .with("description", "Interacts with webservices ".repeat(40))
            .with_hidden("deprecated", true),
        Record::new()
            .with("name", "copy")
            .with("description", "Copy files")
            .with_hidden("deprecated", false),
    ];
    Step::menu("plugins", records, vec!["name".into(), "description".into()]).unwrap()
}

// =============================================================================
// Menu clipping
// =============================================================================

#[test]
fn test_overlong_cell_is_clipped_to_width() {
    let step = plugin_menu();
    let indices = filter_indices(&step, None);
    let table = build_menu(&step, &indices, 60, &Presentation::new());

    for line in table.plain_lines() {
        assert!(line.width() <= 60, "line too wide: {line:?}");
    }
    let long = &table.rows[1].cells[1].text;
    assert!(long.ends_with('\u{2026}'));
    assert_eq!(table.rows[1].cells[0].text, "uri");
    assert_eq!(table.rows[0].cells[1].text, "Try to connect to host");
    assert_eq!(table.rows[2].cells[1].text, "Copy files");
}

#[test]
fn test_tiny_terminal_does_not_panic() {
    let step = plugin_menu();
    let indices = filter_indices(&step, None);
    for width in 0..12 {
        let table = build_menu(&step, &indices, width, &Presentation::new());
        assert_eq!(table.rows.len(), 3);
    }
}

#[test]
fn test_colorizer_styles_cells() {
    let step = plugin_menu();
    let indices = filter_indices(&step, None);
    let table = build_menu(&step, &indices, 120, &collections::presentation());
    assert_eq!(table.rows[0].cells[0].style.color, 2);
    assert_eq!(table.rows[1].cells[0].style.color, 9);
    assert_eq!(table.header, ["NAME", "DESCRIPTION"]);
}

// =============================================================================
// Content views
// =============================================================================

#[test]
fn test_content_hides_hidden_fields_until_toggled() {
    let step = Step::content(
        "plugin_content",
        vec![Record::new()
            .with("full_name", "acme.net.ping")
            .with("description", "Try to connect")
            .with("doc", serde_json::json!({"options": {"data": {"default": "pong"}}}))
            .with_hidden("deprecated", false)],
        Some(0),
    );
    let presentation = collections::presentation();

    let view = build_content(&step, &presentation, 80, false).unwrap();
    assert!(view.heading.unwrap().text.starts_with("ACME.NET.PING: Try to connect"));
    assert!(view.lines.iter().any(|l| l == "doc:"));
    assert!(view.lines.iter().any(|l| l.contains("default: pong")));
    assert!(!view.lines.iter().any(|l| l.contains("deprecated")));
    // menu-only columns are filtered from the document
    assert!(!view.lines.iter().any(|l| l.starts_with("description:")));

    let view = build_content(&step, &presentation, 80, true).unwrap();
    assert!(view.lines.iter().any(|l| l.starts_with("__deprecated:")));
}

#[test]
fn test_content_lines_are_syntax_colored() {
    let step = Step::content(
        "plugin_content",
        vec![Record::new().with("full_name", "acme.net.ping").with("added", "historical")],
        Some(0),
    );
    let view = build_content(&step, &Presentation::new(), 80, false).unwrap();
    let colored = highlight_yaml(&view.lines, &Palette::new(256));
    let spans = &colored[1].spans;
    let key = spans.iter().find(|s| s.content.contains("added")).unwrap();
    let value = spans.iter().find(|s| s.content.contains("historical")).unwrap();
    assert_ne!(key.style.fg, value.style.fg);

    let plain = highlight_yaml(&view.lines, &Palette::disabled());
    assert!(plain[1].spans.iter().all(|s| s.style.fg.is_none()));
}

#[test]
fn test_content_without_cursor_is_empty() {
    let step = Step::content("c", vec![Record::new().with("a", 1)], None);
    let view = build_content(&step, &Presentation::new(), 80, false).unwrap();
    assert!(view.heading.is_none());
    assert!(view.lines.is_empty());
}

// =============================================================================
// Palette and notifications
// =============================================================================

#[test]
fn test_disabled_palette_keeps_decoration_only() {
    let palette = Palette::disabled();
    let style = palette.style(CellStyle::new(9, Decoration::Underline));
    assert_eq!(style.fg, None);
    assert!(style.add_modifier.contains(Modifier::UNDERLINED));
}

#[test]
fn test_palette_wraps_color_ids() {
    let palette = Palette::new(8);
    assert_eq!(palette.resolve(9), Some(Color::Indexed(1)));
    assert_eq!(palette.resolve(2), Some(Color::Indexed(2)));
}

#[test]
fn test_notification_fits_screen() {
    let note = warning_notification(vec!["word ".repeat(200)]);
    let (width, height) = note.box_size(40, 10, 80);
    assert!(width <= 40);
    assert!(height <= 10);
}

#[test]
fn test_help_lists_every_view_key() {
    let keys = KeybindingContext::new();
    let note = help_notification(&keys.get_help_content(View::Content));
    assert!(note.blocking);
    for key in ["+", "-", "_", "esc", ":f <regex>"] {
        assert!(
            note.messages.iter().any(|m| m.trim_start().starts_with(key)),
            "missing {key}"
        );
    }
}
