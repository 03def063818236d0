//! YAML syntax coloring for content views.
//!
//! Lines are highlighted as one document so multi-line scalars keep their
//! scope. A disabled palette, or a highlighter failure part way through,
//! leaves the remaining lines plain.

use crate::theme::Palette;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::sync::LazyLock;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::SyntaxSet;
use tracing::debug;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

fn plain(lines: &[String]) -> Vec<Line<'static>> {
    lines.iter().map(|line| Line::raw(line.clone())).collect()
}

/// Style YAML lines by syntax scope.
pub fn highlight_yaml(lines: &[String], palette: &Palette) -> Vec<Line<'static>> {
    if !palette.is_enabled() {
        return plain(lines);
    }
    let (Some(syntax), Some(theme)) = (
        SYNTAX_SET.find_syntax_by_extension("yaml"),
        THEME_SET.themes.get(THEME),
    ) else {
        debug!("No YAML highlighting available, content rendered without color");
        return plain(lines);
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    let mut out = Vec::with_capacity(lines.len());
    for (idx, line) in lines.iter().enumerate() {
        let source = format!("{line}\n");
        let ranges = match highlighter.highlight_line(&source, &SYNTAX_SET) {
            Ok(ranges) => ranges,
            Err(e) => {
                debug!("YAML highlighting stopped at line {}: {}", idx, e);
                out.extend(plain(&lines[idx..]));
                return out;
            }
        };
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .filter_map(|(scope_style, fragment)| {
                let text = fragment.trim_end_matches('\n');
                if text.is_empty() {
                    return None;
                }
                let fg = scope_style.foreground;
                let mut style = Style::default();
                if let Some(color) = palette.rgb(fg.r, fg.g, fg.b) {
                    style = style.fg(color);
                }
                if scope_style.font_style.contains(FontStyle::BOLD) {
                    style = style.add_modifier(Modifier::BOLD);
                }
                Some(Span::styled(text.to_string(), style))
            })
            .collect();
        out.push(Line::from(spans));
    }
    out
}
