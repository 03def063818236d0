//! Menu projection
//!
//! Turns a menu step into a table of clipped, styled cells. Pure: no terminal
//! access, so layout is testable without a backend.
//!
//! Column widths: each column's natural width is its widest rendered value
//! (header included). When the natural widths do not fit, the available width
//! is shared out smallest-first: narrow columns keep their natural width and
//! the wide ones split what is left. Overflow is truncated with `…`. Rows are
//! never dropped.

use crate::engine::steps::Step;
use crate::theme::{CellStyle, UiConstants};
use crate::ui::Presentation;
use regex::Regex;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: char = '\u{2026}';

/// One styled, already clipped cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCell {
    pub text: String,
    pub style: CellStyle,
}

/// One menu row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRow {
    /// Index into the step's records
    pub record_index: usize,
    /// Line number shown in the prefix (position among the filtered rows)
    pub line_number: usize,
    pub cells: Vec<MenuCell>,
}

/// A fully laid-out menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuTable {
    pub header: Vec<String>,
    pub widths: Vec<usize>,
    pub prefix_width: usize,
    pub rows: Vec<MenuRow>,
}

impl MenuTable {
    /// Line-number prefix for a row, right-aligned and followed by `│`
    pub fn prefix(&self, line_number: usize) -> String {
        format!(
            "{:>width$}{}",
            line_number,
            UiConstants::PREFIX_SEPARATOR,
            width = self.prefix_width
        )
    }

    /// Blank prefix of the same width, for the header line
    pub fn blank_prefix(&self) -> String {
        " ".repeat(self.prefix_width + 1)
    }

    /// Header and rows as plain text lines
    pub fn plain_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        let header: Vec<&str> = self.header.iter().map(String::as_str).collect();
        lines.push(format!("{}{}", self.blank_prefix(), self.join(&header)));
        for row in &self.rows {
            let cells: Vec<&str> = row.cells.iter().map(|c| c.text.as_str()).collect();
            lines.push(format!("{}{}", self.prefix(row.line_number), self.join(&cells)));
        }
        lines
    }

    fn join(&self, cells: &[&str]) -> String {
        let gap = " ".repeat(UiConstants::COLUMN_GAP);
        let mut out = String::new();
        for (idx, (text, width)) in cells.iter().zip(&self.widths).enumerate() {
            if idx > 0 {
                out.push_str(&gap);
            }
            out.push_str(&pad(text, *width));
        }
        out.trim_end().to_string()
    }
}

/// Indices of records whose visible column values match `filter`.
///
/// No filter keeps every row.
pub fn filter_indices(step: &Step, filter: Option<&Regex>) -> Vec<usize> {
    let Some(regex) = filter else {
        return (0..step.records().len()).collect();
    };
    step.records()
        .iter()
        .enumerate()
        .filter(|(_, record)| {
            step.columns()
                .iter()
                .any(|column| regex.is_match(&record.display_value(column)))
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Width of the line-number prefix for `count` rows (excluding the separator).
pub fn prefix_width(count: usize) -> usize {
    count.saturating_sub(1).to_string().len()
}

/// Share `available` columns of space between columns of the given natural widths.
pub fn allocate_widths(natural: &[usize], available: usize, gap: usize) -> Vec<usize> {
    let count = natural.len();
    if count == 0 {
        return Vec::new();
    }
    let mut budget = available.saturating_sub(gap * (count - 1));
    if natural.iter().sum::<usize>() <= budget {
        return natural.to_vec();
    }

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by_key(|&idx| natural[idx]);

    let mut widths = vec![0; count];
    let mut left = count;
    for idx in order {
        let share = budget / left;
        let width = natural[idx].min(share);
        widths[idx] = width;
        budget -= width;
        left -= 1;
    }
    widths
}

/// Truncate `text` to at most `width` display columns, marking the cut with `…`.
pub fn clip(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push(ELLIPSIS);
    out
}

/// Right-pad `text` with spaces to `width` display columns.
pub fn pad(text: &str, width: usize) -> String {
    let w = text.width();
    if w >= width {
        text.to_string()
    } else {
        format!("{text}{}", " ".repeat(width - w))
    }
}

/// Lay out the rows at `indices` for a terminal `width` columns wide.
///
/// Widths are computed over every row in `indices` so columns stay put while
/// scrolling; callers pass the full filtered set and slice `rows` afterwards.
pub fn build_menu(
    step: &Step,
    indices: &[usize],
    width: u16,
    presentation: &Presentation,
) -> MenuTable {
    let columns = step.columns();
    let prefix_width = prefix_width(indices.len());
    // prefix, separator, scrollbar
    let available = usize::from(width).saturating_sub(prefix_width + 2);

    let values: Vec<Vec<String>> = indices
        .iter()
        .map(|&idx| {
            let record = &step.records()[idx];
            columns.iter().map(|c| record.display_value(c)).collect()
        })
        .collect();

    let natural: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(col, name)| {
            values
                .iter()
                .map(|row| row[col].width())
                .chain(std::iter::once(name.width()))
                .max()
                .unwrap_or(0)
        })
        .collect();
    let widths = allocate_widths(&natural, available, UiConstants::COLUMN_GAP);

    let header = columns
        .iter()
        .zip(&widths)
        .map(|(name, w)| clip(&name.to_uppercase(), *w))
        .collect();

    let rows = indices
        .iter()
        .zip(values)
        .enumerate()
        .map(|(line_number, (&record_index, row_values))| {
            let record = &step.records()[record_index];
            let cells = row_values
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (value, w))| MenuCell {
                    text: clip(value, *w),
                    style: presentation.cell_style(col, &columns[col], record),
                })
                .collect();
            MenuRow {
                record_index,
                line_number,
                cells,
            }
        })
        .collect();

    MenuTable {
        header,
        widths,
        prefix_width,
        rows,
    }
}
