//! Document Assembler
//!
//! Lays a [`Report`] out as pages of styled blocks. Each appliance entry starts
//! on its own page; page 1 also carries the shared header table. Blocks that
//! do not fit spill onto a new page with the title band repeated. Row colors
//! are decided here, so the rendering sink never infers them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clearance::Classification;
use crate::snapshot::{Attribute, Entry, EntryRow, Report};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Nothing to export: the report has no appliance entries")]
    NothingToExport,
}

pub type Rgb = [u8; 3];

pub const PASS_FILL: Rgb = [212, 237, 218];
pub const FAIL_FILL: Rgb = [248, 215, 218];
pub const CAUTION_FILL: Rgb = [255, 243, 205];
pub const HEADER_HIGHLIGHT: Rgb = [235, 245, 255];

/// Page geometry in points (A4 by default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LayoutConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f64,
    #[serde(default = "default_page_height")]
    pub page_height: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_title_band")]
    pub title_band_height: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default = "default_row_height")]
    pub row_height: f64,
    #[serde(default = "default_gap")]
    pub block_gap: f64,
    /// Average glyph width used to wrap text.
    #[serde(default = "default_char_width")]
    pub char_width: f64,
    /// Render each entry's notes under its tables.
    #[serde(default = "default_true")]
    pub inline_notes: bool,
}

fn default_page_width() -> f64 { 595.0 }
fn default_page_height() -> f64 { 842.0 }
fn default_margin() -> f64 { 40.0 }
fn default_title_band() -> f64 { 64.0 }
fn default_line_height() -> f64 { 12.0 }
fn default_row_height() -> f64 { 18.0 }
fn default_gap() -> f64 { 12.0 }
fn default_char_width() -> f64 { 5.0 }
fn default_true() -> bool { true }

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin: default_margin(),
            title_band_height: default_title_band(),
            line_height: default_line_height(),
            row_height: default_row_height(),
            block_gap: default_gap(),
            char_width: default_char_width(),
            inline_notes: true,
        }
    }
}

impl LayoutConfig {
    fn wrap_width(&self) -> usize {
        let usable = self.page_width - self.margin * 2.0;
        ((usable / self.char_width).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportStyle {
    #[serde(default = "default_title")]
    pub title: String,
    /// Header rows whose label contains this term get [`HEADER_HIGHLIGHT`].
    #[serde(default = "default_marker")]
    pub header_marker: String,
}

fn default_title() -> String { "WOOD APP FORM".to_string() }
fn default_marker() -> String { "floor pad".to_string() }

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            title: default_title(),
            header_marker: default_marker(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub label: String,
    pub required: String,
    pub actual: String,
    pub shielded_display: String,
    pub row_class: Classification,
    pub is_header: bool,
    pub fill: Option<Rgb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    TitleBand { title: String },
    HeaderTable { policy: String, survey_date: String, completed_by: String },
    Heading { text: String },
    KeyValueTable { rows: Vec<Attribute> },
    ClearanceTable { columns: Vec<String>, rows: Vec<TableRow>, continued: bool },
    Paragraph { lines: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: usize,
    /// Appliance number this page belongs to; `None` for the notes fallback page.
    pub entry: Option<usize>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
    /// Set when notes were collected onto a final page.
    pub notes_fallback: bool,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text line of every paragraph, in page order.
    pub fn paragraph_text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter_map(|b| match b {
                Block::Paragraph { lines } => Some(lines.join("\n")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct Assembler {
    layout: LayoutConfig,
    style: ReportStyle,
}

impl Assembler {
    pub fn new(layout: LayoutConfig, style: ReportStyle) -> Self {
        Self { layout, style }
    }

    pub fn assemble(&self, report: &Report) -> Result<Document, DocumentError> {
        if report.entries.is_empty() {
            return Err(DocumentError::NothingToExport);
        }

        let mut writer = PageWriter::new(&self.layout, &self.style.title);
        let mut notes_rendered = false;

        for (i, entry) in report.entries.iter().enumerate() {
            writer.start_page(Some(entry.number));
            if i == 0 {
                writer.push(
                    Block::HeaderTable {
                        policy: report.header.policy.clone(),
                        survey_date: report.header.survey_date.to_string(),
                        completed_by: report.header.completed_by.clone(),
                    },
                    self.layout.row_height * 2.0,
                );
            }
            notes_rendered |= self.write_entry(&mut writer, entry);
        }

        let all_notes = report.all_notes();
        let notes_fallback = !notes_rendered && !all_notes.is_empty();
        if notes_fallback {
            tracing::warn!(
                entries = all_notes.len(),
                "no notes rendered inline, adding notes page"
            );
            writer.start_page(None);
            writer.heading("Notes");
            let lines = all_notes
                .iter()
                .flat_map(|(n, text)| {
                    wrap_text(&format!("Appliance {}: {}", n, text), self.layout.wrap_width())
                })
                .collect();
            writer.paragraph(lines);
        }

        Ok(Document {
            title: self.style.title.clone(),
            pages: writer.finish(),
            notes_fallback,
        })
    }

    /// Lay out one entry. Returns whether any notes text was written.
    fn write_entry(&self, writer: &mut PageWriter<'_>, entry: &Entry) -> bool {
        writer.heading(&format!("Appliance {}", entry.number));
        writer.key_values(entry.attributes.clone());

        if !entry.rows.is_empty() {
            writer.heading("Measurements & Clearances");
            let columns = clearance_columns(entry.shielding);
            let rows = entry.rows.iter().map(|r| self.table_row(r)).collect();
            writer.table(columns, rows);
        }

        let mut wrote_notes = false;
        if self.layout.inline_notes && entry.has_notes() {
            writer.heading("Notes");
            writer.paragraph(wrap_text(&entry.notes, self.layout.wrap_width()));
            wrote_notes = true;
        }

        if !entry.legend.is_empty() {
            writer.heading("Chimney Code Legend");
            let legend = entry.legend.iter().map(|l| l.line()).collect::<Vec<_>>().join("\n");
            writer.paragraph(wrap_text(&legend, self.layout.wrap_width()));
        }

        wrote_notes
    }

    fn table_row(&self, row: &EntryRow) -> TableRow {
        let fill = if row.is_header {
            let marker = self.style.header_marker.trim().to_lowercase();
            (!marker.is_empty() && row.label.to_lowercase().contains(&marker))
                .then_some(HEADER_HIGHLIGHT)
        } else {
            row_fill(row.row_class)
        };

        TableRow {
            label: row.label.clone(),
            required: row.required.clone(),
            actual: row.actual.clone(),
            shielded_display: row.shielded_display.clone(),
            row_class: row.row_class,
            is_header: row.is_header,
            fill,
        }
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new(LayoutConfig::default(), ReportStyle::default())
    }
}

pub fn row_fill(class: Classification) -> Option<Rgb> {
    match class {
        Classification::Pass => Some(PASS_FILL),
        Classification::Fail => Some(FAIL_FILL),
        Classification::Caution => Some(CAUTION_FILL),
        Classification::Unclassified => None,
    }
}

fn clearance_columns(shielding: bool) -> Vec<String> {
    let mut columns = vec!["Clearances from", "Required", "Actual"];
    if shielding {
        columns.push("Shielded");
    }
    columns.into_iter().map(String::from).collect()
}

/// Greedy word wrap. Existing line breaks are kept; words longer than `width`
/// are split.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for source_line in text.lines() {
        let mut current = String::new();
        for word in source_line.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
            if needed > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        lines.push(current);
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Tracks the vertical cursor and breaks pages.
struct PageWriter<'a> {
    layout: &'a LayoutConfig,
    title: &'a str,
    pages: Vec<Page>,
    current: Option<Page>,
    cursor: f64,
}

impl<'a> PageWriter<'a> {
    fn new(layout: &'a LayoutConfig, title: &'a str) -> Self {
        Self {
            layout,
            title,
            pages: Vec::new(),
            current: None,
            cursor: 0.0,
        }
    }

    fn start_page(&mut self, entry: Option<usize>) {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        self.current = Some(Page {
            number: self.pages.len() + 1,
            entry,
            blocks: vec![Block::TitleBand { title: self.title.to_string() }],
        });
        self.cursor = self.layout.title_band_height + self.layout.block_gap;
    }

    /// Continue the current entry on a fresh page.
    fn break_page(&mut self) {
        let entry = self.current.as_ref().and_then(|p| p.entry);
        self.start_page(entry);
    }

    fn remaining(&self) -> f64 {
        self.layout.page_height - self.layout.margin - self.cursor
    }

    fn at_top(&self) -> bool {
        self.current.as_ref().map_or(true, |p| p.blocks.len() <= 1)
    }

    fn push(&mut self, block: Block, height: f64) {
        if height > self.remaining() && !self.at_top() {
            self.break_page();
        }
        if self.current.is_none() {
            self.start_page(None);
        }
        if let Some(page) = self.current.as_mut() {
            page.blocks.push(block);
        }
        self.cursor += height + self.layout.block_gap;
    }

    fn heading(&mut self, text: &str) {
        // keep a heading with at least one following row or line
        let needed = self.layout.line_height + self.layout.row_height * 2.0;
        if needed > self.remaining() && !self.at_top() {
            self.break_page();
        }
        self.push(Block::Heading { text: text.to_string() }, self.layout.line_height);
    }

    fn key_values(&mut self, rows: Vec<Attribute>) {
        let height = rows.len() as f64 * self.layout.row_height;
        self.push(Block::KeyValueTable { rows }, height);
    }

    /// Place table rows, splitting across pages with the column header repeated.
    fn table(&mut self, columns: Vec<String>, mut rows: Vec<TableRow>) {
        let row_h = self.layout.row_height;
        let mut continued = false;

        while !rows.is_empty() {
            let mut fit = ((self.remaining() - row_h) / row_h).floor().max(0.0) as usize;
            if fit == 0 {
                if self.at_top() {
                    fit = 1;
                } else {
                    self.break_page();
                    continue;
                }
            }

            let rest = rows.split_off(fit.min(rows.len()));
            let height = (rows.len() + 1) as f64 * row_h;
            self.push(
                Block::ClearanceTable { columns: columns.clone(), rows, continued },
                height,
            );
            rows = rest;
            continued = true;
            if !rows.is_empty() {
                self.break_page();
            }
        }
    }

    fn paragraph(&mut self, mut lines: Vec<String>) {
        let line_h = self.layout.line_height;
        while !lines.is_empty() {
            let mut fit = (self.remaining() / line_h).floor().max(0.0) as usize;
            if fit == 0 {
                if self.at_top() {
                    fit = 1;
                } else {
                    self.break_page();
                    continue;
                }
            }

            let rest = lines.split_off(fit.min(lines.len()));
            let height = lines.len() as f64 * line_h;
            self.push(Block::Paragraph { lines }, height);
            lines = rest;
            if !lines.is_empty() {
                self.break_page();
            }
        }
    }

    fn finish(mut self) -> Vec<Page> {
        if let Some(page) = self.current.take() {
            self.pages.push(page);
        }
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_respects_width() {
        let lines = wrap_text("the quick brown fox jumps over the lazy dog", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_text_keeps_line_breaks_and_splits_long_words() {
        let lines = wrap_text("one\ntwo\nabcdefghij", 4);
        assert_eq!(lines, vec!["one", "two", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_text_empty() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("  \n ", 10).is_empty());
    }

    #[test]
    fn test_row_fill_colors() {
        assert_eq!(row_fill(Classification::Pass), Some(PASS_FILL));
        assert_eq!(row_fill(Classification::Fail), Some(FAIL_FILL));
        assert_eq!(row_fill(Classification::Caution), Some(CAUTION_FILL));
        assert_eq!(row_fill(Classification::Unclassified), None);
    }

    #[test]
    fn test_header_highlight_only_for_marker() {
        let assembler = Assembler::default();
        let header = |label: &str| EntryRow {
            label: label.to_string(),
            required: String::new(),
            actual: String::new(),
            shielded_display: String::new(),
            row_class: Classification::Unclassified,
            is_header: true,
        };
        assert_eq!(assembler.table_row(&header("Floor pad")).fill, Some(HEADER_HIGHLIGHT));
        assert_eq!(assembler.table_row(&header("Connector")).fill, None);
    }

    #[test]
    fn test_long_paragraph_breaks_pages() {
        let layout = LayoutConfig { page_height: 300.0, ..LayoutConfig::default() };
        let mut writer = PageWriter::new(&layout, "T");
        writer.start_page(Some(1));
        writer.paragraph((0..40).map(|i| format!("line {}", i)).collect());
        let pages = writer.finish();

        assert!(pages.len() > 1);
        let total: usize = pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .map(|b| match b {
                Block::Paragraph { lines } => lines.len(),
                _ => 0,
            })
            .sum();
        assert_eq!(total, 40);
        assert!(pages.iter().all(|p| matches!(p.blocks[0], Block::TitleBand { .. })));
        assert!(pages.iter().all(|p| p.entry == Some(1)));
    }
}
