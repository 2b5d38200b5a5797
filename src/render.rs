//! Rendering sinks
//!
//! A sink turns an assembled [`Document`] into artifact bytes. Row colors and
//! classes arrive precomputed; sinks only draw them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::{Block, Document, Page, TableRow};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render failed: {0}")]
    Failed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    Json,
    Text,
}

impl RenderFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RenderFormat::Json => "json",
            RenderFormat::Text => "txt",
        }
    }

    pub fn sink(&self) -> Box<dyn RenderSink> {
        match self {
            RenderFormat::Json => Box::new(JsonSink),
            RenderFormat::Text => Box::new(TextSink),
        }
    }
}

pub trait RenderSink {
    fn format(&self) -> RenderFormat;
    fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError>;
}

/// Structured page model as pretty JSON, for a downstream PDF renderer.
pub struct JsonSink;

impl RenderSink for JsonSink {
    fn format(&self) -> RenderFormat {
        RenderFormat::Json
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        Ok(serde_json::to_vec_pretty(document)?)
    }
}

/// Plain-text pages separated by form feeds.
pub struct TextSink;

impl RenderSink for TextSink {
    fn format(&self) -> RenderFormat {
        RenderFormat::Text
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>, RenderError> {
        let pages = document
            .pages
            .iter()
            .map(|p| render_page(p, document.pages.len()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages.join("\u{000C}\n").into_bytes())
    }
}

fn render_page(page: &Page, total: usize) -> Result<String, RenderError> {
    let mut out = String::new();
    for block in &page.blocks {
        match block {
            Block::TitleBand { title } => {
                out.push_str(&format!("{:^72}\n", title));
                out.push_str(&format!("{:>72}\n\n", format!("Page {} of {}", page.number, total)));
            }
            Block::HeaderTable { policy, survey_date, completed_by } => {
                out.push_str(&format!(
                    "Policy #: {}   Survey date: {}   Completed by: {}\n\n",
                    policy, survey_date, completed_by
                ));
            }
            Block::Heading { text } => {
                out.push_str(&format!("{}\n{}\n", text, "-".repeat(text.chars().count())));
            }
            Block::KeyValueTable { rows } => {
                for attr in rows {
                    out.push_str(&format!("  {:<18} {}\n", attr.key, attr.value));
                }
                out.push('\n');
            }
            Block::ClearanceTable { columns, rows, continued } => {
                let [label, required, actual, rest @ ..] = columns.as_slice() else {
                    return Err(RenderError::Failed(format!(
                        "clearance table on page {} has {} columns, expected at least 3",
                        page.number,
                        columns.len()
                    )));
                };
                if *continued {
                    out.push_str("  (continued)\n");
                }
                let shielded = !rest.is_empty();
                out.push_str(&table_line(
                    label,
                    required,
                    actual,
                    rest.first().map(String::as_str).unwrap_or(""),
                    "",
                    shielded,
                ));
                for row in rows {
                    out.push_str(&render_row(row, shielded));
                }
                out.push('\n');
            }
            Block::Paragraph { lines } => {
                for line in lines {
                    out.push_str(line);
                    out.push('\n');
                }
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn render_row(row: &TableRow, shielded: bool) -> String {
    if row.is_header {
        let mark = if row.fill.is_some() { "*" } else { "" };
        return format!("  [{}{}]\n", row.label, mark);
    }
    let tag = match row.row_class.row_class() {
        "" => String::new(),
        class => format!("<{}>", class),
    };
    table_line(&row.label, &row.required, &row.actual, &row.shielded_display, &tag, shielded)
}

fn table_line(label: &str, required: &str, actual: &str, shield: &str, tag: &str, shielded: bool) -> String {
    if shielded {
        format!("  {:<24} {:>10} {:>10} {:>9} {}\n", label, required, actual, shield, tag)
    } else {
        format!("  {:<24} {:>10} {:>10} {}\n", label, required, actual, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearance::Classification;
    use crate::document::{Document, Page, FAIL_FILL};

    fn document() -> Document {
        Document {
            title: "WOOD APP FORM".into(),
            notes_fallback: false,
            pages: vec![Page {
                number: 1,
                entry: Some(1),
                blocks: vec![
                    Block::TitleBand { title: "WOOD APP FORM".into() },
                    Block::ClearanceTable {
                        columns: vec!["Clearances from".into(), "Required".into(), "Actual".into()],
                        rows: vec![TableRow {
                            label: "Front".into(),
                            required: "36".into(),
                            actual: "20".into(),
                            shielded_display: String::new(),
                            row_class: Classification::Fail,
                            is_header: false,
                            fill: Some(FAIL_FILL),
                        }],
                        continued: false,
                    },
                    Block::Paragraph { lines: vec!["chimney cap missing".into()] },
                ],
            }],
        }
    }

    #[test]
    fn test_json_sink_round_trips() {
        let bytes = JsonSink.render(&document()).unwrap();
        let parsed: Document = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, document());
    }

    #[test]
    fn test_text_sink_carries_row_class_and_notes() {
        let bytes = TextSink.render(&document()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("WOOD APP FORM"));
        assert!(text.contains("Page 1 of 1"));
        assert!(text.contains("<row-negative>"));
        assert!(text.contains("chimney cap missing"));
    }

    #[test]
    fn test_text_sink_rejects_short_table_header() {
        let json = r#"{
            "title": "WOOD APP FORM",
            "notes_fallback": false,
            "pages": [{"number": 1, "entry": 1, "blocks": [
                {"block": "clearance_table", "columns": [], "rows": [], "continued": false}
            ]}]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let err = TextSink.render(&document).unwrap_err();
        assert!(matches!(err, RenderError::Failed(_)));
        assert!(err.to_string().contains("0 columns"));
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(RenderFormat::Json.extension(), "json");
        assert_eq!(RenderFormat::Text.sink().format(), RenderFormat::Text);
    }
}
