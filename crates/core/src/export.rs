//! Summary rows as a single-sheet `.xlsx` workbook.

use crate::domain::campaign::FieldValue;
use crate::domain::report::CampaignReport;
use anyhow::Context;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const EXPORT_FILE_NAME: &str = "campaign_prediction.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Results";

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

enum Cell<'a> {
    Text(&'a str),
    Number(f64),
}

impl<'a> From<FieldValue<'a>> for Cell<'a> {
    fn from(value: FieldValue<'a>) -> Self {
        match value {
            FieldValue::Text(s) => Cell::Text(s),
            FieldValue::Number(n) => Cell::Number(n),
        }
    }
}

pub fn to_xlsx(reports: &[CampaignReport]) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, String); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
        ("_rels/.rels", ROOT_RELS_XML.to_string()),
        ("xl/workbook.xml", workbook_xml()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
        ("xl/worksheets/sheet1.xml", sheet_xml(reports)),
    ];

    for (name, body) in parts {
        zip.start_file(name, options)
            .with_context(|| format!("start xlsx part {name} failed"))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("write xlsx part {name} failed"))?;
    }

    let cursor = zip.finish().context("finish xlsx archive failed")?;
    tracing::debug!(rows = reports.len(), "xlsx export built");
    Ok(cursor.into_inner())
}

fn workbook_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{SHEET_NAME}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
    )
}

fn sheet_xml(reports: &[CampaignReport]) -> String {
    let with_narrative = reports.iter().any(|r| r.narrative.is_some());

    let mut header: Vec<&str> = match reports.first() {
        Some(first) => first.input.fields().iter().map(|(name, _)| *name).collect(),
        None => Vec::new(),
    };
    if !reports.is_empty() {
        header.push("Predicted_Revenue");
        header.push("Predicted_ROI_%");
        if with_narrative {
            header.push("AI_Suggestions");
        }
    }

    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    if !header.is_empty() {
        let cells: Vec<Cell<'_>> = header.iter().map(|h| Cell::Text(h)).collect();
        push_row(&mut out, 1, &cells);
    }

    for (idx, report) in reports.iter().enumerate() {
        let mut cells: Vec<Cell<'_>> = report
            .input
            .fields()
            .into_iter()
            .map(|(_, value)| Cell::from(value))
            .collect();
        cells.push(Cell::Number(report.predicted_revenue));
        cells.push(Cell::Number(report.roi_percent));
        if with_narrative {
            cells.push(Cell::Text(report.narrative.as_deref().unwrap_or_default()));
        }
        push_row(&mut out, idx + 2, &cells);
    }

    out.push_str("</sheetData></worksheet>");
    out
}

fn push_row(out: &mut String, row_num: usize, cells: &[Cell<'_>]) {
    out.push_str(&format!(r#"<row r="{row_num}">"#));
    for (col, cell) in cells.iter().enumerate() {
        let cell_ref = format!("{}{row_num}", column_letters(col));
        match cell {
            Cell::Number(n) if n.is_finite() => {
                out.push_str(&format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#));
            }
            Cell::Number(n) => push_text_cell(out, &cell_ref, &n.to_string()),
            Cell::Text(s) => push_text_cell(out, &cell_ref, s),
        }
    }
    out.push_str("</row>");
}

fn push_text_cell(out: &mut String, cell_ref: &str, text: &str) {
    out.push_str(&format!(
        r#"<c r="{cell_ref}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
        escape_xml(text)
    ));
}

/// 0 -> "A", 25 -> "Z", 26 -> "AA".
fn column_letters(mut idx: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (idx % 26) as u8);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not allowed in XML 1.0.
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}
