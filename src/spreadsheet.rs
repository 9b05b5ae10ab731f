//! Catalog workbook reader (`.xlsx`).
//!
//! Reads the first worksheet of an OOXML workbook into a
//! [`Sheet`]: the first non-blank row is the header, every later non-blank
//! row is data. Cells are resolved to text from shared strings, inline
//! strings, formula strings, booleans and numbers; coercion to integers
//! happens later in [`import`](wasabi_check_core::import).

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use wasabi_check_core::error::{CatalogError, Result};
use wasabi_check_core::import::{Sheet, SheetRow};

/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Maximum data rows accepted from one sheet.
const MAX_ROWS: usize = 200_000;

const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

type Archive<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

/// Reject anything that is not named `*.xlsx`.
pub fn ensure_xlsx_name(filename: &str) -> Result<()> {
    if filename.to_ascii_lowercase().ends_with(".xlsx") {
        Ok(())
    } else {
        Err(CatalogError::UnsupportedFile(format!(
            "{} is not an .xlsx file",
            if filename.is_empty() { "upload" } else { filename }
        )))
    }
}

/// Read a workbook from disk.
pub fn read_workbook_file(path: &Path) -> Result<Sheet> {
    ensure_xlsx_name(&path.to_string_lossy())?;
    let bytes = std::fs::read(path).map_err(|e| {
        CatalogError::UnsupportedFile(format!("cannot read {}: {}", path.display(), e))
    })?;
    read_workbook(&bytes)
}

/// Parse the first worksheet of an in-memory workbook.
pub fn read_workbook(bytes: &[u8]) -> Result<Sheet> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| malformed(format!("not an .xlsx workbook: {}", e)))?;

    let shared_strings = if archive.index_for_name(SHARED_STRINGS).is_some() {
        let xml = read_zip_entry_bounded(&mut archive, SHARED_STRINGS)?;
        read_shared_strings(&xml)?
    } else {
        Vec::new()
    };

    let sheet_name = first_worksheet_name(&archive)
        .ok_or_else(|| malformed("workbook has no worksheets".to_string()))?;
    let xml = read_zip_entry_bounded(&mut archive, &sheet_name)?;
    let rows = read_rows(&xml, &shared_strings)?;
    Ok(rows_to_sheet(rows))
}

fn malformed(message: String) -> CatalogError {
    CatalogError::UnsupportedFile(message)
}

fn read_zip_entry_bounded(archive: &mut Archive<'_>, name: &str) -> Result<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .map_err(|e| malformed(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| malformed(format!("{}: {}", name, e)))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(malformed(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, MAX_XML_ENTRY_BYTES
        )));
    }
    Ok(out)
}

/// Lowest-numbered `xl/worksheets/sheetN.xml`.
fn first_worksheet_name(archive: &Archive<'_>) -> Option<String> {
    archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .min_by_key(|name| {
            name.trim_start_matches("xl/worksheets/sheet")
                .trim_end_matches(".xml")
                .parse::<u32>()
                .unwrap_or(u32::MAX)
        })
        .map(str::to_string)
}

/// Shared string table. Rich-text runs inside one `<si>` are concatenated;
/// phonetic hints (`<rPh>`) are skipped.
fn read_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    let mut in_phonetic = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"rPh" => in_phonetic = true,
                b"t" => in_t = !in_phonetic,
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    let text = te.unescape().map_err(|e| malformed(e.to_string()))?;
                    s.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"si" => strings.push(current.take().unwrap_or_default()),
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(format!("malformed shared strings: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// How a `<c>` element's value is encoded (its `t` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    Shared,
    Inline,
    FormulaString,
    Boolean,
    Error,
}

impl CellKind {
    fn from_attr(value: &[u8]) -> Self {
        match value {
            b"s" => CellKind::Shared,
            b"inlineStr" => CellKind::Inline,
            b"str" => CellKind::FormulaString,
            b"b" => CellKind::Boolean,
            b"e" => CellKind::Error,
            _ => CellKind::Number,
        }
    }
}

struct CellState {
    column: usize,
    kind: CellKind,
    raw: String,
}

/// 1-based row number and cells keyed by 0-based column index.
type RawRow = (usize, BTreeMap<usize, String>);

fn attr(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// 0-based column index from a cell reference such as `"AB12"`.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for b in letters {
        index = index.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)?;
    }
    Some(index - 1)
}

/// Integral numbers print without a fractional part or exponent, so a
/// barcode stored as `8.801234567890E12` reads back as `8801234567890`.
fn number_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.parse::<i64>().is_ok() {
        return trimmed.to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
            format!("{}", f as i64)
        }
        _ => trimmed.to_string(),
    }
}

fn cell_text(cell: &CellState, shared_strings: &[String]) -> String {
    match cell.kind {
        CellKind::Shared => cell
            .raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i).cloned())
            .unwrap_or_default(),
        CellKind::Number => number_text(&cell.raw),
        CellKind::Error => String::new(),
        CellKind::Inline | CellKind::FormulaString | CellKind::Boolean => cell.raw.clone(),
    }
}

fn read_rows(xml: &[u8], shared_strings: &[String]) -> Result<Vec<RawRow>> {
    let mut rows: Vec<RawRow> = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut row: Option<RawRow> = None;
    let mut last_row_number = 0usize;
    let mut next_column = 0usize;
    let mut cell: Option<CellState> = None;
    let mut in_value = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    let number = attr(&e, b"r")
                        .and_then(|r| r.parse::<usize>().ok())
                        .unwrap_or(last_row_number + 1);
                    last_row_number = number;
                    next_column = 0;
                    row = Some((number, BTreeMap::new()));
                }
                b"c" => {
                    let column = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_column);
                    next_column = column + 1;
                    let kind = attr(&e, b"t")
                        .map(|t| CellKind::from_attr(t.as_bytes()))
                        .unwrap_or(CellKind::Number);
                    cell = Some(CellState {
                        column,
                        kind,
                        raw: String::new(),
                    });
                }
                b"v" => in_value = true,
                b"t" => in_value = matches!(&cell, Some(c) if c.kind == CellKind::Inline),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"row" => {
                    last_row_number = attr(&e, b"r")
                        .and_then(|r| r.parse::<usize>().ok())
                        .unwrap_or(last_row_number + 1);
                }
                b"c" => {
                    next_column = attr(&e, b"r")
                        .and_then(|r| column_index(&r))
                        .unwrap_or(next_column)
                        + 1;
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    let text = te.unescape().map_err(|e| malformed(e.to_string()))?;
                    c.raw.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let (Some(c), Some((_, cells))) = (cell.take(), row.as_mut()) {
                        let text = cell_text(&c, shared_strings);
                        if !text.is_empty() {
                            cells.insert(c.column, text);
                        }
                    }
                }
                b"row" => {
                    if let Some(r) = row.take() {
                        if !r.1.values().all(|v| v.trim().is_empty()) {
                            rows.push(r);
                        }
                    }
                    if rows.len() > MAX_ROWS {
                        return Err(malformed(format!(
                            "worksheet exceeds {} rows",
                            MAX_ROWS
                        )));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(format!("malformed worksheet: {}", e))),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn rows_to_sheet(rows: Vec<RawRow>) -> Sheet {
    let mut rows = rows.into_iter();
    let Some((_, header_cells)) = rows.next() else {
        return Sheet::default();
    };

    let header: Vec<(usize, String)> = header_cells
        .into_iter()
        .map(|(i, name)| (i, name.trim().to_string()))
        .filter(|(_, name)| !name.is_empty())
        .collect();

    let mut sheet = Sheet {
        columns: header.iter().map(|(_, name)| name.clone()).collect(),
        rows: Vec::new(),
    };

    for (line, cells) in rows {
        let mut row = SheetRow::new(line);
        for (index, name) in &header {
            if let Some(value) = cells.get(index) {
                row.set(name.clone(), value.clone());
            }
        }
        sheet.rows.push(row);
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn workbook(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn sheet_xml(rows: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            rows
        )
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("ab3"), Some(27));
        assert_eq!(column_index("12"), None);
    }

    #[test]
    fn numbers_render_as_integers() {
        assert_eq!(number_text("2024"), "2024");
        assert_eq!(number_text("39000.0"), "39000");
        assert_eq!(number_text("8.80123456789E+12"), "8801234567890");
        assert_eq!(number_text("2.5"), "2.5");
    }

    #[test]
    fn reads_shared_inline_and_numeric_cells() {
        let shared = r#"<sst><si><t>product_number</t></si><si><t>product_name</t></si>
            <si><r><t>Linen </t></r><r><t>Shirt</t></r></si><si><t>M24-TS-001</t></si></sst>"#;
        let rows = sheet_xml(
            r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="inlineStr"><is><t> store_stock </t></is></c></row>
               <row r="2"/>
               <row r="3"><c r="A3" t="s"><v>3</v></c><c r="B3" t="s"><v>2</v></c><c r="C3"><v>4</v></c></row>"#,
        );
        let bytes = workbook(&[
            ("xl/sharedStrings.xml", shared),
            ("xl/worksheets/sheet1.xml", &rows),
        ]);
        let sheet = read_workbook(&bytes).unwrap();
        assert_eq!(
            sheet.columns,
            vec!["product_number", "product_name", "store_stock"]
        );
        assert_eq!(sheet.rows.len(), 1);
        let row = &sheet.rows[0];
        assert_eq!(row.line, 3);
        assert_eq!(row.get("product_number"), "M24-TS-001");
        assert_eq!(row.get("product_name"), "Linen Shirt");
        assert_eq!(row.get("store_stock"), "4");
    }

    #[test]
    fn sparse_cells_stay_in_their_columns() {
        let rows = sheet_xml(
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>a</t></is></c><c r="C1" t="inlineStr"><is><t>c</t></is></c></row>
               <row r="2"><c r="C2" t="str"><v>x</v></c></row>"#,
        );
        let bytes = workbook(&[("xl/worksheets/sheet1.xml", &rows)]);
        let sheet = read_workbook(&bytes).unwrap();
        assert_eq!(sheet.columns, vec!["a", "c"]);
        assert_eq!(sheet.rows[0].get("a"), "");
        assert_eq!(sheet.rows[0].get("c"), "x");
    }

    #[test]
    fn first_sheet_wins() {
        let first = sheet_xml(r#"<row r="1"><c t="inlineStr"><is><t>one</t></is></c></row>"#);
        let tenth = sheet_xml(r#"<row r="1"><c t="inlineStr"><is><t>ten</t></is></c></row>"#);
        let bytes = workbook(&[
            ("xl/worksheets/sheet10.xml", &tenth),
            ("xl/worksheets/sheet1.xml", &first),
        ]);
        assert_eq!(read_workbook(&bytes).unwrap().columns, vec!["one"]);
    }

    #[test]
    fn rejects_non_workbooks() {
        assert!(matches!(
            read_workbook(b"product_number,barcode\n"),
            Err(CatalogError::UnsupportedFile(_))
        ));
        let no_sheets = workbook(&[("docProps/app.xml", "<x/>")]);
        assert!(matches!(
            read_workbook(&no_sheets),
            Err(CatalogError::UnsupportedFile(_))
        ));
        assert!(ensure_xlsx_name("catalog.XLSX").is_ok());
        assert!(ensure_xlsx_name("catalog.xls").is_err());
        assert!(ensure_xlsx_name("catalog.csv").is_err());
    }
}
