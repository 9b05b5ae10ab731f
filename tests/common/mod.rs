//! Shared fixtures: a catalog workbook built in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

pub const HEADER: [&str; 12] = [
    "product_number",
    "product_name",
    "color",
    "barcode",
    "size",
    "release_year",
    "item_category",
    "original_price",
    "sale_price",
    "store_stock",
    "hq_stock",
    "is_favorite",
];

/// Three products, four variants, one favorite, six units of store stock.
pub const CATALOG: [[&str; 12]; 4] = [
    ["M24-TS-001", "Linen Shirt", "WHITE", "8801234567890", "L", "2024", "TOP", "39000", "29000", "3", "10", "1"],
    ["M24-TS-001", "Linen Shirt", "WHITE", "8801234567891", "S", "2024", "TOP", "39000", "29000", "0", "10", "1"],
    ["M24-TS-002", "Oxford Shirt", "BLUE", "8801234568000", "M", "2024", "TOP", "45000", "45000", "2", "5", "0"],
    ["M24-PT-100", "Wide Pants", "BLACK", "8809999900001", "30", "2023", "BOTTOM", "59000", "49000", "1", "0", "0"],
];

fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn row_xml(line: usize, values: &[&str]) -> String {
    let cells: String = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                column_letter(i),
                line,
                escape(v)
            )
        })
        .collect();
    format!(r#"<row r="{}">{}</row>"#, line, cells)
}

/// An `.xlsx` workbook whose first sheet holds `header` and `rows`.
pub fn workbook(header: &[&str], rows: &[&[&str]]) -> Vec<u8> {
    let mut sheet_rows = row_xml(1, header);
    for (i, row) in rows.iter().enumerate() {
        sheet_rows.push_str(&row_xml(i + 2, row));
    }
    let sheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        sheet_rows
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(sheet.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// The standard fixture catalog as a workbook.
pub fn catalog_workbook() -> Vec<u8> {
    let rows: Vec<&[&str]> = CATALOG.iter().map(|r| &r[..]).collect();
    workbook(&HEADER, &rows)
}
