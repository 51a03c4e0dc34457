//! Workbooks: every worksheet rendered as CSV under a `### Sheet:` heading.
//!
//! The container format is sniffed from the bytes (xlsx, xls, xlsb, ods) so a
//! legacy `.xls` goes through the same path as `.xlsx`. Sheets keep the
//! workbook's native order; sheets whose CSV is blank are left out entirely.
//! Date-formatted cells render as ISO dates, not as their serial numbers.

use crate::error::PipelineError;
use crate::kind::FileKind;
use calamine::{open_workbook_auto_from_rs, Data, ExcelDateTime, Range, Reader};
use chrono::Timelike;
use std::io::Cursor;
use tracing::debug;

/// Render every non-empty sheet as `"\n\n### Sheet: <name>\n\n<csv>"`.
///
/// Returns `Ok(None)` when no sheet has any content.
pub(crate) fn workbook_text(bytes: &[u8]) -> Result<Option<String>, PipelineError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| PipelineError::extraction(FileKind::Xlsx, e))?;

    let mut out = String::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| PipelineError::extraction(FileKind::Xlsx, format!("sheet '{name}': {e}")))?;
        let csv = range_to_csv(&range);
        if csv.trim().is_empty() {
            debug!("Sheet '{}' is empty, skipping", name);
            continue;
        }
        out.push_str(&format!("\n\n### Sheet: {name}\n\n{csv}"));
    }

    if out.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(out))
    }
}

/// Rows joined by `\n`, cells by `,`.
fn range_to_csv(range: &Range<Data>) -> String {
    let mut out = String::new();
    for (i, row) in range.rows().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for (j, cell) in row.iter().enumerate() {
            if j > 0 {
                out.push(',');
            }
            push_csv_field(&mut out, &cell_text(cell));
        }
    }
    out
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::DateTime(dt) => format_datetime(dt),
        Data::DateTimeIso(iso) | Data::DurationIso(iso) => iso.clone(),
        other => other.to_string(),
    }
}

/// `2023-07-16`, or `2023-07-16 12:30:00` when there is a time part.
/// Durations keep their numeric value.
fn format_datetime(dt: &ExcelDateTime) -> String {
    if dt.is_duration() {
        return format_number(dt.as_f64());
    }
    match dt.as_datetime() {
        Some(t) if t.num_seconds_from_midnight() == 0 => t.format("%Y-%m-%d").to_string(),
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_number(dt.as_f64()),
    }
}

/// Whole numbers print without a fractional part (`1`, not `1.0`); other
/// values are rounded to 15 significant digits, as spreadsheets display them.
fn format_number(f: f64) -> String {
    if !f.is_finite() {
        return format!("{f}");
    }
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{}", f as i64);
    }
    let rounded: f64 = format!("{f:.14e}").parse().unwrap_or(f);
    format!("{rounded}")
}

/// Quote a field when it contains a separator, quote or line break.
fn push_csv_field(out: &mut String, field: &str) {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal hand-built `.xlsx` packages.

    use crate::pipeline::ooxml::fixtures::zip_of;

    /// Style 0 is General, style 1 the built-in short date (numFmtId 14).
    pub(crate) const DATE_STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0" applyNumberFormat="1"/></cellXfs></styleSheet>"#;

    /// Build a workbook from `(sheet name, sheetData inner XML)` pairs.
    pub(crate) fn xlsx_of(sheets: &[(&str, &str)]) -> Vec<u8> {
        xlsx_with_styles(sheets, None)
    }

    /// Like [`xlsx_of`], with `xl/styles.xml` set to `styles`.
    pub(crate) fn xlsx_with_styles(sheets: &[(&str, &str)], styles: Option<&str>) -> Vec<u8> {
        let mut sheet_entries = String::new();
        let mut rels = String::new();
        let mut overrides = String::new();
        let mut parts: Vec<(String, String)> = Vec::new();

        for (i, (name, rows)) in sheets.iter().enumerate() {
            let n = i + 1;
            sheet_entries.push_str(&format!(
                r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            parts.push((
                format!("xl/worksheets/sheet{n}.xml"),
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{rows}</sheetData></worksheet>"#
                ),
            ));
        }

        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
        );
        let root_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;
        let workbook = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
        );
        let workbook_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
        );

        let mut all: Vec<(&str, &str)> = vec![
            ("[Content_Types].xml", content_types.as_str()),
            ("_rels/.rels", root_rels),
            ("xl/workbook.xml", workbook.as_str()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.as_str()),
        ];
        if let Some(styles) = styles {
            all.push(("xl/styles.xml", styles));
        }
        all.extend(parts.iter().map(|(p, c)| (p.as_str(), c.as_str())));
        zip_of(&all)
    }

    /// An inline-string cell.
    pub(crate) fn s(cell_ref: &str, value: &str) -> String {
        format!(r#"<c r="{cell_ref}" t="inlineStr"><is><t>{value}</t></is></c>"#)
    }

    /// A numeric cell.
    pub(crate) fn n(cell_ref: &str, value: &str) -> String {
        format!(r#"<c r="{cell_ref}"><v>{value}</v></c>"#)
    }

    /// A numeric cell using style 1 of [`DATE_STYLES`].
    pub(crate) fn d(cell_ref: &str, value: &str) -> String {
        format!(r#"<c r="{cell_ref}" s="1"><v>{value}</v></c>"#)
    }

    /// A row wrapping the given cells.
    pub(crate) fn row(r: usize, cells: &[String]) -> String {
        format!(r#"<row r="{r}">{}</row>"#, cells.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{d, n, row, s, xlsx_of, xlsx_with_styles, DATE_STYLES};
    use super::*;

    #[test]
    fn sheets_render_as_csv_in_workbook_order() {
        let people = [
            row(1, &[s("A1", "name"), s("B1", "age")]),
            row(2, &[s("A2", "Ada"), n("B2", "36")]),
        ]
        .concat();
        let totals = row(1, &[s("A1", "total"), n("B1", "2.5")]);
        let bytes = xlsx_of(&[("People", people.as_str()), ("Totals", totals.as_str())]);

        let text = workbook_text(&bytes).unwrap().expect("non-empty workbook");
        assert_eq!(
            text,
            "\n\n### Sheet: People\n\nname,age\nAda,36\n\n### Sheet: Totals\n\ntotal,2.5"
        );
    }

    #[test]
    fn empty_sheets_are_skipped() {
        let data = row(1, &[s("A1", "only")]);
        let bytes = xlsx_of(&[("Blank", ""), ("Data", data.as_str())]);

        let text = workbook_text(&bytes).unwrap().unwrap();
        assert!(!text.contains("Blank"));
        assert_eq!(text, "\n\n### Sheet: Data\n\nonly");
    }

    #[test]
    fn all_empty_sheets_yield_none() {
        let bytes = xlsx_of(&[("Sheet1", ""), ("Sheet2", "")]);
        assert_eq!(workbook_text(&bytes).unwrap(), None);
    }

    #[test]
    fn corrupt_workbook_is_an_extraction_failure() {
        let err = workbook_text(b"not a workbook at all").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ExtractionFailure {
                kind: FileKind::Xlsx,
                ..
            }
        ));
    }

    #[test]
    fn csv_quoting() {
        let mut out = String::new();
        push_csv_field(&mut out, "plain");
        out.push(',');
        push_csv_field(&mut out, "a,b");
        out.push(',');
        push_csv_field(&mut out, "say \"hi\"");
        out.push(',');
        push_csv_field(&mut out, "two\nlines");
        assert_eq!(out, "plain,\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"");
    }

    #[test]
    fn numbers_drop_trailing_zero_fraction() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-42.0), "-42");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn fractions_round_to_fifteen_significant_digits() {
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(1.0 / 3.0), "0.333333333333333");
        assert_eq!(format_number(-2.675), "-2.675");
        assert_eq!(format_number(1234.5), "1234.5");
    }

    #[test]
    fn date_styled_cells_render_as_iso_dates() {
        let rows = [
            row(1, &[s("A1", "when"), s("B1", "amount")]),
            row(2, &[d("A2", "45123"), n("B2", "45123")]),
            row(3, &[d("A3", "45123.5"), n("B3", "0.5")]),
        ]
        .concat();
        let bytes = xlsx_with_styles(&[("S", rows.as_str())], Some(DATE_STYLES));

        let text = workbook_text(&bytes).unwrap().unwrap();
        assert_eq!(
            text,
            "\n\n### Sheet: S\n\nwhen,amount\n2023-07-16,45123\n2023-07-16 12:00:00,0.5"
        );
    }

    #[test]
    fn cell_text_variants() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String("x".into())), "x");
    }
}
