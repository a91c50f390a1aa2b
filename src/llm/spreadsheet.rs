use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use crate::error::{GlosaError, Result};
use crate::money::format_amount;

fn conversion_error(e: impl std::fmt::Display) -> GlosaError {
    GlosaError::SpreadsheetConversion(e.to_string())
}

/// Numeric cells lose their display format in the workbook, so they are
/// written back in a form `parse_amount` reads correctly: whole numbers
/// (codes, ids, round amounts) without separators, fractional ones in pt-BR
/// notation.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Int(value) => value.to_string(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => format_amount(*value),
        other => other.to_string(),
    }
}

/// Converts the first worksheet of an XLSX workbook into CSV text.
pub fn first_sheet_to_csv(bytes: &[u8]) -> Result<String> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).map_err(conversion_error)?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| GlosaError::SpreadsheetConversion("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(conversion_error)?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in range.rows() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        writer.write_record(&cells).map_err(conversion_error)?;
    }

    let bytes = writer.into_inner().map_err(conversion_error)?;
    String::from_utf8(bytes).map_err(conversion_error)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::parse_amount;

    #[test]
    fn test_garbage_is_a_conversion_error() {
        let err = first_sheet_to_csv(b"not a zip archive").unwrap_err();
        assert!(matches!(err, GlosaError::SpreadsheetConversion(_)));
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Data::Float(1234.5)), "1.234,50");
        assert_eq!(cell_text(&Data::Float(1000.0)), "1000");
        assert_eq!(cell_text(&Data::Int(40301630)), "40301630");
        assert_eq!(cell_text(&Data::String("J1".to_string())), "J1");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_first_sheet_only_with_readable_amounts() {
        let csv = first_sheet_to_csv(&fixtures::denial_workbook()).unwrap();
        assert!(!csv.contains("segunda aba"));

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(csv.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][2], "Valor");

        assert_eq!(&rows[1][0], "Ana");
        assert_eq!(&rows[1][1], "40301630");
        assert_eq!(&rows[1][2], "1.234,50");
        assert_eq!(parse_amount(&rows[1][2]), 1234.5);

        assert_eq!(parse_amount(&rows[2][2]), 1000.0);
    }
}
