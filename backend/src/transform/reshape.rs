//! Import reshaper: survey response rows to bulk import rows.
//!
//! Response exports put two header-like rows under the column names (the
//! question text, then the internal import ids), so data starts at the third
//! parsed row. That layout belongs to one export format; rows from other
//! sources lose their first two rows too.

use serde_json::Value;
use std::io::Write;

use crate::models::{import_headers, ColumnMapping, ImportContext, ImportRow};

/// Parsed rows skipped before the data.
pub const HEADER_ROWS: usize = 2;

/// Build one import row per data row.
///
/// Each row starts from the context fields with empty customer fields. Every
/// mapping entry whose column is present in the source row then writes the
/// cell under the mapped key; a missing column leaves the key absent.
pub fn reshape(rows: &[Value], mapping: &ColumnMapping, context: &ImportContext) -> Vec<ImportRow> {
    rows.iter()
        .skip(HEADER_ROWS)
        .map(|row| {
            let mut import = ImportRow::seeded(context);
            for (column, key) in mapping.iter() {
                if let Some(value) = row.get(column).and_then(cell_text) {
                    import.set(key, value);
                }
            }
            import
        })
        .collect()
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Write import rows as CSV, headers from [`import_headers`].
///
/// Absent answers become empty cells.
pub fn write_import_csv<W: Write>(
    rows: &[ImportRow],
    mapping: &ColumnMapping,
    writer: W,
) -> Result<(), csv::Error> {
    let headers = import_headers(mapping);
    let mut out = csv::Writer::from_writer(writer);

    out.write_record(&headers)?;
    for row in rows {
        out.write_record(headers.iter().map(|h| row.field(h).unwrap_or("")))?;
    }
    out.flush()?;
    Ok(())
}

/// [`write_import_csv`] into a string.
pub fn import_csv_string(rows: &[ImportRow], mapping: &ColumnMapping) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_import_csv(rows, mapping, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).to_string())
}
