//! CSV export of interface status records.
//!
//! One header row with the table's column labels, then one row per record.
//! Fields containing a comma, quote or line break are quoted, with embedded
//! quotes doubled.

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::debug;

use crate::error::{ExportError, Result};
use crate::parser::InterfaceStatus;

/// Write `records` as CSV to any writer.
pub fn write_csv<W: Write>(mut writer: W, records: &[InterfaceStatus]) -> Result<()> {
    write_row(&mut writer, InterfaceStatus::HEADERS)?;
    for record in records {
        write_row(&mut writer, record.values())?;
    }
    writer.flush().map_err(ExportError::Io)?;
    Ok(())
}

/// Create (or truncate) `path` and write `records` to it as CSV.
pub fn export_csv(path: impl AsRef<Path>, records: &[InterfaceStatus]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;

    write_csv(BufWriter::new(file), records)?;
    debug!("exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn write_row<W: Write>(writer: &mut W, fields: [&str; 7]) -> Result<()> {
    let line = fields.map(escape).join(",");
    writeln!(writer, "{}", line).map_err(ExportError::Io)?;
    Ok(())
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
