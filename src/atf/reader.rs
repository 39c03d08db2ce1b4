use std::{fs::File, io::Read, path::Path};

use crate::{
    atf::AtfRecord,
    rows::{Row, Rows},
    TAError, TAResult,
};

/// Reads an ATF stream: a header row followed by data rows.
pub struct AtfReader<R: Read> {
    rows: Rows<R>,
    header: csv::StringRecord,
}

impl AtfReader<File> {
    pub fn open(path: &Path) -> TAResult<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read> AtfReader<R> {
    pub fn new(source: R) -> TAResult<Self> {
        let mut rows = Rows::new(source);
        let header = rows
            .next()
            .ok_or_else(|| TAError::invalid_arg("atf stream has no header row"))??
            .record;
        Ok(AtfReader { rows, header })
    }

    /// The header row exactly as found in the stream.
    pub fn header(&self) -> &csv::StringRecord {
        &self.header
    }

    /// Data rows with their columns left as text.
    pub(crate) fn into_rows(self) -> Rows<R> {
        self.rows
    }
}

fn parse_record(row: &Row) -> TAResult<AtfRecord> {
    row.require_columns(5)?;
    Ok(AtfRecord {
        address: row.str(0).to_owned(),
        timestamp: row.parse(1, "timestamp")?,
        io_type: row.str(2).to_owned(),
        size: row.parse(3, "size")?,
        cost: row.parse(4, "cost")?,
    })
}

impl<R: Read> Iterator for AtfReader<R> {
    type Item = TAResult<AtfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.rows.next()?.and_then(|row| parse_record(&row)))
    }
}
