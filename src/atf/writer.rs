use std::io::Write;

use crate::{
    atf::{AtfRecord, HEADER},
    TAResult,
};

/// Writes ATF rows to any [`Write`] sink. The header row is written on construction.
pub struct AtfWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl<W: Write> AtfWriter<W> {
    pub fn new(sink: W) -> TAResult<Self> {
        Self::with_header(sink, &HEADER)
    }

    /// Start an ATF stream with a caller supplied header row.
    pub fn with_header<I, T>(sink: W, header: I) -> TAResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut writer = super::csv_writer_builder().from_writer(sink);
        writer.write_record(header)?;
        Ok(AtfWriter { writer, rows: 0 })
    }

    pub fn write(&mut self, record: &AtfRecord) -> TAResult<()> {
        self.writer.write_record(record.to_fields())?;
        self.rows += 1;
        Ok(())
    }

    /// Write a data row with its columns copied verbatim.
    pub(crate) fn write_raw(&mut self, record: &csv::StringRecord) -> TAResult<()> {
        self.writer.write_record(record)?;
        self.rows += 1;
        Ok(())
    }

    /// Number of data rows written so far, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn flush(&mut self) -> TAResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flush and hand back the underlying sink.
    pub fn into_inner(self) -> TAResult<W> {
        self.writer.into_inner().map_err(|e| {
            let err = e.error();
            crate::TAError::Io(std::io::Error::new(err.kind(), err.to_string()))
        })
    }
}
