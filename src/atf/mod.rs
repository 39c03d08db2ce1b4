//! The ATF trace format: one access per row, `Address,Timestamp,IOType,Size,Cost`,
//! preceded by a single `#`-prefixed header row.

mod reader;
mod writer;

pub use reader::AtfReader;
pub use writer::AtfWriter;

/// Unit in bytes that the `Size` column counts.
pub const BLOCK_SIZE: u64 = 512;

/// Header row of every ATF file written by this crate.
pub const HEADER: [&str; 5] = ["#Address", "Timestamp", "IOType", "Size", "Cost"];

/// Cost assigned to every converted access.
pub const UNIT_COST: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtfRecord {
    pub address: String,
    /// Nanoseconds since the time origin of the trace. May be negative.
    pub timestamp: i64,
    pub io_type: String,
    /// Access size in blocks.
    pub size: u64,
    pub cost: u64,
}

impl AtfRecord {
    fn to_fields(&self) -> [String; 5] {
        [
            self.address.clone(),
            self.timestamp.to_string(),
            self.io_type.clone(),
            self.size.to_string(),
            self.cost.to_string(),
        ]
    }
}

/// CRLF rows with minimal quoting. Rows may differ in length from the header.
pub(crate) fn csv_writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .quote_style(csv::QuoteStyle::Necessary);
    builder
}
