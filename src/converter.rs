//! Turns parsed source records into ATF records.
//!
//! Timestamps are made relative to a time origin taken from the first record.
//! Sizes are converted from bytes to blocks and must be an exact multiple of the
//! block size.

use crate::{
    atf::{AtfRecord, BLOCK_SIZE, UNIT_COST},
    trace_parser::SourceRecord,
    TAError, TAResult,
};

/// What happens to the time origin when a record lies before it.
#[derive(Debug, Default, serde::Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RebaseMode {
    /// The record keeps its negative elapsed time, the origin moves for the records after it.
    #[default]
    Deferred,
    /// The origin moves to the record itself, which is emitted at time 0.
    Immediate,
}

impl std::fmt::Display for RebaseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RebaseMode::Deferred => f.write_str("deferred"),
            RebaseMode::Immediate => f.write_str("immediate"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TimeOrigin {
    AwaitingFirstRecord,
    Streaming { origin_ns: f64 },
}

/// Iterator adapter from [`SourceRecord`]s to [`AtfRecord`]s.
///
/// The first error, either from upstream or from size validation, is yielded once
/// and ends the stream.
pub struct Converter<I> {
    records: I,
    origin: TimeOrigin,
    rebase_mode: RebaseMode,
    block_size: u64,
    rebases: u64,
    failed: bool,
}

impl<I> Converter<I>
where
    I: Iterator<Item = TAResult<SourceRecord>>,
{
    pub fn new(records: I) -> Self {
        Converter {
            records,
            origin: TimeOrigin::AwaitingFirstRecord,
            rebase_mode: RebaseMode::default(),
            block_size: BLOCK_SIZE,
            rebases: 0,
            failed: false,
        }
    }

    pub fn rebase_mode(mut self, rebase_mode: RebaseMode) -> Self {
        self.rebase_mode = rebase_mode;
        self
    }

    /// # Panics
    /// If `block_size` is zero.
    pub fn block_size(mut self, block_size: u64) -> Self {
        assert_ne!(block_size, 0, "block size must be non-zero");
        self.block_size = block_size;
        self
    }

    /// How many times the time origin has moved so far.
    pub fn rebases(&self) -> u64 {
        self.rebases
    }

    /// Nanoseconds elapsed since the origin, truncated toward zero.
    fn elapsed(&mut self, timestamp_ns: f64) -> i64 {
        let origin_ns = match self.origin {
            TimeOrigin::AwaitingFirstRecord => {
                self.origin = TimeOrigin::Streaming {
                    origin_ns: timestamp_ns,
                };
                return 0;
            }
            TimeOrigin::Streaming { origin_ns } => origin_ns,
        };
        let elapsed = (timestamp_ns - origin_ns) as i64;
        if elapsed >= 0 {
            return elapsed;
        }
        log::debug!(
            "rebasing time origin from {origin_ns} to {timestamp_ns} ({})",
            self.rebase_mode
        );
        self.origin = TimeOrigin::Streaming {
            origin_ns: timestamp_ns,
        };
        self.rebases += 1;
        match self.rebase_mode {
            RebaseMode::Deferred => elapsed,
            RebaseMode::Immediate => 0,
        }
    }

    fn convert(&mut self, record: SourceRecord) -> TAResult<AtfRecord> {
        let timestamp = self.elapsed(record.timestamp_ns);
        if record.size % self.block_size != 0 {
            return Err(TAError::InvalidSize {
                size: record.size,
                block_size: self.block_size,
                line: record.line,
            });
        }
        Ok(AtfRecord {
            address: record.address,
            timestamp,
            io_type: record.io_type,
            size: record.size / self.block_size,
            cost: UNIT_COST,
        })
    }
}

impl<I> Iterator for Converter<I>
where
    I: Iterator<Item = TAResult<SourceRecord>>,
{
    type Item = TAResult<AtfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let converted = self.records.next()?.and_then(|record| self.convert(record));
        self.failed = converted.is_err();
        Some(converted)
    }
}
