use std::{fs::File, path::Path};

use crate::{rows::Row, TAError, TAResult};

mod ali_trace;
mod blktrace;
mod lun_trace;
mod nexus_trace;
mod tencent_trace;

pub use ali_trace::AliTraceParser;
pub use blktrace::BlktraceParser;
pub use lun_trace::LunTraceParser;
pub use nexus_trace::NexusTraceParser;
pub use tencent_trace::TencentTraceParser;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;
const NANOS_PER_MICRO: f64 = 1_000.0;
const SECTOR_SIZE: u64 = 512;

/// Layout of the source trace.
#[derive(Debug, Default, serde::Deserialize, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SourceFormat {
    /// Systor '17 LUN traces (SNIA-IOTTA).
    #[default]
    Systor17,
    /// Tencent CBS block traces, sizes in 512-byte sectors.
    Tencent,
    /// Alibaba block traces, timestamps in microseconds.
    Alibaba,
    /// Tab separated Nexus traces, sizes in 512-byte sectors.
    Nexus,
    /// `blkparse` text output, sizes in 512-byte sectors.
    Blktrace,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Systor17 => f.write_str("systor17"),
            SourceFormat::Tencent => f.write_str("tencent"),
            SourceFormat::Alibaba => f.write_str("alibaba"),
            SourceFormat::Nexus => f.write_str("nexus"),
            SourceFormat::Blktrace => f.write_str("blktrace"),
        }
    }
}

/// One access parsed from a source trace, independent of the source layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    /// Source timestamp scaled to nanoseconds, not yet rebased.
    pub timestamp_ns: f64,
    pub io_type: String,
    pub address: String,
    /// Access size in bytes.
    pub size: u64,
    /// 1-based line in the source file.
    pub line: u64,
}

pub trait TraceParser: Iterator<Item = TAResult<SourceRecord>> {}

/// Open `path` with the parser matching `format`.
pub fn open(format: SourceFormat, path: &Path) -> TAResult<Box<dyn TraceParser>> {
    let file = File::open(path)?;
    log::debug!("parsing {} as {format} trace", path.display());
    Ok(match format {
        SourceFormat::Systor17 => Box::new(LunTraceParser::new(file)),
        SourceFormat::Tencent => Box::new(TencentTraceParser::new(file)),
        SourceFormat::Alibaba => Box::new(AliTraceParser::new(file)),
        SourceFormat::Nexus => Box::new(NexusTraceParser::new(file)),
        SourceFormat::Blktrace => Box::new(BlktraceParser::new(file)),
    })
}

/// Size column counted in sectors, returned in bytes.
fn sector_size(row: &Row, idx: usize) -> TAResult<u64> {
    let sectors: u64 = row.parse(idx, "size")?;
    sectors
        .checked_mul(SECTOR_SIZE)
        .ok_or_else(|| TAError::parse(row.line, "size", "sector count overflows"))
}
