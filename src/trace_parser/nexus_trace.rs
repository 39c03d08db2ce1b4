use std::{fs::File, io::Read};

use crate::{
    rows::{Row, Rows},
    trace_parser::{sector_size, SourceRecord, NANOS_PER_SEC},
    TAResult,
};

/// Parser for Nexus traces, tab separated with padding columns.
///
/// trace format (empty columns dropped):
/// offset, size (sectors), _, flags (odd is read), _, _, timestamp (seconds)
pub struct NexusTraceParser<R: Read = File> {
    rows: Rows<R>,
}

impl<R: Read> NexusTraceParser<R> {
    pub fn new(source: R) -> Self {
        NexusTraceParser {
            rows: Rows::squeezed(source, b'\t'),
        }
    }

    fn parse_row(row: &Row) -> TAResult<SourceRecord> {
        row.require_columns(7)?;
        let secs: f64 = row.parse(6, "timestamp")?;
        let flags: i64 = row.parse(3, "iotype")?;
        let io_type = if flags % 2 != 0 { "R" } else { "W" };
        Ok(SourceRecord {
            timestamp_ns: secs * NANOS_PER_SEC,
            io_type: io_type.to_owned(),
            address: row.str(0).to_owned(),
            size: sector_size(row, 1)?,
            line: row.line,
        })
    }
}

impl<R: Read> Iterator for NexusTraceParser<R> {
    type Item = TAResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.rows.next()?.and_then(|row| Self::parse_row(&row)))
    }
}

impl<R: Read> super::TraceParser for NexusTraceParser<R> {}

#[test]
fn test_nexustrace() {
    const FILE_DATA: &str = "1204224\t8\t\t0\t2\t\t77\t0\t0.001202
1204232\t\t16\t\t1\t3\t77\t0\t0.5

7\t1\t0\t-3\t0\t0\t2.25\t9
";
    let records = NexusTraceParser::new(FILE_DATA.as_bytes())
        .collect::<TAResult<Vec<_>>>()
        .unwrap();
    assert_eq!(
        records
            .iter()
            .map(|r| (r.address.as_str(), r.io_type.as_str(), r.size, r.line))
            .collect::<Vec<_>>(),
        vec![
            ("1204224", "W", 8 * 512, 1),
            ("1204232", "R", 16 * 512, 2),
            ("7", "R", 512, 4)
        ]
    );
    assert_eq!(records[1].timestamp_ns, 0.5 * NANOS_PER_SEC);
    assert_eq!(records[2].timestamp_ns, 2.25 * NANOS_PER_SEC);
}

#[test]
fn test_nexustrace_short_row() {
    let mut parser = NexusTraceParser::new("1\t2\t3\n".as_bytes());
    let err = parser.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("at least 7 columns"));
}
