use std::{fs::File, io::Read};

use crate::{
    rows::{Row, Rows},
    trace_parser::{sector_size, SourceRecord, NANOS_PER_SEC},
    TAResult,
};

/// Parser for Tencent CBS block traces.
///
/// trace format:
/// timestamp (seconds), offset, size (sectors), iotype (0 is read), volume id
pub struct TencentTraceParser<R: Read = File> {
    rows: Rows<R>,
}

impl<R: Read> TencentTraceParser<R> {
    pub fn new(source: R) -> Self {
        TencentTraceParser {
            rows: Rows::new(source),
        }
    }

    fn parse_row(row: &Row) -> TAResult<SourceRecord> {
        row.require_columns(5)?;
        let secs: f64 = row.parse(0, "timestamp")?;
        let size = sector_size(row, 2)?;
        let io_type = if row.str(3) == "0" { "R" } else { "W" };
        Ok(SourceRecord {
            timestamp_ns: secs * NANOS_PER_SEC,
            io_type: io_type.to_owned(),
            address: row.str(1).to_owned(),
            size,
            line: row.line,
        })
    }
}

impl<R: Read> Iterator for TencentTraceParser<R> {
    type Item = TAResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.rows.next()?.and_then(|row| Self::parse_row(&row)))
    }
}

impl<R: Read> super::TraceParser for TencentTraceParser<R> {}

#[test]
fn test_tencenttrace() {
    const FILE_DATA: &str = "1538323200,12551192,8,1,1283
1538323200,12550992,16,0,1283
1538323201,102,1,2,7
";
    let records = TencentTraceParser::new(FILE_DATA.as_bytes())
        .collect::<TAResult<Vec<_>>>()
        .unwrap();
    assert_eq!(
        records
            .iter()
            .map(|r| (r.address.as_str(), r.io_type.as_str(), r.size))
            .collect::<Vec<_>>(),
        vec![
            ("12551192", "W", 8 * 512),
            ("12550992", "R", 16 * 512),
            ("102", "W", 512)
        ]
    );
    assert_eq!(records[0].timestamp_ns, 1_538_323_200.0 * NANOS_PER_SEC);
    assert_eq!(records[2].line, 3);
}
