use std::{fs::File, io::Read};

use crate::{
    rows::{Row, Rows},
    trace_parser::{SourceRecord, NANOS_PER_SEC},
    TAResult,
};

/// Parser for Systor '17 LUN traces.
///
/// trace format:
/// lun, timestamp (seconds), iotype, offset, size (bytes)
pub struct LunTraceParser<R: Read = File> {
    rows: Rows<R>,
}

impl<R: Read> LunTraceParser<R> {
    pub fn new(source: R) -> Self {
        LunTraceParser {
            rows: Rows::new(source),
        }
    }

    fn parse_row(row: &Row) -> TAResult<SourceRecord> {
        row.require_columns(5)?;
        let secs: f64 = row.parse(1, "timestamp")?;
        Ok(SourceRecord {
            timestamp_ns: secs * NANOS_PER_SEC,
            io_type: row.str(2).to_owned(),
            address: row.str(3).to_owned(),
            size: row.parse(4, "size")?,
            line: row.line,
        })
    }
}

impl<R: Read> Iterator for LunTraceParser<R> {
    type Item = TAResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.rows.next()?.and_then(|row| Self::parse_row(&row)))
    }
}

impl<R: Read> super::TraceParser for LunTraceParser<R> {}

#[test]
fn test_luntrace() {
    const FILE_DATA: &str = "0,1.000513,W,7860736,4096

2,1.25,R,2809664,65536
2,1.5 ,r,0,0
";
    let mut parser = LunTraceParser::new(FILE_DATA.as_bytes());
    assert_eq!(
        parser.next().unwrap().unwrap(),
        SourceRecord {
            timestamp_ns: 1.000513 * NANOS_PER_SEC,
            io_type: "W".into(),
            address: "7860736".into(),
            size: 4096,
            line: 1,
        }
    );
    assert_eq!(
        parser.next().unwrap().unwrap(),
        SourceRecord {
            timestamp_ns: 1_250_000_000.0,
            io_type: "R".into(),
            address: "2809664".into(),
            size: 65536,
            line: 3,
        }
    );
    let last = parser.next().unwrap().unwrap();
    assert_eq!(last.timestamp_ns, 1_500_000_000.0);
    assert_eq!(last.io_type, "r");
    assert_eq!(last.size, 0);
    assert!(parser.next().is_none());
}

#[test]
fn test_luntrace_malformed() {
    let mut parser = LunTraceParser::new("0,1.0,R,0\n0,abc,R,0,512\n0,1.0,R,0,-512\n".as_bytes());
    let err = parser.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("at least 5 columns"));
    let err = parser.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("timestamp"));
    let err = parser.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("size"));
    assert!(parser.next().is_none());
}
