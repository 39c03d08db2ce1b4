use std::{fs::File, io::Read};

use crate::{
    rows::{Row, Rows},
    trace_parser::{SourceRecord, NANOS_PER_MICRO},
    TAResult,
};

/// Parser for Alibaba block traces.
pub struct AliTraceParser<R: Read = File> {
    rows: Rows<R>,
}

impl<R: Read> AliTraceParser<R> {
    pub fn new(source: R) -> Self {
        AliTraceParser {
            rows: Rows::new(source),
        }
    }

    fn parse_row(row: &Row) -> TAResult<SourceRecord> {
        // trace format:
        // device_id, operation, offset, len, timestamp (microseconds)
        row.require_columns(5)?;
        let micros: f64 = row.parse(4, "timestamp")?;
        Ok(SourceRecord {
            timestamp_ns: micros * NANOS_PER_MICRO,
            io_type: row.str(1).to_owned(),
            address: row.str(2).to_owned(),
            size: row.parse(3, "size")?,
            line: row.line,
        })
    }
}

impl<R: Read> Iterator for AliTraceParser<R> {
    type Item = TAResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.rows.next()?.and_then(|row| Self::parse_row(&row)))
    }
}

impl<R: Read> super::TraceParser for AliTraceParser<R> {}

#[test]
fn test_alitrace() {
    let dir = tempfile::tempdir().unwrap();
    let f_path = {
        let mut dir = dir.path().to_owned();
        dir.push("TEST.csv");
        dir
    };
    let mut f = std::fs::File::create(f_path.as_path()).unwrap();
    const FILE_DATA: &'static str = "0,W,99243462656,4096,1577808000218468

0,R,101600702464,4096,1577808000218510


0,W,275691458560,1024,1577808000218545

1,4

    ";
    std::io::Write::write_all(&mut f, FILE_DATA.as_bytes()).unwrap();
    drop(f);
    let mut parser = AliTraceParser::new(std::fs::File::open(f_path.as_path()).unwrap());
    assert_eq!(
        parser.next().unwrap().unwrap(),
        SourceRecord {
            timestamp_ns: 1577808000218468.0 * NANOS_PER_MICRO,
            io_type: "W".into(),
            address: "99243462656".into(),
            size: 4096,
            line: 1,
        }
    );
    assert_eq!(
        parser.next().unwrap().unwrap(),
        SourceRecord {
            timestamp_ns: 1577808000218510.0 * NANOS_PER_MICRO,
            io_type: "R".into(),
            address: "101600702464".into(),
            size: 4096,
            line: 3,
        }
    );
    let third = parser.next().unwrap().unwrap();
    assert_eq!(third.address, "275691458560");
    assert_eq!(third.size, 1024);
    // "1,4" is a truncated row
    assert!(parser.next().unwrap().is_err());
    assert!(parser.next().is_none());
}
