use std::{fs::File, io::Read};

use crate::{
    rows::{Row, Rows},
    trace_parser::{sector_size, SourceRecord, NANOS_PER_SEC},
    TAResult,
};

/// Parser for the default text output of `blkparse`.
///
/// trace format (space aligned):
/// dev, cpu, seq, timestamp (seconds), pid, action, rwbs, sector, +, sectors, extra
///
/// Rows with fewer than 11 columns carry no complete access and are skipped. The
/// per-CPU summary that `blkparse` appends ends the trace.
pub struct BlktraceParser<R: Read = File> {
    rows: Rows<R>,
    done: bool,
}

impl<R: Read> BlktraceParser<R> {
    pub fn new(source: R) -> Self {
        BlktraceParser {
            rows: Rows::squeezed(source, b' '),
            done: false,
        }
    }

    fn parse_row(row: &Row) -> TAResult<SourceRecord> {
        let secs: f64 = row.parse(3, "timestamp")?;
        let io_type = if row.str(6).contains('R') { "R" } else { "W" };
        Ok(SourceRecord {
            timestamp_ns: secs * NANOS_PER_SEC,
            io_type: io_type.to_owned(),
            address: row.str(7).to_owned(),
            size: sector_size(row, 9)?,
            line: row.line,
        })
    }
}

impl<R: Read> Iterator for BlktraceParser<R> {
    type Item = TAResult<SourceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => return Some(Err(e)),
            };
            if row.str(0).contains("CPU") {
                log::debug!("blkparse summary at line {}, stop parsing", row.line);
                self.done = true;
                break;
            }
            if row.record.len() <= 10 {
                continue;
            }
            return Some(Self::parse_row(&row));
        }
        None
    }
}

impl<R: Read> super::TraceParser for BlktraceParser<R> {}

#[test]
fn test_blktrace() {
    const FILE_DATA: &str = "  8,0    3        1     0.000000000   697  A   W 223490 + 8 <- (8,1) 223426
  8,0    3        2     0.000001230   697  Q   W 223490 + 8 [kworker/3:1]
  8,0    3        3     0.000005470   697  G   W 223490 + 8 [kworker/3:1]
  8,0    3        4     0.000007040   697  P   N [kworker/3:1]
  8,0    1        5     0.250000000  1204  Q  RM 1024 + 16 [cat]

CPU0 (8,0):
 Reads Queued:           1,        8KiB	 Writes Queued:           3,       12KiB
  8,0    1        6     0.500000000  1204  Q   R 1040 + 16 [cat]
";
    let records = BlktraceParser::new(FILE_DATA.as_bytes())
        .collect::<TAResult<Vec<_>>>()
        .unwrap();
    assert_eq!(
        records
            .iter()
            .map(|r| (r.address.as_str(), r.io_type.as_str(), r.size, r.line))
            .collect::<Vec<_>>(),
        vec![
            ("223490", "W", 8 * 512, 1),
            ("223490", "W", 8 * 512, 2),
            ("223490", "W", 8 * 512, 3),
            ("1024", "R", 16 * 512, 5)
        ]
    );
    assert_eq!(records[3].timestamp_ns, 0.25 * NANOS_PER_SEC);
}

#[test]
fn test_blktrace_bad_sector_count() {
    let mut parser =
        BlktraceParser::new("  8,0 3 1 0.1 697 Q W 223490 + x [kworker/3:1]\n".as_bytes());
    let err = parser.next().unwrap().unwrap_err();
    assert!(err.to_string().contains("size"));
    assert!(parser.next().is_none());
}
