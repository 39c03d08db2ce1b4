//! Line oriented delimited rows without a header.
//!
//! Each physical line is one record, so the line number reported for a row is
//! its line in the file, blank lines included.

use std::io::{BufRead, BufReader, Read};

use crate::{TAError, TAResult};

pub(crate) struct Rows<R: Read> {
    lines: std::io::Lines<BufReader<R>>,
    line: u64,
    delimiter: u8,
    squeeze: bool,
}

impl<R: Read> Rows<R> {
    /// Comma separated rows.
    pub(crate) fn new(source: R) -> Self {
        Rows {
            lines: BufReader::new(source).lines(),
            line: 0,
            delimiter: b',',
            squeeze: false,
        }
    }

    /// Rows split on `delimiter` where runs of delimiters count as one, as in
    /// column aligned text dumps.
    pub(crate) fn squeezed(source: R, delimiter: u8) -> Self {
        Rows {
            delimiter,
            squeeze: true,
            ..Rows::new(source)
        }
    }

    fn split(&self, text: &str) -> TAResult<csv::StringRecord> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());
        let mut record = csv::StringRecord::new();
        reader.read_record(&mut record)?;
        if self.squeeze {
            record = record.iter().filter(|f| !f.is_empty()).collect();
        }
        Ok(record)
    }
}

impl<R: Read> Iterator for Rows<R> {
    type Item = TAResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;
            let record = match self.split(&text) {
                Ok(record) => record,
                Err(e) => return Some(Err(e)),
            };
            if record.iter().all(|f| f.trim().is_empty()) {
                // skip whitespace line
                continue;
            }
            return Some(Ok(Row {
                record,
                line: self.line,
            }));
        }
    }
}

pub(crate) struct Row {
    pub(crate) record: csv::StringRecord,
    /// 1-based line in the source.
    pub(crate) line: u64,
}

impl Row {
    pub(crate) fn require_columns(&self, n: usize) -> TAResult<()> {
        if self.record.len() < n {
            return Err(TAError::parse(
                self.line,
                "row",
                format!("expected at least {n} columns, found {}", self.record.len()),
            ));
        }
        Ok(())
    }

    pub(crate) fn str(&self, idx: usize) -> &str {
        self.record.get(idx).unwrap_or_default()
    }

    pub(crate) fn parse<T>(&self, idx: usize, name: &str) -> TAResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.str(idx)
            .trim()
            .parse()
            .map_err(|e: T::Err| TAError::parse(self.line, name, e))
    }
}
