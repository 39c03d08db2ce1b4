use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    atf::{AtfReader, AtfWriter},
    TAError, TAResult,
};

/// Rewrites an ATF file so that every distinct address becomes a dense id.
///
/// Ids start at 0 and follow the order in which addresses first appear. The header
/// row and all other columns, extra ones included, are copied as text.
#[derive(Debug, Default)]
pub struct OffsetReducer {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceSummary {
    pub output: PathBuf,
    pub rows: u64,
    pub distinct: usize,
}

impl OffsetReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, input: impl AsRef<Path>) -> &mut Self {
        self.input = Some(input.as_ref().to_path_buf());
        self
    }

    /// Defaults to `<input>.atf`.
    pub fn output(&mut self, output: impl AsRef<Path>) -> &mut Self {
        self.output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn run(&self) -> TAResult<ReduceSummary> {
        let input = self
            .input
            .as_deref()
            .ok_or_else(|| TAError::invalid_arg("input path not set"))?;
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| super::atf_output_path(input));
        log::info!("reducing offsets of {} into {}", input.display(), output.display());
        let reader = AtfReader::open(input)?;
        let mut writer = AtfWriter::with_header(super::create_output(&output)?, reader.header())?;
        let mut ids: HashMap<String, u64> = HashMap::new();
        for row in reader.into_rows() {
            let row = row?;
            let mut fields = row.record.iter();
            let address = fields.next().unwrap_or_default();
            let next_id = ids.len() as u64;
            let id = ids.entry(address.to_owned()).or_insert(next_id).to_string();
            let reduced = std::iter::once(id.as_str())
                .chain(fields)
                .collect::<csv::StringRecord>();
            writer.write_raw(&reduced)?;
        }
        writer.flush()?;
        log::info!("{} rows, {} distinct addresses", writer.rows(), ids.len());
        Ok(ReduceSummary {
            output,
            rows: writer.rows(),
            distinct: ids.len(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::OffsetReducer;

    #[test]
    fn dense_ids_in_first_appearance_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("testLUN.atf");
        std::fs::write(
            &input,
            "#Address,Timestamp,IOtype,Size,Cost\n\
             7860736,0,R,8,1\n\
             2809664,100,W,1,1\n\
             7860736,200,R,8,1\n\
             4096,300,R,2,3\n",
        )
        .unwrap();
        let summary = OffsetReducer::new().input(&input).run().unwrap();
        assert_eq!(summary.output, dir.path().join("testLUN.atf.atf"));
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.distinct, 3);
        assert_eq!(
            std::fs::read_to_string(&summary.output).unwrap(),
            "#Address,Timestamp,IOtype,Size,Cost\r\n\
             0,0,R,8,1\r\n\
             1,100,W,1,1\r\n\
             0,200,R,8,1\r\n\
             2,300,R,2,3\r\n"
        );
    }

    #[test]
    fn other_columns_copied_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("costs.atf");
        std::fs::write(
            &input,
            "#Address,Timestamp,IOType,Size,Cost\n\
             7, 100,R,8,0.5\n\
             \n\
             9,x, W ,1,1,extra\n\
             7,300,R\n",
        )
        .unwrap();
        let summary = OffsetReducer::new()
            .input(&input)
            .output(dir.path().join("out.atf"))
            .run()
            .unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.distinct, 2);
        assert_eq!(
            std::fs::read_to_string(&summary.output).unwrap(),
            "#Address,Timestamp,IOType,Size,Cost\r\n\
             0, 100,R,8,0.5\r\n\
             1,x, W ,1,1,extra\r\n\
             0,300,R\r\n"
        );
    }

    #[test]
    fn missing_header() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.atf");
        std::fs::write(&input, "").unwrap();
        assert!(OffsetReducer::new()
            .input(&input)
            .output(dir.path().join("out.atf"))
            .run()
            .is_err());
    }
}
