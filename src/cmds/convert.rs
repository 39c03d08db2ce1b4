use std::path::{Path, PathBuf};

use crate::{
    atf::{AtfWriter, BLOCK_SIZE},
    converter::{Converter, RebaseMode},
    trace_parser::{self, SourceFormat, TraceParser},
    TAError, TAResult,
};

/// Converts one source trace file into an ATF file.
#[derive(Debug, Default)]
pub struct Conversion {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    format: SourceFormat,
    rebase_mode: RebaseMode,
    block_size: Option<u64>,
    keep_partial: bool,
    progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    /// Data rows written, header excluded.
    pub rows: u64,
    /// Times the time origin moved to an earlier record.
    pub rebases: u64,
    /// Total bytes accessed by the converted records.
    pub bytes: u64,
}

impl Conversion {
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

    pub fn format(&mut self, format: SourceFormat) -> &mut Self {
        self.format = format;
        self
    }

    pub fn rebase_mode(&mut self, rebase_mode: RebaseMode) -> &mut Self {
        self.rebase_mode = rebase_mode;
        self
    }

    pub fn block_size(&mut self, block_size: u64) -> &mut Self {
        self.block_size = Some(block_size);
        self
    }

    /// Leave the partially written output on disk when the conversion fails.
    pub fn keep_partial(&mut self, keep_partial: bool) -> &mut Self {
        self.keep_partial = keep_partial;
        self
    }

    pub fn progress(&mut self, progress: bool) -> &mut Self {
        self.progress = progress;
        self
    }

    pub fn run(&self) -> TAResult<ConversionSummary> {
        let input = self
            .input
            .as_deref()
            .ok_or_else(|| TAError::invalid_arg("input path not set"))?;
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| super::atf_output_path(input));
        let block_size = self.block_size.unwrap_or(BLOCK_SIZE);
        if block_size == 0 {
            return Err(TAError::invalid_arg("block size must be non-zero"));
        }
        log::info!(
            "converting {} ({}) into {}",
            input.display(),
            self.format,
            output.display()
        );
        log::debug!("block size: {block_size}, rebase mode: {}", self.rebase_mode);
        let parser = trace_parser::open(self.format, input)?;
        let sink = super::create_output(&output)?;
        // from here on the output file is ours to clean up
        let result = self.stream(parser, sink, block_size);
        if let Err(ref e) = result {
            if self.keep_partial {
                log::warn!("conversion failed, partial output kept at {}", output.display());
            } else {
                log::warn!("conversion failed, removing {}", output.display());
                if let Err(rm_err) = std::fs::remove_file(&output) {
                    log::warn!("fail to remove {}: {rm_err}", output.display());
                }
            }
            log::debug!("conversion error: {e}");
        }
        let (rows, rebases, bytes) = result?;
        log::info!(
            "converted {rows} rows ({}) into {}, time origin moved {rebases} times",
            bytesize::ByteSize::b(bytes),
            output.display()
        );
        Ok(ConversionSummary {
            output,
            rows,
            rebases,
            bytes,
        })
    }

    fn stream(
        &self,
        parser: Box<dyn TraceParser>,
        sink: impl std::io::Write,
        block_size: u64,
    ) -> TAResult<(u64, u64, u64)> {
        let mut converter = Converter::new(parser)
            .rebase_mode(self.rebase_mode)
            .block_size(block_size);
        let mut writer = AtfWriter::new(sink)?;
        let bar = super::progress_bar(self.progress, "converting...");
        let mut bytes = 0_u64;
        for record in converter.by_ref() {
            let record = record?;
            bytes = bytes.saturating_add(record.size * block_size);
            writer.write(&record)?;
            bar.inc(1);
        }
        writer.flush()?;
        bar.finish_and_clear();
        Ok((writer.rows(), converter.rebases(), bytes))
    }
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use super::Conversion;
    use crate::{converter::RebaseMode, trace_parser::SourceFormat};

    fn write_trace(dir: &Path, data: &str) -> PathBuf {
        let path = dir.join("2016022219-LUN0.csv");
        std::fs::write(&path, data).unwrap();
        path
    }

    fn read_rows(path: &Path) -> Vec<String> {
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.ends_with("\r\n"));
        content
            .trim_end_matches("\r\n")
            .split("\r\n")
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn convert_lun_trace() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(
            dir.path(),
            "0,10.0,R,7860736,4096\n0,5.0,W,2809664,512\n0,20.0,R,0,65536\n",
        );
        let summary = Conversion::new().input(&input).run().unwrap();
        assert_eq!(summary.output, dir.path().join("2016022219-LUN0.csv.atf"));
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.rebases, 1);
        assert_eq!(summary.bytes, 4096 + 512 + 65536);
        assert_eq!(
            read_rows(&summary.output),
            vec![
                "#Address,Timestamp,IOType,Size,Cost",
                "7860736,0,R,8,1",
                "2809664,-5000000000,W,1,1",
                "0,15000000000,R,128,1",
            ]
        );
    }

    #[test]
    fn convert_with_immediate_rebase() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(
            dir.path(),
            "0,10.0,R,1,512\n0,5.0,R,2,512\n0,20.0,R,3,512\n",
        );
        let summary = Conversion::new()
            .input(&input)
            .rebase_mode(RebaseMode::Immediate)
            .run()
            .unwrap();
        let timestamps = read_rows(&summary.output)
            .iter()
            .skip(1)
            .map(|row| row.split(',').nth(1).unwrap().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(timestamps, vec!["0", "0", "15000000000"]);
    }

    #[test]
    fn empty_trace_gives_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(dir.path(), "");
        let summary = Conversion::new().input(&input).run().unwrap();
        assert_eq!(summary.rows, 0);
        assert_eq!(
            read_rows(&summary.output),
            vec!["#Address,Timestamp,IOType,Size,Cost"]
        );
    }

    #[test]
    fn invalid_size_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(dir.path(), "0,1.0,R,0,512\n0,2.0,R,0,1000\n");
        let output = dir.path().join("out.atf");
        let err = Conversion::new()
            .input(&input)
            .output(&output)
            .run()
            .unwrap_err();
        assert!(err.is_invalid_size());
        assert!(!output.exists());
    }

    #[test]
    fn invalid_size_keeps_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(dir.path(), "0,1.0,R,0,512\n0,2.0,R,0,1000\n");
        let output = dir.path().join("out.atf");
        let err = Conversion::new()
            .input(&input)
            .output(&output)
            .keep_partial(true)
            .run()
            .unwrap_err();
        assert!(err.is_invalid_size());
        assert_eq!(
            read_rows(&output),
            vec!["#Address,Timestamp,IOType,Size,Cost", "0,0,R,1,1"]
        );
    }

    #[test]
    fn convert_tencent_trace() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(
            dir.path(),
            "1538323200,12551192,8,1,1283\n1538323201,12550992,16,0,1283\n",
        );
        let summary = Conversion::new()
            .input(&input)
            .format(SourceFormat::Tencent)
            .run()
            .unwrap();
        assert_eq!(
            read_rows(&summary.output),
            vec![
                "#Address,Timestamp,IOType,Size,Cost",
                "12551192,0,W,8,1",
                "12550992,1000000000,R,16,1",
            ]
        );
    }

    #[test]
    fn invalid_size_line_counts_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(dir.path(), "0,1.0,R,0,512\n\n\n0,2.0,R,0,1000\n");
        let err = Conversion::new()
            .input(&input)
            .output(dir.path().join("out.atf"))
            .run()
            .unwrap_err();
        match err {
            crate::TAError::InvalidSize { size, line, .. } => {
                assert_eq!(size, 1000);
                assert_eq!(line, 4);
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[test]
    fn failed_open_leaves_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("precious.atf");
        std::fs::write(&output, "keep me").unwrap();
        let err = Conversion::new()
            .input(dir.path().join("none.csv"))
            .output(&output)
            .run()
            .unwrap_err();
        assert!(err.into_io_err().is_some());
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");
    }

    #[test]
    fn address_and_io_type_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_trace(dir.path(), "0,1.0, W ,\"a,b\",512\n0,2.0,R, 7 ,1024\n");
        let summary = Conversion::new().input(&input).run().unwrap();
        assert_eq!(
            read_rows(&summary.output),
            vec![
                "#Address,Timestamp,IOType,Size,Cost",
                "\"a,b\",0, W ,1,1",
                " 7 ,1000000000,R,2,1",
            ]
        );
    }

    #[test]
    fn missing_input() {
        assert!(Conversion::new().run().is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(Conversion::new()
            .input(dir.path().join("none.csv"))
            .run()
            .unwrap_err()
            .into_io_err()
            .is_some());
    }
}
