use std::path::{Path, PathBuf};

use crate::{
    atf::{csv_writer_builder, AtfReader},
    stats::{frequency_histogram, stack_distances},
    TAError, TAResult,
};

/// Writes the address frequency histogram and the stack distance histogram of an
/// ATF file as two CSV files.
#[derive(Debug, Default)]
pub struct TraceStats {
    input: Option<PathBuf>,
    frequency_output: Option<PathBuf>,
    distance_output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSummary {
    pub frequency_output: PathBuf,
    pub distance_output: PathBuf,
    pub accesses: u64,
    pub distinct: u64,
    /// Accesses that touch an address for the first time.
    pub infinities: u64,
}

impl TraceStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, input: impl AsRef<Path>) -> &mut Self {
        self.input = Some(input.as_ref().to_path_buf());
        self
    }

    /// Defaults to `<input>.freq.csv`.
    pub fn frequency_output(&mut self, output: impl AsRef<Path>) -> &mut Self {
        self.frequency_output = Some(output.as_ref().to_path_buf());
        self
    }

    /// Defaults to `<input>.dist.csv`.
    pub fn distance_output(&mut self, output: impl AsRef<Path>) -> &mut Self {
        self.distance_output = Some(output.as_ref().to_path_buf());
        self
    }

    pub fn run(&self) -> TAResult<StatsSummary> {
        let input = self
            .input
            .as_deref()
            .ok_or_else(|| TAError::invalid_arg("input path not set"))?;
        let frequency_output = self
            .frequency_output
            .clone()
            .unwrap_or_else(|| with_suffix(input, ".freq.csv"));
        let distance_output = self
            .distance_output
            .clone()
            .unwrap_or_else(|| with_suffix(input, ".dist.csv"));
        log::info!("collecting stats of {}", input.display());
        let addresses = AtfReader::open(input)?
            .map(|record| record.map(|r| r.address))
            .collect::<TAResult<Vec<_>>>()?;

        let frequencies = frequency_histogram(addresses.iter());
        let mut writer = csv_writer_builder().from_writer(super::create_output(&frequency_output)?);
        writer.write_record(["Address", "Count"])?;
        for (address, count) in &frequencies {
            writer.write_record([address.as_str(), count.to_string().as_str()])?;
        }
        writer.flush()?;

        let (counts, infinities) = stack_distances(addresses.iter()).histogram();
        let mut writer = csv_writer_builder().from_writer(super::create_output(&distance_output)?);
        writer.write_record(["Distance", "Count"])?;
        for (distance, count) in counts.iter().enumerate() {
            writer.write_record([distance.to_string(), count.to_string()])?;
        }
        writer.write_record(["inf".to_owned(), infinities.to_string()])?;
        writer.flush()?;

        log::info!(
            "{} accesses, {} distinct addresses, written to {} and {}",
            addresses.len(),
            frequencies.len(),
            frequency_output.display(),
            distance_output.display()
        );
        Ok(StatsSummary {
            frequency_output,
            distance_output,
            accesses: addresses.len() as u64,
            distinct: frequencies.len() as u64,
            infinities,
        })
    }
}

fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let mut path = input.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

#[cfg(test)]
mod test {
    use super::TraceStats;

    #[test]
    fn histograms_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("small.atf");
        std::fs::write(
            &input,
            "#Address,Timestamp,IOType,Size,Cost\n\
             0,0,R,1,1\n0,1,R,1,1\n1,2,R,1,1\n0,3,R,1,1\n\
             3,4,R,1,1\n0,5,R,1,1\n1,6,R,1,1\n",
        )
        .unwrap();
        let summary = TraceStats::new().input(&input).run().unwrap();
        assert_eq!(summary.frequency_output, dir.path().join("small.atf.freq.csv"));
        assert_eq!(summary.distance_output, dir.path().join("small.atf.dist.csv"));
        assert_eq!(summary.accesses, 7);
        assert_eq!(summary.distinct, 3);
        assert_eq!(summary.infinities, 3);
        assert_eq!(
            std::fs::read_to_string(&summary.frequency_output).unwrap(),
            "Address,Count\r\n0,4\r\n1,2\r\n3,1\r\n"
        );
        assert_eq!(
            std::fs::read_to_string(&summary.distance_output).unwrap(),
            "Distance,Count\r\n0,1\r\n1,2\r\n2,1\r\ninf,3\r\n"
        );
    }

    #[test]
    fn malformed_row_fails() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.atf");
        std::fs::write(&input, "#Address,Timestamp,IOType,Size,Cost\n0,x,R,1,1\n").unwrap();
        let err = TraceStats::new()
            .input(&input)
            .frequency_output(dir.path().join("f.csv"))
            .distance_output(dir.path().join("d.csv"))
            .run()
            .unwrap_err();
        assert!(err.to_string().contains("timestamp"));
    }
}
