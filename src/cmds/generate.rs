use std::{
    io::Write,
    path::{Path, PathBuf},
};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    atf::{AtfRecord, AtfWriter, UNIT_COST},
    TAError, TAResult,
};

/// Access pattern of a synthetic trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Repeatedly walk through `elements` addresses in order.
    Scan { elements: u64, scans: u64 },
    /// Draw each access from `elements` addresses with random integer weights in
    /// `0..=max_weight`.
    Random {
        elements: u64,
        accesses: u64,
        max_weight: u64,
    },
    /// Two random phases of `accesses` each, the second drawing from a weight set
    /// derived according to `mode`.
    Modal {
        mode: ModalMode,
        elements: u64,
        accesses: u64,
        max_weight: u64,
    },
}

impl Default for Pattern {
    fn default() -> Self {
        Pattern::Random {
            elements: 400,
            accesses: 3200,
            max_weight: 8,
        }
    }
}

/// How the second phase of a modal trace relates to the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ModalMode {
    /// Same addresses, independently drawn weights.
    #[value(alias = "f")]
    Frequency,
    /// Addresses `elements..2*elements` with their own weights.
    #[value(alias = "d")]
    Distinct,
    /// The first phase's weights, each dropped to zero with probability 1/2.
    #[value(alias = "s")]
    Subset,
}

impl std::fmt::Display for ModalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModalMode::Frequency => f.write_str("frequency"),
            ModalMode::Distinct => f.write_str("distinct"),
            ModalMode::Subset => f.write_str("subset"),
        }
    }
}

/// `(address, weight)` in draw order.
type Weights = Vec<(u64, u64)>;

/// Writes synthetic single-block read traces in ATF.
#[derive(Debug, Default)]
pub struct TraceGenerator {
    output: Option<PathBuf>,
    pattern: Pattern,
    seed: Option<u64>,
}

impl TraceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// For [`Pattern::Modal`] the two phases additionally go to `<stem>-1` and
    /// `<stem>-2` next to it, see [`modal_phase_paths`].
    pub fn output(&mut self, output: impl Into<PathBuf>) -> &mut Self {
        self.output = Some(output.into());
        self
    }

    pub fn pattern(&mut self, pattern: Pattern) -> &mut Self {
        self.pattern = pattern;
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    pub fn run(&self) -> TAResult<u64> {
        let output = self
            .output
            .as_deref()
            .ok_or_else(|| TAError::invalid_arg("output path not set"))?;
        log::info!("generating {:?} trace into {}", self.pattern, output.display());
        let rows = if let Pattern::Modal { .. } = self.pattern {
            let (first, second) = modal_phase_paths(output);
            log::info!(
                "phases go to {} and {}",
                first.display(),
                second.display()
            );
            self.generate_modal(
                super::create_output(output)?,
                super::create_output(&first)?,
                super::create_output(&second)?,
            )?
        } else {
            self.generate(super::create_output(output)?)?
        };
        log::info!("generated {rows} rows");
        Ok(rows)
    }

    /// Write the trace to `sink` and return the number of data rows.
    pub fn generate<W: Write>(&self, sink: W) -> TAResult<u64> {
        let mut writer = AtfWriter::new(sink)?;
        self.emit(|_, record| writer.write(&record))?;
        writer.flush()?;
        Ok(writer.rows())
    }

    /// Write the whole trace to `full` and each phase of a modal trace to its own
    /// sink. Patterns without phases put every row in the first phase.
    pub fn generate_modal<W: Write>(&self, full: W, first: W, second: W) -> TAResult<u64> {
        let mut full = AtfWriter::new(full)?;
        let mut phases = [AtfWriter::new(first)?, AtfWriter::new(second)?];
        self.emit(|phase, record| {
            full.write(&record)?;
            phases[phase].write(&record)
        })?;
        full.flush()?;
        for writer in phases.iter_mut() {
            writer.flush()?;
        }
        Ok(full.rows())
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Produce every access in timestamp order, tagged with its phase.
    fn emit(&self, mut emit: impl FnMut(usize, AtfRecord) -> TAResult<()>) -> TAResult<()> {
        match self.pattern {
            Pattern::Scan { elements, scans } => {
                if elements == 0 {
                    return Err(TAError::invalid_arg("scan needs at least one element"));
                }
                let total = elements
                    .checked_mul(scans)
                    .ok_or_else(|| TAError::invalid_arg("scan length overflows"))?;
                for i in 0..total {
                    emit(0, access(i % elements, i))?;
                }
            }
            Pattern::Random {
                elements,
                accesses,
                max_weight,
            } => {
                if elements == 0 {
                    return Err(TAError::invalid_arg("random trace needs at least one element"));
                }
                let mut rng = self.rng();
                let weights = random_weights(&mut rng, 0..elements, max_weight);
                draw(&mut rng, &weights, 0..accesses, |record| emit(0, record))?;
            }
            Pattern::Modal {
                mode,
                elements,
                accesses,
                max_weight,
            } => {
                if elements == 0 {
                    return Err(TAError::invalid_arg("modal trace needs at least one element"));
                }
                let end = accesses
                    .checked_mul(2)
                    .ok_or_else(|| TAError::invalid_arg("modal trace length overflows"))?;
                let mut rng = self.rng();
                let first = random_weights(&mut rng, 0..elements, max_weight);
                let second = match mode {
                    ModalMode::Frequency => random_weights(&mut rng, 0..elements, max_weight),
                    ModalMode::Distinct => {
                        let keys = elements..elements.checked_mul(2).ok_or_else(|| {
                            TAError::invalid_arg("distinct modal addresses overflow")
                        })?;
                        random_weights(&mut rng, keys, max_weight)
                    }
                    ModalMode::Subset => first
                        .iter()
                        .map(|&(key, weight)| (key, if rng.gen_bool(0.5) { 0 } else { weight }))
                        .collect(),
                };
                log::debug!("modal {mode} trace, {elements} elements per phase");
                draw(&mut rng, &first, 0..accesses, |record| emit(0, record))?;
                draw(&mut rng, &second, accesses..end, |record| emit(1, record))?;
            }
        }
        Ok(())
    }
}

/// `<stem>-1.<ext>` and `<stem>-2.<ext>` next to `output`.
pub fn modal_phase_paths(output: &Path) -> (PathBuf, PathBuf) {
    let stem = output.file_stem().unwrap_or_default().to_string_lossy();
    let phase = |n: u8| {
        let mut name = format!("{stem}-{n}");
        if let Some(ext) = output.extension() {
            name.push('.');
            name.push_str(&ext.to_string_lossy());
        }
        output.with_file_name(name)
    };
    (phase(1), phase(2))
}

fn random_weights(rng: &mut StdRng, keys: std::ops::Range<u64>, max_weight: u64) -> Weights {
    keys.map(|key| (key, rng.gen_range(0..=max_weight))).collect()
}

fn total_weight(weights: &[(u64, u64)]) -> TAResult<u64> {
    weights
        .iter()
        .try_fold(0_u64, |acc, &(_, weight)| acc.checked_add(weight))
        .ok_or_else(|| TAError::invalid_arg("total weight overflows, lower the max weight"))
}

/// One weighted draw per timestamp in `timestamps`.
fn draw(
    rng: &mut StdRng,
    weights: &[(u64, u64)],
    timestamps: std::ops::Range<u64>,
    mut emit: impl FnMut(AtfRecord) -> TAResult<()>,
) -> TAResult<()> {
    let total = total_weight(weights)?;
    for i in timestamps {
        let choice = rng.gen_range(0..=total);
        emit(access(pick(weights, choice), i))?;
    }
    Ok(())
}

/// Walk the weights in order and take the first whose weight covers what is left
/// of `choice`. Never runs off the end while `choice <= total_weight(weights)`.
fn pick(weights: &[(u64, u64)], mut choice: u64) -> u64 {
    for &(key, weight) in weights {
        if weight < choice {
            choice -= weight;
        } else {
            return key;
        }
    }
    weights.last().map_or(0, |&(key, _)| key)
}

fn access(address: u64, timestamp: u64) -> AtfRecord {
    AtfRecord {
        address: address.to_string(),
        timestamp: timestamp as i64,
        io_type: "R".to_owned(),
        size: 1,
        cost: UNIT_COST,
    }
}

#[cfg(test)]
mod test {
    use super::{modal_phase_paths, pick, ModalMode, Pattern, TraceGenerator};

    fn generate(generator: &TraceGenerator) -> Vec<String> {
        let mut out = Vec::new();
        let rows = generator.generate(&mut out).unwrap();
        let rows_out = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        assert_eq!(rows_out.len() as u64, rows + 1);
        assert_eq!(rows_out[0], "#Address,Timestamp,IOType,Size,Cost");
        rows_out
    }

    #[test]
    fn scan() {
        let rows = generate(TraceGenerator::new().pattern(Pattern::Scan {
            elements: 3,
            scans: 2,
        }));
        assert_eq!(
            &rows[1..],
            &[
                "0,0,R,1,1",
                "1,1,R,1,1",
                "2,2,R,1,1",
                "0,3,R,1,1",
                "1,4,R,1,1",
                "2,5,R,1,1"
            ]
        );
    }

    #[test]
    fn random_is_reproducible() {
        let pattern = Pattern::Random {
            elements: 50,
            accesses: 500,
            max_weight: 8,
        };
        let a = generate(TraceGenerator::new().pattern(pattern.clone()).seed(7));
        let b = generate(TraceGenerator::new().pattern(pattern).seed(7));
        assert_eq!(a, b);
        assert_eq!(a.len(), 501);
        for (i, row) in a[1..].iter().enumerate() {
            let fields = row.split(',').collect::<Vec<_>>();
            assert!(fields[0].parse::<u64>().unwrap() < 50);
            assert_eq!(fields[1], i.to_string());
            assert_eq!(&fields[2..], &["R", "1", "1"]);
        }
    }

    #[test]
    fn zero_weights_pick_first() {
        let rows = generate(
            TraceGenerator::new()
                .pattern(Pattern::Random {
                    elements: 5,
                    accesses: 4,
                    max_weight: 0,
                })
                .seed(1),
        );
        assert!(rows[1..].iter().all(|row| row.starts_with("0,")));
    }

    #[test]
    fn pick_walks_weights() {
        let weights = [(10, 0), (11, 3), (12, 0), (13, 2)];
        assert_eq!(pick(&weights, 0), 10);
        assert_eq!(pick(&weights, 1), 11);
        assert_eq!(pick(&weights, 3), 11);
        assert_eq!(pick(&weights, 4), 13);
        assert_eq!(pick(&weights, 5), 13);
    }

    #[test]
    fn no_elements() {
        let mut out = Vec::new();
        assert!(TraceGenerator::new()
            .pattern(Pattern::Scan {
                elements: 0,
                scans: 1
            })
            .generate(&mut out)
            .is_err());
    }

    #[test]
    fn weight_overflow_is_rejected() {
        let mut out = Vec::new();
        let err = TraceGenerator::new()
            .pattern(Pattern::Random {
                elements: 4,
                accesses: 10,
                max_weight: u64::MAX,
            })
            .seed(3)
            .generate(&mut out)
            .unwrap_err();
        assert!(err.to_string().contains("total weight overflows"));
    }

    fn modal(mode: ModalMode, seed: u64) -> (Vec<String>, Vec<String>, Vec<String>) {
        let (mut full, mut first, mut second) = (Vec::new(), Vec::new(), Vec::new());
        let rows = TraceGenerator::new()
            .pattern(Pattern::Modal {
                mode,
                elements: 20,
                accesses: 100,
                max_weight: 8,
            })
            .seed(seed)
            .generate_modal(&mut full, &mut first, &mut second)
            .unwrap();
        assert_eq!(rows, 200);
        let lines = |out: Vec<u8>| {
            String::from_utf8(out)
                .unwrap()
                .lines()
                .skip(1)
                .map(str::to_owned)
                .collect::<Vec<_>>()
        };
        (lines(full), lines(first), lines(second))
    }

    fn addresses(rows: &[String]) -> Vec<u64> {
        rows.iter()
            .map(|row| row.split(',').next().unwrap().parse().unwrap())
            .collect()
    }

    #[test]
    fn modal_phases_split_the_full_trace() {
        let (full, first, second) = modal(ModalMode::Frequency, 11);
        assert_eq!(first.len(), 100);
        assert_eq!(second.len(), 100);
        assert_eq!(full, [first.clone(), second.clone()].concat());
        assert!(first[0].starts_with(|c: char| c.is_ascii_digit()));
        assert!(first[0].ends_with(",0,R,1,1"));
        assert!(second[0].ends_with(",100,R,1,1"));
        assert!(addresses(&full).iter().all(|&a| a < 20));
        assert_eq!(modal(ModalMode::Frequency, 11).0, full);
    }

    #[test]
    fn modal_distinct_uses_new_addresses() {
        let (_, first, second) = modal(ModalMode::Distinct, 5);
        assert!(addresses(&first).iter().all(|&a| a < 20));
        assert!(addresses(&second).iter().all(|&a| (20..40).contains(&a)));
    }

    #[test]
    fn modal_subset_stays_in_first_phase_addresses() {
        let (_, first, second) = modal(ModalMode::Subset, 9);
        assert!(addresses(&first).iter().all(|&a| a < 20));
        assert!(addresses(&second).iter().all(|&a| a < 20));
    }

    #[test]
    fn modal_run_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("bimodal.atf");
        let rows = TraceGenerator::new()
            .output(&output)
            .pattern(Pattern::Modal {
                mode: ModalMode::Subset,
                elements: 4,
                accesses: 8,
                max_weight: 8,
            })
            .seed(2)
            .run()
            .unwrap();
        assert_eq!(rows, 16);
        let (first, second) = modal_phase_paths(&output);
        assert_eq!(first, dir.path().join("bimodal-1.atf"));
        assert_eq!(second, dir.path().join("bimodal-2.atf"));
        for (path, lines) in [(&output, 17), (&first, 9), (&second, 9)] {
            assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), lines);
        }
    }
}
