fn main() {
    use clap::Parser;
    let args = Cli::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let result = match args.cmd {
        Commands::Convert {
            input,
            config,
            format,
            rebase,
            keep_partial,
            quiet,
        } => convert(&input, config.as_deref(), format, rebase, keep_partial, quiet),
        Commands::Reduce { input } => reduce(&input),
        Commands::Generate { cmd } => generate(cmd),
        Commands::Stats { input } => stats(&input),
    };
    if let Err(e) = result {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn convert(
    input: &std::path::Path,
    config_path: Option<&std::path::Path>,
    format: Option<SourceFormat>,
    rebase: Option<RebaseMode>,
    keep_partial: bool,
    quiet: bool,
) -> TAResult<()> {
    if let Some(config_path) = config_path {
        config::init_config_toml(config_path)?;
    }
    trace_atf::convert::Conversion::new()
        .input(input)
        .format(format.unwrap_or_else(config::format))
        .rebase_mode(rebase.unwrap_or_else(config::rebase))
        .block_size(config::block_size())
        .keep_partial(keep_partial || config::keep_partial())
        .progress(!quiet)
        .run()
        .map(|_| ())
}

fn reduce(input: &std::path::Path) -> TAResult<()> {
    trace_atf::reduce::OffsetReducer::new()
        .input(input)
        .run()
        .map(|_| ())
}

fn stats(input: &std::path::Path) -> TAResult<()> {
    trace_atf::trace_stats::TraceStats::new()
        .input(input)
        .run()
        .map(|_| ())
}

fn generate(cmd: GenerateCmds) -> TAResult<()> {
    let mut generator = trace_atf::generate::TraceGenerator::new();
    match cmd {
        GenerateCmds::Scan {
            output,
            elements,
            scans,
        } => generator
            .output(output)
            .pattern(Pattern::Scan { elements, scans }),
        GenerateCmds::Random {
            output,
            elements,
            accesses,
            max_weight,
            seed,
        } => {
            if let Some(seed) = seed {
                generator.seed(seed);
            }
            generator.output(output).pattern(Pattern::Random {
                elements,
                accesses,
                max_weight,
            })
        }
        GenerateCmds::Modal {
            output,
            mode,
            elements,
            accesses,
            max_weight,
            seed,
        } => {
            if let Some(seed) = seed {
                generator.seed(seed);
            }
            generator.output(output).pattern(Pattern::Modal {
                mode,
                elements,
                accesses,
                max_weight,
            })
        }
    }
    .run()
    .map(|_| ())
}

use std::path::PathBuf;

use clap::Subcommand;
use trace_atf::{
    config,
    converter::RebaseMode,
    generate::{ModalMode, Pattern},
    trace_parser::SourceFormat,
    TAResult,
};

#[derive(Debug, clap::Parser)]
#[command(name = "trace-atf")]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
    /// log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a block trace into ATF, written to `<INPUT>.atf`
    #[command(arg_required_else_help = true)]
    Convert {
        /// source trace, comma separated without header
        input: PathBuf,
        /// configuration file in toml format
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// layout of the source trace [default: systor17]
        #[arg(short, long)]
        format: Option<SourceFormat>,
        /// time origin handling for out-of-order records [default: deferred]
        #[arg(short, long)]
        rebase: Option<RebaseMode>,
        /// keep the partially written output on failure
        #[arg(long, default_value_t = false)]
        keep_partial: bool,
        /// no progress spinner
        #[arg(short, long, default_value_t = false)]
        quiet: bool,
    },
    /// Replace addresses of an ATF file with dense ids, written to `<INPUT>.atf`
    #[command(arg_required_else_help = true)]
    Reduce {
        /// ATF file
        input: PathBuf,
    },
    /// Generate a synthetic ATF trace
    #[command(arg_required_else_help = true)]
    Generate {
        #[command(subcommand)]
        cmd: GenerateCmds,
    },
    /// Write the address frequency and stack distance histograms of an ATF file,
    /// to `<INPUT>.freq.csv` and `<INPUT>.dist.csv`
    #[command(arg_required_else_help = true)]
    Stats {
        /// ATF file
        input: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum GenerateCmds {
    /// Cyclic scans over a fixed set of addresses
    Scan {
        /// output ATF file
        output: PathBuf,
        /// number of distinct addresses
        #[arg(short, long)]
        elements: u64,
        /// number of passes over the addresses
        #[arg(short, long)]
        scans: u64,
    },
    /// Accesses drawn from randomly weighted addresses
    Random {
        /// output ATF file
        output: PathBuf,
        /// number of distinct addresses
        #[arg(short, long, default_value_t = 400)]
        elements: u64,
        /// number of accesses
        #[arg(short, long, default_value_t = 3200)]
        accesses: u64,
        /// largest weight an address can get
        #[arg(short, long, default_value_t = 8)]
        max_weight: u64,
        /// seed for a reproducible trace
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Two random phases, also written separately to `<STEM>-1` and `<STEM>-2`
    Modal {
        /// output ATF file
        output: PathBuf,
        /// relation between the two phases
        #[arg(short = 'M', long, value_enum)]
        mode: ModalMode,
        /// number of distinct addresses per phase
        #[arg(short, long, default_value_t = 200)]
        elements: u64,
        /// number of accesses per phase
        #[arg(short, long, default_value_t = 1600)]
        accesses: u64,
        /// largest weight an address can get
        #[arg(short, long, default_value_t = 8)]
        max_weight: u64,
        /// seed for a reproducible trace
        #[arg(long)]
        seed: Option<u64>,
    },
}
