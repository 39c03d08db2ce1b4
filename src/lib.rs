pub use cmds::convert;
pub use cmds::generate;
pub use cmds::reduce;
pub use cmds::stats as trace_stats;
pub mod atf;
pub mod config;
pub mod converter;
pub mod stats;
pub mod trace_parser;

mod cmds;
mod error;
mod rows;
pub use cmds::atf_output_path;
pub use error::{TAError, TAResult};
