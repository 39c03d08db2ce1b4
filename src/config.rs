use std::sync::OnceLock;

use crate::{atf::BLOCK_SIZE, converter::RebaseMode, trace_parser::SourceFormat, TAError};

#[derive(serde::Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
struct Config {
    block_size: u64,
    format: SourceFormat,
    rebase: RebaseMode,
    keep_partial: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            block_size: BLOCK_SIZE,
            format: SourceFormat::default(),
            rebase: RebaseMode::default(),
            keep_partial: false,
        }
    }
}

impl Config {
    fn from_toml_str(s: &str) -> crate::TAResult<Self> {
        let config: Config = toml::from_str(s)?;
        if config.block_size == 0 {
            return Err(TAError::invalid_arg("BlockSize must be non-zero"));
        }
        Ok(config)
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load the configuration file. Keys left out keep their defaults.
pub fn init_config_toml(config_file: &std::path::Path) -> crate::TAResult<()> {
    let content = std::fs::read_to_string(config_file)?;
    let config = Config::from_toml_str(&content)?;
    log::debug!("loaded config from {}: {config:?}", config_file.display());
    CONFIG
        .set(config)
        .map_err(|_| TAError::other("initialize config more than once"))
}

fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

pub fn block_size() -> u64 {
    get_config().block_size
}

pub fn format() -> SourceFormat {
    get_config().format
}

pub fn rebase() -> RebaseMode {
    get_config().rebase
}

pub fn keep_partial() -> bool {
    get_config().keep_partial
}
