#[derive(Debug, thiserror::Error)]
pub enum TAError {
    #[error("[kind: io, info:{0}]")]
    Io(#[from] std::io::Error),
    #[error("[kind: csv, info:{0}]")]
    Csv(#[from] csv::Error),
    #[error("[kind: config, info:{0}]")]
    Config(#[from] toml::de::Error),
    #[error(
        "[kind: invalid size, info: size {size} at line {line} is not divisible by block size {block_size}]"
    )]
    InvalidSize {
        size: u64,
        block_size: u64,
        line: u64,
    },
    #[error("[kind: parse, info:{0}]")]
    Parse(String),
    #[error("[kind: invalid argument, info:{0}]")]
    InvalidArg(String),
    #[error("[kind: other, info: {0}]")]
    Other(String),
}

impl TAError {
    pub(crate) fn invalid_arg(e: impl ToString) -> Self {
        Self::InvalidArg(e.to_string())
    }

    pub(crate) fn other(e: impl ToString) -> Self {
        Self::Other(e.to_string())
    }

    /// Error for a field that could not be interpreted.
    ///
    /// `line` is the 1-based line of the offending row in the source file.
    pub(crate) fn parse(line: u64, field: &str, errstr: impl ToString) -> Self {
        Self::Parse(format!(
            "error: {{{}}}, field: {{{field}}}, at line: {{{line}}}",
            errstr.to_string()
        ))
    }

    pub fn is_invalid_size(&self) -> bool {
        matches!(self, TAError::InvalidSize { .. })
    }

    pub fn into_io_err(self) -> Option<std::io::Error> {
        if let TAError::Io(io_err) = self {
            Some(io_err)
        } else {
            None
        }
    }
}

pub type TAResult<T> = std::result::Result<T, TAError>;
