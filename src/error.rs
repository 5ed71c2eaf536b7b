use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("entry has no launch handle")]
    NoHandle,
    #[error("entry has an empty Exec command")]
    EmptyCommand,
    #[error("unterminated quote in Exec command")]
    UnterminatedQuote,
    #[error("invalid field code `{0}` in Exec command")]
    InvalidFieldCode(String),
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
