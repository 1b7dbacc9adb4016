use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    Parse(String),
    /// Semantically invalid settings (bad URL, zero workers, ...).
    Validation(String),
    /// Manufacturer feed name not in `feeds.known_feeds`.
    UnknownFeed { name: String, known: Vec<String> },
    /// Config file could not be read or written.
    Io { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownFeed { name, known } => {
                write!(f, "unknown feed '{name}' (known: {})", known.join(", "))
            }
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}
