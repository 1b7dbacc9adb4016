use std::fmt;

use crate::model::FeedKind;

#[derive(Debug)]
pub enum ReconError {
    /// A required column is absent from the feed header.
    MissingColumn { feed: FeedKind, column: String },
    /// Structural CSV error (unterminated quote, unreadable header, ...).
    Csv { feed: FeedKind, message: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { feed, column } => {
                write!(f, "{feed} feed: missing column '{column}'")
            }
            Self::Csv { feed, message } => write!(f, "{feed} feed: CSV error: {message}"),
        }
    }
}

impl std::error::Error for ReconError {}
