// Configuration loading

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{
    FeedErrorPolicy, FeedSettings, LookupBinding, LookupSettings, OutputSettings, Settings, MAX_WORKERS,
};
