//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | Discrepancies found (only with `--fail-on-discrepancy`)   |
//! | 2    | Usage error (bad arguments, unknown feed name)            |
//! | 3    | Invalid or unreadable config                              |
//! | 4    | Feed download failed (policy `abort`)                     |
//! | 5    | Feed could not be decoded or parsed                       |
//! | 6    | Output file could not be written                          |
//! | 7    | Lookup could not be set up (missing URL, env header, ...) |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use vinrec_config::ConfigError;
use vinrec_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Unmatched VINs present and `--fail-on-discrepancy` set.
/// Like `diff(1)`, exit 1 means "inputs differ."
pub const EXIT_DISCREPANCIES: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config file unreadable, unparsable, or semantically invalid.
pub const EXIT_CONFIG: u8 = 3;

/// Feed download failed (HTTP status or transport) under policy `abort`.
pub const EXIT_FEED_DOWNLOAD: u8 = 4;

/// Feed body undecodable, CSV malformed, or required column missing.
pub const EXIT_FEED_PARSE: u8 = 5;

/// Results/summary/JSON output could not be written.
pub const EXIT_OUTPUT: u8 = 6;

/// Lookup adapter could not be constructed.
pub const EXIT_LOOKUP_SETUP: u8 = 7;

/// Map a config error to its exit code. Unknown feed names are usage errors.
pub fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::UnknownFeed { .. } => EXIT_USAGE,
        ConfigError::Parse(_) | ConfigError::Validation(_) | ConfigError::Io { .. } => EXIT_CONFIG,
    }
}

/// Every engine error is a feed content problem.
pub fn recon_exit_code(_err: &ReconError) -> u8 {
    EXIT_FEED_PARSE
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinrec_recon::model::FeedKind;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_DISCREPANCIES,
            EXIT_USAGE,
            EXIT_CONFIG,
            EXIT_FEED_DOWNLOAD,
            EXIT_FEED_PARSE,
            EXIT_OUTPUT,
            EXIT_LOOKUP_SETUP,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn unknown_feed_is_usage() {
        let err = ConfigError::UnknownFeed { name: "x.csv".into(), known: vec![] };
        assert_eq!(config_exit_code(&err), EXIT_USAGE);
        assert_eq!(config_exit_code(&ConfigError::Parse("bad".into())), EXIT_CONFIG);
    }

    #[test]
    fn recon_errors_are_parse() {
        let err = ReconError::MissingColumn { feed: FeedKind::Dealer, column: "vin".into() };
        assert_eq!(recon_exit_code(&err), EXIT_FEED_PARSE);
    }
}
