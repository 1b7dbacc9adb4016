//! Feed loader: download a feed CSV, decode it, and parse it into records.
//!
//! A failed download is fatal under policy `abort`. Under `empty` it is
//! logged and the feed degrades to an empty table, so every VIN on the
//! other side becomes one-sided.

use vinrec_config::{FeedErrorPolicy, FeedSettings};
use vinrec_recon::feed::{decode_feed_bytes, parse_dealer_feed, parse_manufacturer_feed};
use vinrec_recon::model::{DealerRecord, FeedKind, ManufacturerRecord};

use crate::exit_codes::{recon_exit_code, EXIT_CONFIG, EXIT_FEED_DOWNLOAD};
use crate::http::HttpClient;
use crate::CliError;

/// Feed retries are fixed; the lookup has its own retry setting.
const FEED_RETRIES: u32 = 0;

pub(crate) struct FeedLoader {
    client: HttpClient,
    policy: FeedErrorPolicy,
    degraded: Vec<FeedKind>,
}

impl FeedLoader {
    pub(crate) fn new(settings: &FeedSettings, policy: FeedErrorPolicy) -> Result<Self, CliError> {
        let client = HttpClient::new("feed", settings.timeout_secs, FEED_RETRIES)
            .map_err(|msg| CliError { code: EXIT_CONFIG, message: msg, hint: None })?;
        Ok(Self { client, policy, degraded: Vec::new() })
    }

    /// Feeds that failed to download and were replaced by an empty table.
    pub(crate) fn degraded(&self) -> &[FeedKind] {
        &self.degraded
    }

    pub(crate) fn load_dealer(&mut self, url: &str) -> Result<Vec<DealerRecord>, CliError> {
        match self.fetch_text(FeedKind::Dealer, url)? {
            Some(text) => parse_dealer_feed(&text).map_err(feed_parse_error),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn load_manufacturer(&mut self, url: &str) -> Result<Vec<ManufacturerRecord>, CliError> {
        match self.fetch_text(FeedKind::Manufacturer, url)? {
            Some(text) => parse_manufacturer_feed(&text).map_err(feed_parse_error),
            None => Ok(Vec::new()),
        }
    }

    /// Download and decode. `Ok(None)` means the download failed and the
    /// policy allows continuing with an empty table.
    fn fetch_text(&mut self, kind: FeedKind, url: &str) -> Result<Option<String>, CliError> {
        let parsed = url::Url::parse(url).map_err(|e| CliError {
            code: EXIT_CONFIG,
            message: format!("{kind} feed URL '{url}' is invalid: {e}"),
            hint: None,
        })?;

        log::info!("fetching {kind} feed from {parsed}");
        let bytes = self
            .client
            .send_with_retry(|c| c.get(parsed.clone()))
            .map_err(|failure| failure.to_string())
            .and_then(|resp| resp.bytes().map_err(|e| format!("reading body: {e}")));

        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(reason) => {
                let message = format!("failed to download {kind} feed from {url}: {reason}");
                return match self.policy {
                    FeedErrorPolicy::Abort => Err(CliError {
                        code: EXIT_FEED_DOWNLOAD,
                        message,
                        hint: Some(
                            "use --allow-empty-feeds (or feeds.on_error = \"empty\") to continue with an empty table"
                                .into(),
                        ),
                    }),
                    FeedErrorPolicy::Empty => {
                        log::warn!("{message}; continuing with an empty {kind} table");
                        self.degraded.push(kind);
                        Ok(None)
                    }
                };
            }
        };

        log::info!("{kind} feed: {} bytes", bytes.len());
        Ok(Some(decode_feed_bytes(kind, bytes.to_vec())))
    }
}

fn feed_parse_error(err: vinrec_recon::ReconError) -> CliError {
    CliError { code: recon_exit_code(&err), message: err.to_string(), hint: None }
}
