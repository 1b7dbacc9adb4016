//! Feed table parsing and VIN-set derivation.
//!
//! Column names are the wire contract with the upstream producers and are
//! matched verbatim: `VIN`/`Type` for the manufacturer feed,
//! `dealer_id`/`vin`/`type` for the dealer feed. Extra columns are ignored.

use std::collections::{BTreeSet, HashSet};

use crate::error::ReconError;
use crate::model::{DealerRecord, FeedKind, ManufacturerRecord, TypeFilter};

pub const DEALER_ID_COLUMN: &str = "dealer_id";
pub const DEALER_VIN_COLUMN: &str = "vin";
pub const DEALER_TYPE_COLUMN: &str = "type";
pub const MANUFACTURER_VIN_COLUMN: &str = "VIN";
pub const MANUFACTURER_TYPE_COLUMN: &str = "Type";

/// Decode a feed body. UTF-8 first (BOM stripped); on failure, one retry
/// under Windows-1252, the superset of ISO-8859-1 that spreadsheet exports use.
/// Windows-1252 maps every byte value, so decoding cannot fail.
pub fn decode_feed_bytes(feed: FeedKind, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            log::info!("{feed} feed is not UTF-8, decoding as Windows-1252");
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
            decoded.into_owned()
        }
    }
}

/// Header-indexed CSV reader shared by both feed parsers.
struct FeedReader<'a> {
    feed: FeedKind,
    headers: Vec<String>,
    reader: csv::Reader<&'a [u8]>,
}

impl<'a> FeedReader<'a> {
    fn new(feed: FeedKind, text: &'a str) -> Result<Self, ReconError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| ReconError::Csv { feed, message: e.to_string() })?
            .iter()
            .map(|h| h.to_string())
            .collect();

        Ok(Self { feed, headers, reader })
    }

    fn column(&self, name: &str) -> Result<usize, ReconError> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| ReconError::MissingColumn {
            feed: self.feed,
            column: name.into(),
        })
    }

    /// Visit every data row. Rows with an empty VIN are skipped.
    fn for_each_row(
        mut self,
        vin_idx: usize,
        mut visit: impl FnMut(&csv::StringRecord),
    ) -> Result<(), ReconError> {
        let feed = self.feed;
        let mut skipped = 0usize;
        for record in self.reader.records() {
            let record = record.map_err(|e| ReconError::Csv { feed, message: e.to_string() })?;
            if record.get(vin_idx).unwrap_or("").is_empty() {
                skipped += 1;
                continue;
            }
            visit(&record);
        }
        if skipped > 0 {
            log::debug!("{feed} feed: skipped {skipped} row(s) without a VIN");
        }
        Ok(())
    }
}

pub fn parse_dealer_feed(text: &str) -> Result<Vec<DealerRecord>, ReconError> {
    let reader = FeedReader::new(FeedKind::Dealer, text)?;
    let dealer_idx = reader.column(DEALER_ID_COLUMN)?;
    let vin_idx = reader.column(DEALER_VIN_COLUMN)?;
    let type_idx = reader.column(DEALER_TYPE_COLUMN)?;

    let mut rows = Vec::new();
    reader.for_each_row(vin_idx, |record| {
        rows.push(DealerRecord {
            dealer_id: record.get(dealer_idx).unwrap_or("").to_string(),
            vin: record.get(vin_idx).unwrap_or("").to_string(),
            vehicle_type: record.get(type_idx).unwrap_or("").to_string(),
        });
    })?;
    Ok(rows)
}

pub fn parse_manufacturer_feed(text: &str) -> Result<Vec<ManufacturerRecord>, ReconError> {
    let reader = FeedReader::new(FeedKind::Manufacturer, text)?;
    let vin_idx = reader.column(MANUFACTURER_VIN_COLUMN)?;
    let type_idx = reader.column(MANUFACTURER_TYPE_COLUMN)?;

    let mut rows = Vec::new();
    reader.for_each_row(vin_idx, |record| {
        rows.push(ManufacturerRecord {
            vin: record.get(vin_idx).unwrap_or("").to_string(),
            vehicle_type: record.get(type_idx).unwrap_or("").to_string(),
        });
    })?;
    Ok(rows)
}

pub fn manufacturer_vins(records: &[ManufacturerRecord], filter: TypeFilter) -> BTreeSet<String> {
    records
        .iter()
        .filter(|r| filter.matches(&r.vehicle_type))
        .map(|r| r.vin.clone())
        .collect()
}

pub fn dealer_vins(records: &[DealerRecord], dealer_id: &str, filter: TypeFilter) -> BTreeSet<String> {
    records
        .iter()
        .filter(|r| r.dealer_id == dealer_id && filter.matches(&r.vehicle_type))
        .map(|r| r.vin.clone())
        .collect()
}

/// Unique dealer ids in order of first appearance.
pub fn dealer_ids(records: &[DealerRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.dealer_id.as_str()))
        .map(|r| r.dealer_id.clone())
        .collect()
}
