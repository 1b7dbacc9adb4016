use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::classify::{classify_response, classify_side_only, StatusCodes};
use crate::lookup::VinLookup;
use crate::model::{Classification, Outcome, Presence, ReconMeta, ReconResult, Side};
use crate::summary::compute_summary;

#[derive(Debug, Clone)]
pub struct ReconOptions {
    pub codes: StatusCodes,
    /// Concurrent lookups. 1 = strictly sequential.
    pub workers: usize,
}

impl Default for ReconOptions {
    fn default() -> Self {
        Self {
            codes: StatusCodes::default(),
            workers: 1,
        }
    }
}

/// Reconcile the manufacturer (`left`) and dealer (`right`) VIN sets.
///
/// Common VINs are labelled without a lookup. Unmatched VINs are looked up in
/// ascending VIN order; with `lookup = None` they are labelled by side alone.
/// Outcomes are returned in ascending VIN order.
pub fn reconcile(
    left: &BTreeSet<String>,
    right: &BTreeSet<String>,
    lookup: Option<&dyn VinLookup>,
    options: &ReconOptions,
) -> ReconResult {
    let mut unmatched: Vec<(&str, Side)> = left
        .difference(right)
        .map(|v| (v.as_str(), Side::Left))
        .chain(right.difference(left).map(|v| (v.as_str(), Side::Right)))
        .collect();
    unmatched.sort_by(|a, b| a.0.cmp(b.0));

    log::info!(
        "reconciling {} manufacturer / {} dealer VINs: {} unmatched",
        left.len(),
        right.len(),
        unmatched.len(),
    );

    let workers = effective_workers(options.workers, unmatched.len(), lookup.is_some());
    let labels = classify_unmatched(&unmatched, lookup, &options.codes, workers);

    let mut by_vin: BTreeMap<&str, (Presence, Classification)> = left
        .intersection(right)
        .map(|v| (v.as_str(), (Presence::Both, Classification::Common)))
        .collect();
    for ((vin, side), label) in unmatched.iter().zip(labels) {
        by_vin.insert(vin, (Presence::from(*side), label));
    }

    let outcomes: Vec<Outcome> = by_vin
        .into_iter()
        .map(|(vin, (presence, classification))| Outcome {
            vin: vin.to_string(),
            presence,
            classification,
        })
        .collect();

    let summary = compute_summary(&outcomes);

    ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            lookup_enabled: lookup.is_some(),
            workers,
        },
        summary,
        outcomes,
    }
}

/// Classify a single unmatched VIN. Lookup failures become
/// [`Classification::ApiRequestFailed`].
pub fn classify_vin(
    vin: &str,
    side: Side,
    lookup: Option<&dyn VinLookup>,
    codes: &StatusCodes,
) -> Classification {
    let Some(lookup) = lookup else {
        return classify_side_only(side);
    };
    let label = match lookup.lookup(vin) {
        Ok(response) => classify_response(&response, side, codes),
        Err(e) => {
            log::warn!("{vin}: {e}");
            Classification::ApiRequestFailed
        }
    };
    log::debug!("{vin} ({side}-only): {label}");
    label
}

/// Threads actually used: never more than there are VINs to look up, and
/// one when the lookup is disabled.
fn effective_workers(requested: usize, unmatched: usize, lookup_enabled: bool) -> usize {
    if !lookup_enabled {
        return 1;
    }
    requested.min(unmatched).max(1)
}

/// Classify in input order. With more than one worker, scoped threads pull
/// indices from a shared cursor and results are slotted back by index.
fn classify_unmatched(
    unmatched: &[(&str, Side)],
    lookup: Option<&dyn VinLookup>,
    codes: &StatusCodes,
    workers: usize,
) -> Vec<Classification> {
    if workers <= 1 || lookup.is_none() {
        return unmatched
            .iter()
            .map(|(vin, side)| classify_vin(vin, *side, lookup, codes))
            .collect();
    }

    let cursor = AtomicUsize::new(0);
    let cursor = &cursor;
    let mut slots: Vec<Option<Classification>> = vec![None; unmatched.len()];

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let i = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some((vin, side)) = unmatched.get(i) else {
                            break;
                        };
                        done.push((i, classify_vin(vin, *side, lookup, codes)));
                    }
                    done
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (i, label) in done {
                        slots[i] = Some(label);
                    }
                }
                Err(_) => log::error!("lookup worker panicked; its VINs are marked as failed"),
            }
        }
    });

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(Classification::ApiRequestFailed))
        .collect()
}
