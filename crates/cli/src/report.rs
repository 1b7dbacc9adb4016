//! Run output: the results and summary CSV tables, the JSON report, and
//! the human summary on stderr.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use vinrec_recon::model::{IssueCount, Outcome};
use vinrec_recon::ReconResult;

use crate::exit_codes::EXIT_OUTPUT;
use crate::CliError;

#[derive(Serialize)]
struct ResultRow<'a> {
    #[serde(rename = "VIN")]
    vin: &'a str,
    #[serde(rename = "Result")]
    result: String,
}

/// Inputs of the run, carried alongside the engine result in JSON output.
#[derive(Debug, Serialize)]
pub(crate) struct RunInputs {
    pub feed: String,
    pub dealer: String,
    pub manufacturer_type: String,
    pub dealer_type: String,
    /// `None` when the lookup is disabled.
    pub lookup_binding: Option<String>,
    /// Feeds replaced by an empty table after a failed download.
    pub degraded_feeds: Vec<String>,
}

#[derive(Serialize)]
pub(crate) struct RunReport<'a> {
    pub inputs: &'a RunInputs,
    #[serde(flatten)]
    pub result: &'a ReconResult,
}

/// Write the per-VIN table (`VIN`, `Result`).
pub(crate) fn write_results_csv(path: &Path, outcomes: &[Outcome]) -> Result<(), CliError> {
    let file = create(path)?;
    let mut wtr = csv::Writer::from_writer(file);
    for o in outcomes {
        wtr.serialize(ResultRow { vin: &o.vin, result: o.classification.to_string() })
            .map_err(|e| write_error(path, e))?;
    }
    wtr.flush().map_err(|e| write_error(path, e))
}

/// Write the label count table (`Issue`, `Count`).
pub(crate) fn write_summary_csv(path: &Path, issues: &[IssueCount]) -> Result<(), CliError> {
    let file = create(path)?;
    let mut wtr = csv::Writer::from_writer(file);
    for issue in issues {
        wtr.serialize(issue).map_err(|e| write_error(path, e))?;
    }
    wtr.flush().map_err(|e| write_error(path, e))
}

pub(crate) fn to_json(report: &RunReport<'_>) -> Result<String, CliError> {
    serde_json::to_string_pretty(report).map_err(|e| CliError {
        code: EXIT_OUTPUT,
        message: format!("JSON serialization failed: {e}"),
        hint: None,
    })
}

pub(crate) fn write_json(path: &Path, json: &str) -> Result<(), CliError> {
    let mut file = create(path)?;
    file.write_all(json.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .map_err(|e| write_error(path, e))
}

pub(crate) fn print_human(inputs: &RunInputs, result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "Reconciled {} against dealer {}: {} VINs",
        inputs.feed, inputs.dealer, s.total
    );
    eprintln!("  common:            {}", s.common);
    eprintln!("  manufacturer only: {}", s.left_only);
    eprintln!("  dealer only:       {}", s.right_only);
    for feed in &inputs.degraded_feeds {
        eprintln!("  warning: {feed} feed unavailable, treated as empty");
    }
    if !s.issues.is_empty() {
        eprintln!();
        let width = s.issues.iter().map(|i| i.issue.len()).max().unwrap_or(0);
        for issue in &s.issues {
            eprintln!("  {:<width$}  {}", issue.issue, issue.count, width = width);
        }
    }
}

fn create(path: &Path) -> Result<File, CliError> {
    File::create(path).map_err(|e| write_error(path, e))
}

fn write_error(path: &Path, err: impl std::fmt::Display) -> CliError {
    CliError {
        code: EXIT_OUTPUT,
        message: format!("cannot write {}: {}", path.display(), err),
        hint: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use vinrec_recon::{reconcile, ReconOptions};

    fn sample() -> ReconResult {
        let left: BTreeSet<String> = ["VIN1", "VIN2"].iter().map(|s| s.to_string()).collect();
        let right: BTreeSet<String> = ["VIN2", "VIN3", "VIN4"].iter().map(|s| s.to_string()).collect();
        reconcile(&left, &right, None, &ReconOptions::default())
    }

    fn inputs() -> RunInputs {
        RunInputs {
            feed: "garberchevroletmidland-8710.csv".into(),
            dealer: "8710".into(),
            manufacturer_type: "All".into(),
            dealer_type: "Used".into(),
            lookup_binding: None,
            degraded_feeds: vec![],
        }
    }

    #[test]
    fn results_csv_has_vin_and_result_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reconciliation_results.csv");
        write_results_csv(&path, &sample().outcomes).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "VIN,Result\n\
             VIN1,Exclusive to HomeNet\n\
             VIN2,Common\n\
             VIN3,Exclusive to Dealer.com Website\n\
             VIN4,Exclusive to Dealer.com Website\n"
        );
    }

    #[test]
    fn summary_csv_ordered_by_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issue_breakdown.csv");
        write_summary_csv(&path, &sample().summary.issues).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Issue,Count\n\
             Exclusive to Dealer.com Website,2\n\
             Exclusive to HomeNet,1\n\
             Common,1\n"
        );
    }

    #[test]
    fn unwritable_path_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.csv");
        let err = write_results_csv(&path, &sample().outcomes).unwrap_err();
        assert_eq!(err.code, EXIT_OUTPUT);
    }

    #[test]
    fn json_report_flattens_result() {
        let result = sample();
        let inputs = inputs();
        let json = to_json(&RunReport { inputs: &inputs, result: &result }).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["inputs"]["dealer"], "8710");
        assert!(value["inputs"]["lookup_binding"].is_null());
        assert_eq!(value["summary"]["total"], 4);
        assert_eq!(value["outcomes"][1]["classification"], "Common");
        assert_eq!(value["meta"]["lookup_enabled"], false);
    }
}
