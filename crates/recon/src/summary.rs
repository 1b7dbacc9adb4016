use std::collections::HashMap;

use crate::model::{IssueCount, Outcome, Presence, ReconSummary};

/// Compute summary statistics from reconciliation outcomes.
pub fn compute_summary(outcomes: &[Outcome]) -> ReconSummary {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut issues: Vec<IssueCount> = Vec::new();
    let mut common = 0;
    let mut left_only = 0;
    let mut right_only = 0;

    for o in outcomes {
        let label = o.classification.to_string();
        match index.get(&label) {
            Some(&i) => issues[i].count += 1,
            None => {
                index.insert(label.clone(), issues.len());
                issues.push(IssueCount { issue: label, count: 1 });
            }
        }

        match o.presence {
            Presence::Both => common += 1,
            Presence::LeftOnly => left_only += 1,
            Presence::RightOnly => right_only += 1,
        }
    }

    // Stable sort keeps first-appearance order among equal counts.
    issues.sort_by(|a, b| b.count.cmp(&a.count));

    ReconSummary {
        total: outcomes.len(),
        common,
        left_only,
        right_only,
        issues,
    }
}
