//! Summary builder
//!
//! Builds report-wide output with pass/fail counts per account.

use crate::state::AccountScore;

/// Build a report summary JSON from all account scores
pub fn build_summary(report: &str, timestamp: i64, scores: &[AccountScore]) -> serde_json::Value {
    let mut compliant = 0;
    let mut non_compliant = 0;
    let mut accounts = Vec::new();

    for score in scores {
        if score.control_failed_count == 0 {
            compliant += 1;
        } else {
            non_compliant += 1;
        }

        accounts.push(build_account_summary(score));
    }

    serde_json::json!({
        "report": report,
        "timestamp": timestamp,
        "summary": {
            "total_accounts": scores.len(),
            "compliant": compliant,
            "non_compliant": non_compliant,
            "average_score": average_score(scores)
        },
        "accounts": accounts
    })
}

/// Build summary for a single account
fn build_account_summary(score: &AccountScore) -> serde_json::Value {
    serde_json::json!({
        "account_id": score.account_id,
        "account_name": score.account_name,
        "workload": score.workload,
        "environment": score.environment,
        "score": score.score,
        "control_counts": {
            "total": score.control_count,
            "passed": score.control_passed_count,
            "failed": score.control_failed_count
        },
        "findings_count": score.finding_count
    })
}

fn average_score(scores: &[AccountScore]) -> f64 {
    if scores.is_empty() {
        return 100.0;
    }
    scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
}

/// Format an account score as a one-line summary
pub fn format_summary(score: &AccountScore) -> String {
    let status = if score.control_failed_count == 0 {
        "COMPLIANT"
    } else {
        "NON-COMPLIANT"
    };

    format!(
        "{} ({}) | Status: {} | Controls: {}/{} passed ({:.1}%) | Findings: {}",
        score.account_id,
        score.account_name.as_deref().unwrap_or("unknown"),
        status,
        score.control_passed_count,
        score.control_count,
        score.score,
        score.finding_count
    )
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
