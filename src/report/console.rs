use unicode_truncate::UnicodeTruncateStr;

use super::RunSummary;
use crate::http_probe::result::{Outcome, ProbeResult};

const MAX_URL_WIDTH: usize = 60;

fn to_fixed_width(input: &str, width: usize) -> String {
    let (truncated, _) = input.unicode_truncate(width);
    format!("{:<width$}", truncated, width = width)
}

/// One line per result, URLs padded to a shared column.
pub fn result_lines(results: &[ProbeResult]) -> Vec<String> {
    let width = results
        .iter()
        .map(|r| r.target.chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_URL_WIDTH);

    results
        .iter()
        .map(|result| {
            let url = to_fixed_width(&result.target, width);
            match &result.outcome {
                Outcome::Up { status_code } => {
                    format!("✅ {url} - UP {status_code} ({}ms)", result.response_time_ms)
                }
                Outcome::Down { error } => {
                    format!("❌ {url} - DOWN ({error}) ({}ms)", result.response_time_ms)
                }
            }
        })
        .collect()
}

pub fn print_results(results: &[ProbeResult], summary: &RunSummary) {
    for line in result_lines(results) {
        println!("{line}");
    }
    println!("{} targets checked: {} up, {} down", summary.total, summary.up, summary.down);
}
