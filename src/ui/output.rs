//! Console lines printed by the CLI around a scrape, search, or stats run

use crate::fetch::FetchSummary;
use crate::ui::theme::{paint, Tone};
use crate::ui::Icons;
use indicatif::HumanDuration;
use std::path::Path;
use std::time::Duration;

pub fn banner(text: &str) {
    println!("{} {}", Icons::ROCKET, paint(text, Tone::Heading));
}

/// One `icon label: value` line describing the run setup
pub fn setting(icon: &str, label: &str, value: &str) {
    println!("{} {}: {}", icon, paint(label, Tone::Quiet), value);
}

pub fn done(text: &str) {
    println!("{} {}", Icons::CHECK, paint(text, Tone::Good));
}

pub fn failed(text: &str) {
    eprintln!("{} {}", Icons::CROSS, paint(text, Tone::Bad));
}

pub fn caution(text: &str) {
    eprintln!("{} {}", Icons::WARN, paint(text, Tone::Caution));
}

pub fn quiet(text: &str) -> String {
    paint(text, Tone::Quiet)
}

/// Blank line, title, underline
pub fn section(title: &str) {
    println!();
    println!("{}", paint(title, Tone::Heading));
    println!("{}", "-".repeat(title.chars().count().max(36)));
}

pub fn search_heading(term: &str) -> String {
    format!("{} Searching for projects containing '{}'...", Icons::SEARCH, term)
}

pub fn stats_heading(database: &Path) -> String {
    format!("{} Project Statistics ({})", Icons::STATS, database.display())
}

/// Printed above the progress bar when a page request fails
pub fn retry_line(start: usize, attempt: u32, error: &str) -> String {
    format!(
        "{} offset {}, attempt {}: {}",
        Icons::RETRY,
        start,
        attempt,
        paint(error, Tone::Caution)
    )
}

/// Printed above the progress bar when a page is given up on
pub fn skip_line(start: usize, length: usize) -> String {
    let range = format!("skipped records {} to {}", start, start + length);
    format!("{} {}", Icons::SKIP, paint(&range, Tone::Caution))
}

pub fn elapsed_line(elapsed: Duration) -> String {
    let text = format!("Done in {}", HumanDuration(elapsed));
    format!("{} {}", Icons::CHECK, paint(&text, Tone::Good))
}

fn summary_rows(summary: &FetchSummary) -> Vec<(&'static str, String)> {
    let mut rows = vec![
        ("Records available:", summary.total_available.to_string()),
        ("Pages fetched:", summary.pages.to_string()),
    ];
    if summary.rejected > 0 {
        rows.push(("Malformed records:", summary.rejected.to_string()));
    }
    if summary.retries > 0 || summary.skipped_windows > 0 {
        rows.push(("Retries:", summary.retries.to_string()));
        rows.push(("Skipped pages:", summary.skipped_windows.to_string()));
    }
    rows
}

/// Report how a scrape ended
pub fn scrape_summary(summary: &FetchSummary) {
    if summary.count_failed {
        failed("Could not get the record count; nothing was fetched.");
    }
    if summary.interrupted {
        caution("Stopped early; projects saved so far are kept.");
    }

    section("Summary");
    for (label, value) in summary_rows(summary) {
        println!("  {} {}", paint(label, Tone::Quiet), paint(&value, Tone::Accent));
    }
    done(&format!(
        "Successfully saved {} projects to database.",
        summary.persisted
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_rows_hide_clean_counters() {
        let summary = FetchSummary {
            total_available: 40,
            persisted: 40,
            pages: 3,
            ..FetchSummary::default()
        };
        let labels: Vec<_> = summary_rows(&summary).into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Records available:", "Pages fetched:"]);
    }

    #[test]
    fn test_summary_rows_show_trouble() {
        let summary = FetchSummary {
            total_available: 40,
            persisted: 24,
            rejected: 1,
            pages: 3,
            retries: 2,
            skipped_windows: 1,
            ..FetchSummary::default()
        };
        let rows = summary_rows(&summary);
        assert!(rows.contains(&("Malformed records:", "1".to_string())));
        assert!(rows.contains(&("Retries:", "2".to_string())));
        assert!(rows.contains(&("Skipped pages:", "1".to_string())));
    }

    #[test]
    fn test_progress_lines() {
        let line = retry_line(15, 2, "request failed: timed out");
        assert!(line.starts_with(Icons::RETRY));
        assert!(line.contains("offset 15, attempt 2: "));
        assert!(line.contains("timed out"));

        let line = skip_line(15, 15);
        assert!(line.starts_with(Icons::SKIP));
        assert!(line.contains("skipped records 15 to 30"));
    }

    #[test]
    fn test_headings() {
        assert_eq!(
            search_heading("Austin"),
            format!("{} Searching for projects containing 'Austin'...", Icons::SEARCH)
        );
        assert!(stats_heading(Path::new("tdlr_projects.db")).ends_with("(tdlr_projects.db)"));
        assert!(elapsed_line(Duration::from_secs(3)).contains("Done in"));
    }
}
