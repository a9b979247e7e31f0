//! Report formatting.
//!
//! Turns derived statuses and summaries into plain text lines for logs and simple
//! text reports. Nothing here computes a status; it only formats what the engine produced.

use crate::core::aggregate::{Summary, Totals};
use crate::core::reconcile::{AttendanceBand, AttendanceStatus, FeeStatus, Row};
use std::fmt::Display;

/// Percentage of `expected` that has been settled.
///
/// Returns 0 when nothing is expected.
#[must_use]
pub fn settled_percent(totals: &Totals) -> f64 {
    if totals.expected == 0.0 {
        return 0.0;
    }

    (totals.settled / totals.expected) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small, so the result fits in [0, length]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// Formats an amount with two decimals and thousands separators, e.g. `24,000.00`.
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{cents}")
}

/// One line per student: name, bucket, paid of total, balance.
#[must_use]
pub fn format_fee_row(row: &Row<FeeStatus>) -> String {
    let status = &row.status;
    let mut line = format!(
        "{} ({}) | {} | paid {} of {} | due {}",
        row.entity.display_name,
        row.entity.id,
        status.bucket,
        format_amount(status.paid),
        format_amount(status.total),
        format_amount(status.due),
    );
    let overdue: Vec<String> = status
        .overdue_components()
        .map(|c| c.key.to_string())
        .collect();
    if !overdue.is_empty() {
        line.push_str(&format!(" | overdue: {}", overdue.join(", ")));
    }
    line
}

/// One line per student: name, band, ratio, day counts.
#[must_use]
pub fn format_attendance_row(row: &Row<AttendanceStatus>) -> String {
    let status = &row.status;
    format!(
        "{} ({}) | {} | {:.1}% | present {} absent {} late {} of {} days",
        row.entity.display_name,
        row.entity.id,
        status.band,
        status.ratio * 100.0,
        status.present,
        status.absent,
        status.late,
        status.total_days,
    )
}

/// One line per group: count, settled of expected with a progress bar, bucket counts.
#[must_use]
pub fn format_summary<K: Display, B: Ord + Display>(summary: &Summary<K, B>) -> String {
    let buckets: Vec<String> = summary
        .bucket_counts
        .iter()
        .map(|(bucket, count)| format!("{bucket} {count}"))
        .collect();

    format!(
        "{}: {} | {} of {} {} | {}",
        summary.group_key,
        summary.count,
        format_amount(summary.totals.settled),
        format_amount(summary.totals.expected),
        format_progress_bar(settled_percent(&summary.totals), None),
        buckets.join(", "),
    )
}

/// One line per class for attendance: students, attendance rate, band counts.
#[must_use]
pub fn format_attendance_summary<K: Display>(summary: &Summary<K, AttendanceBand>) -> String {
    let bands: Vec<String> = summary
        .bucket_counts
        .iter()
        .map(|(band, count)| format!("{band} {count}"))
        .collect();

    format!(
        "{}: {} | attendance {} | {}",
        summary.group_key,
        summary.count,
        format_progress_bar(settled_percent(&summary.totals), None),
        bands.join(", "),
    )
}
