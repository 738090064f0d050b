//! Time labels for markers and result summaries.

/// Pretty-print a marker timestamp as `(MM:SS)`, or `(HH:MM:SS)` once
/// hours are non-zero.
pub fn marker_time(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("({:02}:{:02}:{:02})", hours, minutes, seconds)
    } else {
        format!("({:02}:{:02})", minutes, seconds)
    }
}

/// Format a covered duration as `{H}h {M}m {S}s`. No component is omitted.
pub fn summary_time(total_secs: u64) -> String {
    format!(
        "{}h {}m {}s",
        total_secs / 3600,
        (total_secs / 60) % 60,
        total_secs % 60
    )
}
