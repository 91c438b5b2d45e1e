//! Formatting helpers shared across UIs.

/// Maximum characters of an error message shown in list views.
pub const ERROR_PREVIEW_CHARS: usize = 100;

/// Format a score with two decimals (e.g., "0.75").
pub fn format_score(score: f64) -> String {
    format!("{:.2}", score)
}

/// Format an optional duration in milliseconds, or "N/A" if missing.
pub fn format_millis(millis: Option<f64>) -> String {
    match millis {
        Some(ms) => format!("{:.2}", ms),
        None => "N/A".to_string(),
    }
}

/// Shorten an error message for list views, marking the cut with "...".
pub fn error_preview(error: &str) -> String {
    if error.chars().count() > ERROR_PREVIEW_CHARS {
        let cut: String = error.chars().take(ERROR_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        error.to_string()
    }
}

/// Format progress as "(done/total)".
pub fn format_progress(done: u64, total: u64) -> String {
    format!("({}/{})", done, total)
}
