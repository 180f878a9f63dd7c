use chrono::Duration;

/// Label shown when a distribution is due now (or no schedule is computed).
pub const READY: &str = "Ready";

/// Format the time remaining until a distribution as a countdown label
/// (e.g., "2d 5h 30m", "1h 30m", "45m").
///
/// A non-positive remainder is due now and reads "Ready". A positive
/// remainder under one minute has no non-zero component to print and
/// reads "Less than a minute".
pub fn format_remaining(diff: Duration) -> String {
    if diff <= Duration::zero() {
        return READY.to_string();
    }

    let total_minutes = diff.num_minutes();
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push(format!("{}m", minutes));
    }

    if parts.is_empty() {
        "Less than a minute".to_string()
    } else {
        parts.join(" ")
    }
}
