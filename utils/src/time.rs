//! Time formatting helpers for log lines and CLI output.

use commons_types::Timestamp;

/// Format a duration in seconds, keeping the two most significant units.
pub fn format_duration(secs: u64) -> String {
    const UNITS: [(u64, &str); 4] = [(86_400, "d"), (3_600, "h"), (60, "m"), (1, "s")];

    if secs == 0 {
        return "0s".to_string();
    }
    let mut rest = secs;
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in UNITS {
        if rest >= size {
            parts.push(format!("{}{}", rest / size, suffix));
            rest %= size;
        } else if !parts.is_empty() {
            parts.push(format!("0{suffix}"));
        }
        if parts.len() == 2 {
            break;
        }
    }
    parts.join(" ")
}

/// Time left until `deadline`, or `"elapsed"` once it has passed.
pub fn format_remaining(deadline: Timestamp, now: Timestamp) -> String {
    if now >= deadline {
        "elapsed".to_string()
    } else {
        format_duration(deadline.as_secs() - now.as_secs())
    }
}
