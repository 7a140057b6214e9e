//! Terminal presentation. Every function returns a `String` so the caller can
//! print it or write it to a file unchanged.

use colored::*;

pub mod markup;
pub mod ticket;
pub mod wiki;

pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
pub const SHORT_RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Surrounding padding is ignored when picking the color.
pub fn status_color(status: &str) -> ColoredString {
    match status.trim().to_lowercase().as_str() {
        "open" | "to do" | "new" => status.red(),
        "in progress" | "in development" => status.yellow(),
        "done" | "closed" | "resolved" => status.green(),
        "review" | "code review" | "in review" => status.cyan(),
        _ => status.white(),
    }
}

pub fn priority_color(priority: &str) -> ColoredString {
    match priority.to_lowercase().as_str() {
        "highest" | "critical" => priority.red().bold(),
        "high" => priority.red(),
        "medium" => priority.yellow(),
        "low" => priority.green(),
        "lowest" => priority.bright_black(),
        _ => priority.white(),
    }
}

/// Statuses hidden from epic listings unless everything is requested.
pub fn is_closed_status(status: &str) -> bool {
    matches!(
        status.to_lowercase().as_str(),
        "closed" | "done" | "resolved"
    )
}

/// Human-readable size in binary units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{} B", bytes);
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT && exp < 5 {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let unit = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, unit)
}

/// Shortens `text` to at most `max` characters, ending in `...` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= 3 {
        return text.chars().take(max).collect();
    }
    let kept: String = text.chars().take(max - 3).collect();
    format!("{}...", kept)
}

/// `2024-05-01T10:00:00.000+0000` becomes `2024-05-01`.
pub fn date_prefix(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(1023), "1023 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer summary line", 10), "a longe...");
        assert_eq!(truncate("ünïcödé text", 6), "ünï...");
    }

    #[test]
    fn test_date_prefix() {
        assert_eq!(date_prefix("2024-05-01T10:00:00.000+0000"), "2024-05-01");
        assert_eq!(date_prefix("2024"), "2024");
    }

    #[test]
    fn test_closed_statuses() {
        assert!(is_closed_status("Done"));
        assert!(is_closed_status("RESOLVED"));
        assert!(!is_closed_status("In Progress"));
    }
}
