/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional reading with its unit, or `-` if absent
pub fn format_reading(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.1} {}", v, unit),
        None => "-".to_string(),
    }
}

/// Format an optional circuit flag as on/off, or `-` if absent
pub fn format_flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "on".to_string(),
        Some(false) => "off".to_string(),
        None => "-".to_string(),
    }
}
