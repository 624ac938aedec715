// src/utils.rs

/// Format large numbers in a human-readable way
pub fn format_number(num: f64) -> String {
    if num >= 1_000_000_000.0 {
        format!("{:.2}B", num / 1_000_000_000.0)
    } else if num >= 1_000_000.0 {
        format!("{:.2}M", num / 1_000_000.0)
    } else if num >= 1_000.0 {
        format!("{:.2}K", num / 1_000.0)
    } else {
        format!("{:.2}", num)
    }
}

/// Trim a handle-or-name and drop a single leading `@`.
pub fn normalize_identifier(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('@').unwrap_or(trimmed).trim()
}

/// Query-string flags as the web UI sends them: `true`, `1`, `yes`.
pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true") | Some("1") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_leading_at_and_whitespace() {
        assert_eq!(normalize_identifier("@pepecoineth"), "pepecoineth");
        assert_eq!(normalize_identifier("  @elonmusk "), "elonmusk");
        assert_eq!(normalize_identifier("plainname"), "plainname");
        assert_eq!(normalize_identifier("@"), "");
    }

    #[test]
    fn flags_accept_common_truthy_spellings() {
        assert!(parse_flag(Some("true")));
        assert!(parse_flag(Some("TRUE")));
        assert!(parse_flag(Some("1")));
        assert!(!parse_flag(Some("false")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn formats_large_numbers() {
        assert_eq!(format_number(1_500_000.0), "1.50M");
        assert_eq!(format_number(999.0), "999.00");
    }
}
