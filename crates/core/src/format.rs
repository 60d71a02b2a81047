//! Number and duration formatting for machine UIs.

use chrono::NaiveDateTime;

/// Text colour tiers used for charge/progress readouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatColor {
    /// Below 16%.
    DarkRed,
    /// Below 32%.
    Red,
    /// Below 48%.
    Gold,
    /// Below 64%.
    Yellow,
    /// Below 80%.
    DarkGreen,
    /// 80% and above.
    Green,
}

impl ChatColor {
    /// Legacy `&` colour code.
    pub fn code(self) -> char {
        match self {
            ChatColor::DarkRed => '4',
            ChatColor::Red => 'c',
            ChatColor::Gold => '6',
            ChatColor::Yellow => 'e',
            ChatColor::DarkGreen => '2',
            ChatColor::Green => 'a',
        }
    }
}

/// Format an integer with US thousands separators (`1234567` → `1,234,567`).
pub fn format_big_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Round to at most two decimals, dropping trailing zeros (`#.##`).
pub fn round_decimal(value: f64) -> String {
    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Colour tier for a percentage in `0.0..=100.0`.
pub fn color_from_percentage(percentage: f32) -> ChatColor {
    if percentage < 16.0 {
        ChatColor::DarkRed
    } else if percentage < 32.0 {
        ChatColor::Red
    } else if percentage < 48.0 {
        ChatColor::Gold
    } else if percentage < 64.0 {
        ChatColor::Yellow
    } else if percentage < 80.0 {
        ChatColor::DarkGreen
    } else {
        ChatColor::Green
    }
}

/// Human readable time since `since`, at hour granularity.
pub fn elapsed_time(since: NaiveDateTime, now: NaiveDateTime) -> String {
    let hours = (now - since).num_hours().max(0);
    let (days, rest) = (hours / 24, hours % 24);

    if hours == 0 {
        "< 1h".to_string()
    } else if days == 0 {
        format!("{rest}h")
    } else if rest == 0 {
        format!("{days}d")
    } else {
        format!("{days}d {rest}h")
    }
}

/// Remaining time as `Nm Ns` (minutes omitted when zero).
pub fn time_left(seconds: u64) -> String {
    let minutes = seconds / 60;
    let seconds = seconds % 60;
    if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Nanoseconds rendered as milliseconds with two decimals.
pub fn as_millis(nanoseconds: u64) -> String {
    if nanoseconds == 0 {
        return "0ms".to_string();
    }
    format!("{}ms", round_decimal(nanoseconds as f64 / 1_000_000.0))
}

/// Parse a non-negative decimal integer, or return `default`.
pub fn parse_int_or(input: &str, default: i32) -> i32 {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return default;
    }
    input.parse().unwrap_or(default)
}

/// Parse a GitHub API timestamp (`2019-10-04T12:30:00Z`).
pub fn parse_github_date(input: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    input.strip_suffix('Z').unwrap_or(input).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn big_numbers_are_grouped() {
        assert_eq!(format_big_number(0), "0");
        assert_eq!(format_big_number(999), "999");
        assert_eq!(format_big_number(1000), "1,000");
        assert_eq!(format_big_number(1_234_567), "1,234,567");
        assert_eq!(format_big_number(-45_000), "-45,000");
    }

    #[test]
    fn decimals_are_trimmed() {
        assert_eq!(round_decimal(1.0), "1");
        assert_eq!(round_decimal(1.5), "1.5");
        assert_eq!(round_decimal(2.345_67), "2.35");
        assert_eq!(round_decimal(-0.001), "0");
    }

    #[test]
    fn percentage_tiers() {
        assert_eq!(color_from_percentage(0.0), ChatColor::DarkRed);
        assert_eq!(color_from_percentage(16.0), ChatColor::Red);
        assert_eq!(color_from_percentage(47.9), ChatColor::Gold);
        assert_eq!(color_from_percentage(63.0), ChatColor::Yellow);
        assert_eq!(color_from_percentage(79.99), ChatColor::DarkGreen);
        assert_eq!(color_from_percentage(100.0), ChatColor::Green);
        assert_eq!(ChatColor::Green.code(), 'a');
    }

    #[test]
    fn elapsed_time_buckets() {
        let start = parse_github_date("2020-01-01T00:00:00Z").unwrap();
        assert_eq!(elapsed_time(start, start + Duration::minutes(59)), "< 1h");
        assert_eq!(elapsed_time(start, start + Duration::hours(5)), "5h");
        assert_eq!(elapsed_time(start, start + Duration::hours(48)), "2d");
        assert_eq!(elapsed_time(start, start + Duration::hours(51)), "2d 3h");
    }

    #[test]
    fn time_left_and_millis() {
        assert_eq!(time_left(5), "5s");
        assert_eq!(time_left(125), "2m 5s");
        assert_eq!(as_millis(0), "0ms");
        assert_eq!(as_millis(1_234_567), "1.23ms");
        assert_eq!(as_millis(2_000_000), "2ms");
    }

    #[test]
    fn int_parsing_falls_back() {
        assert_eq!(parse_int_or("42", 7), 42);
        assert_eq!(parse_int_or("-1", 7), 7);
        assert_eq!(parse_int_or("abc", 7), 7);
        assert_eq!(parse_int_or("", 7), 7);
        assert_eq!(parse_int_or("99999999999", 7), 7);
    }

    #[test]
    fn github_dates_parse() {
        let date = parse_github_date("2019-10-04T12:30:00Z").unwrap();
        assert_eq!(date.to_string(), "2019-10-04 12:30:00");
        assert!(parse_github_date("yesterday").is_err());
    }
}
