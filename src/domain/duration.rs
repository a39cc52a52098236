use chrono::Duration;

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_DAY: i64 = 86400;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;
const SECONDS_PER_MONTH: i64 = 30 * SECONDS_PER_DAY;
const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

/// Parses a short duration string like `1d`, `2h30m` or `1y6mo`.
///
/// Units are `y`, `mo`, `w`, `d`, `h`, `m`, `s`; components are summed.
/// Returns `None` for empty, malformed or overflowing input.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let mut total_seconds: i64 = 0;
    let mut chars = input.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(*c);
                chars.next();
            } else {
                break;
            }
        }
        if digits.is_empty() {
            return None;
        }
        let amount: i64 = digits.parse().ok()?;

        let unit_seconds = match chars.next()? {
            'y' => SECONDS_PER_YEAR,
            'w' => SECONDS_PER_WEEK,
            'd' => SECONDS_PER_DAY,
            'h' => SECONDS_PER_HOUR,
            's' => 1,
            // `m` is minutes unless followed by `o`
            'm' => {
                if chars.peek() == Some(&'o') {
                    chars.next();
                    SECONDS_PER_MONTH
                } else {
                    SECONDS_PER_MINUTE
                }
            }
            _ => return None,
        };

        total_seconds = total_seconds.checked_add(amount.checked_mul(unit_seconds)?)?;
    }

    if total_seconds <= 0 {
        return None;
    }
    Some(Duration::seconds(total_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_units() {
        assert_eq!(parse_duration("1s"), Some(Duration::seconds(1)));
        assert_eq!(parse_duration("5m"), Some(Duration::seconds(300)));
        assert_eq!(parse_duration("2h"), Some(Duration::seconds(7200)));
        assert_eq!(parse_duration("1d"), Some(Duration::seconds(86400)));
        assert_eq!(parse_duration("1w"), Some(Duration::seconds(604800)));
        assert_eq!(parse_duration("1mo"), Some(Duration::seconds(2592000)));
        assert_eq!(parse_duration("1y"), Some(Duration::seconds(31536000)));
    }

    #[test]
    fn sums_components() {
        assert_eq!(parse_duration("2h30m"), Some(Duration::seconds(9000)));
        assert_eq!(
            parse_duration("1y6mo"),
            Some(Duration::seconds(31536000 + 6 * 2592000))
        );
        assert_eq!(parse_duration("1m30s"), Some(Duration::seconds(90)));
    }

    #[test]
    fn distinguishes_minutes_from_months() {
        assert_eq!(parse_duration("2m"), Some(Duration::seconds(120)));
        assert_eq!(parse_duration("2mo"), Some(Duration::seconds(2 * 2592000)));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("abc"), None);
        assert_eq!(parse_duration("10"), None);
        assert_eq!(parse_duration("d10"), None);
        assert_eq!(parse_duration("3x"), None);
        assert_eq!(parse_duration("0s"), None);
    }
}
