// src/config/duration.rs

use std::time::Duration;

/// Parse `<integer><unit>` with unit `ms`, `s`, `m` or `h` (`"100ms"`,
/// `"5s"`).
///
/// Shared by `--interval` / `--grace-period` and the config file keys, so
/// the error is a plain string clap can display.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    let split = s
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| format!("{input:?}: missing unit (ms, s, m or h)"))?;
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        return Err(format!("{input:?}: missing number"));
    }
    let n: u64 = digits
        .parse()
        .map_err(|e| format!("{input:?}: {e}"))?;

    let secs_per_unit = match unit {
        "ms" => return Ok(Duration::from_millis(n)),
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        other => return Err(format!("{input:?}: unknown unit {other:?} (ms, s, m or h)")),
    };

    n.checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("{input:?}: duration too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units() {
        assert_eq!(parse_duration("100ms"), Ok(Duration::from_millis(100)));
        assert_eq!(parse_duration(" 3s "), Ok(Duration::from_secs(3)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h"), Ok(Duration::from_secs(3600)));
    }

    #[test]
    fn malformed() {
        for bad in ["", "250", "ms", "5days", "1.5s", "-1s", "3 s"] {
            assert!(parse_duration(bad).is_err(), "{bad:?} should not parse");
        }
        assert!(parse_duration(&format!("{}h", u64::MAX)).is_err());
    }
}
