use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, bail};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

const EPOCH_SECONDS_CUTOFF: i128 = 100_000_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;
const NANOS_PER_MILLI: i128 = 1_000_000;

#[must_use]
pub fn unix_timestamp_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

/// Parses an upstream timestamp: RFC 3339, or epoch seconds / milliseconds.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        bail!("timestamp input is empty");
    }

    if let Ok(epoch_raw) = candidate.parse::<i128>() {
        if epoch_raw < 0 {
            bail!("negative epoch values are not supported: {candidate}");
        }
        let nanos = if epoch_raw < EPOCH_SECONDS_CUTOFF {
            epoch_raw.checked_mul(NANOS_PER_SECOND)
        } else {
            epoch_raw.checked_mul(NANOS_PER_MILLI)
        }
        .ok_or_else(|| anyhow::anyhow!("epoch value overflows: {candidate}"))?;
        return OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map_err(|error| anyhow::anyhow!("epoch value out of range ({error}): {candidate}"));
    }

    if let Ok(parsed) = OffsetDateTime::parse(candidate, &Rfc3339) {
        return Ok(parsed);
    }

    bail!("unsupported timestamp format: {candidate}");
}

/// RFC 3339 rendering in UTC, second precision.
#[must_use]
pub fn format_utc(timestamp: OffsetDateTime) -> String {
    let dt = timestamp.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

#[cfg(test)]
mod tests {
    use super::{format_utc, parse_timestamp};

    #[test]
    fn parses_rfc3339_utc() {
        let parsed = parse_timestamp("2026-02-05T07:00:03Z").expect("timestamp should parse");
        assert_eq!(parsed.unix_timestamp(), 1_770_274_803);
        assert_eq!(format_utc(parsed), "2026-02-05T07:00:03Z");
    }

    #[test]
    fn parses_rfc3339_with_offset_and_renders_utc() {
        let parsed =
            parse_timestamp("2026-02-04T23:00:03-08:00").expect("timestamp should parse");
        assert_eq!(parsed.unix_timestamp(), 1_770_274_803);
        assert_eq!(format_utc(parsed), "2026-02-05T07:00:03Z");
    }

    #[test]
    fn infers_epoch_seconds_and_millis() {
        let seconds = parse_timestamp("1770274803").expect("seconds should parse");
        let millis = parse_timestamp("1770274803000").expect("milliseconds should parse");
        assert_eq!(seconds, millis);
    }

    #[test]
    fn rejects_negative_epoch() {
        let err = parse_timestamp("-1").expect_err("negative epoch should fail");
        assert!(err.to_string().contains("negative epoch values"));
    }

    #[test]
    fn rejects_unsupported_string() {
        let err = parse_timestamp("next friday").expect_err("unsupported string should fail");
        assert!(err.to_string().contains("unsupported timestamp format"));
    }

    #[test]
    fn rejects_epoch_that_overflows_instead_of_panicking() {
        let err = parse_timestamp("99999999999999999999999999999999999")
            .expect_err("oversized epoch should fail");
        assert!(err.to_string().contains("overflows"));
    }
}
