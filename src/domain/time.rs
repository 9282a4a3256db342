//! Timestamp parsing and the fixed sampling grid.

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};

use crate::error::QueryError;

/// Sampling interval of the telemetry exports.
pub const DEFAULT_STEP_MINUTES: i64 = 15;

/// Naive layouts accepted on the wire; all are interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d-%m-%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
];

/// Parse a request or export timestamp into a UTC instant.
///
/// RFC 3339 input with an offset is normalised to UTC; naive input is taken
/// as already being UTC.
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, QueryError> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| QueryError::InvalidTimestamp(input.to_string()))
}

/// ISO-8601 rendering used in API responses, e.g. `2020-05-15T06:00:00Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The `len` grid instants ending at (and including) `anchor`, ascending.
///
/// Fails with `InvalidTimestamp` when the window would start before the
/// earliest representable instant.
pub fn grid_slots(
    anchor: DateTime<Utc>,
    len: usize,
    step: Duration,
) -> Result<Vec<DateTime<Utc>>, QueryError> {
    (0..len)
        .rev()
        .map(|back| {
            i32::try_from(back)
                .ok()
                .and_then(|back| step.checked_mul(back))
                .and_then(|offset| anchor.checked_sub_signed(offset))
                .ok_or_else(|| QueryError::InvalidTimestamp(format_timestamp(anchor)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn expected() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 15, 6, 15, 0).unwrap()
    }

    #[rstest]
    #[case("2020-05-15 06:15:00")]
    #[case("2020-05-15T06:15:00")]
    #[case("2020-05-15T06:15:00Z")]
    #[case("2020-05-15T08:15:00+02:00")]
    #[case("2020-05-15 06:15")]
    #[case("15-05-2020 06:15")]
    fn test_parse_accepted_layouts(#[case] input: &str) {
        assert_eq!(parse_timestamp(input).unwrap(), expected());
    }

    #[rstest]
    #[case("")]
    #[case("yesterday")]
    #[case("2020-13-15 06:15:00")]
    #[case("2020-05-15 25:00:00")]
    fn test_parse_rejects_garbage(#[case] input: &str) {
        assert!(matches!(
            parse_timestamp(input),
            Err(QueryError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_format_round_trips_through_parse() {
        let s = format_timestamp(expected());
        assert_eq!(s, "2020-05-15T06:15:00Z");
        assert_eq!(parse_timestamp(&s).unwrap(), expected());
    }

    #[test]
    fn test_grid_slots_end_at_anchor() {
        let step = Duration::minutes(DEFAULT_STEP_MINUTES);
        let slots = grid_slots(expected(), 4, step).unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0], expected() - Duration::minutes(45));
        assert_eq!(*slots.last().unwrap(), expected());
        assert!(slots.windows(2).all(|w| w[1] - w[0] == step));
    }

    #[test]
    fn test_grid_slots_before_earliest_instant_is_rejected() {
        let earliest = parse_timestamp("-262143-01-01 00:00:00").unwrap();
        let step = Duration::minutes(DEFAULT_STEP_MINUTES);
        assert!(matches!(
            grid_slots(earliest, 24, step),
            Err(QueryError::InvalidTimestamp(_))
        ));
        assert_eq!(grid_slots(earliest, 1, step).unwrap(), vec![earliest]);
    }
}
