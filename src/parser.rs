use crate::models::Event;
use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Lines containing any of these are known-benign and produce no event.
pub const IGNORED_PATTERNS: [&str; 4] = ["/static/bbox/", "/static/center", "/favicon.ico", "MISS 404"];

const LOG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[display(fmt = "line does not match the tile request format")]
    NoMatch,
    #[display(fmt = "invalid log timestamp")]
    Timestamp,
    #[display(fmt = "invalid layergroup timestamp")]
    LayergroupTimestamp,
    #[display(fmt = "invalid tile coordinate")]
    Integer,
}

#[derive(Debug, Display, Clone, PartialEq, Eq)]
#[display(fmt = "Unable to parse line '{}': {}", line, reason)]
pub struct ParseError {
    pub line: String,
    pub reason: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: impl AsRef<str>, reason: ParseErrorKind) -> Self {
        ParseError {
            line: line.as_ref().to_owned(),
            reason,
        }
    }
}

impl std::error::Error for ParseError {}

// Syslog-wrapped access log line of a tile request against the v1 map API,
// ASCII word characters and digits only.
// e.g. `<14>2015-06-01T10:00:00Z host tiler[42]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png`
static TILE_LOG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^<[0-9]+>
        (?P<time>[0-9]+-[0-9]+-[0-9]+T[0-9]+:[0-9]+:[0-9]+Z)
        \ .*?\[[0-9]+\]:
        \ (?P<ip>[0-9]+.[0-9]+.[0-9]+.[0-9]+)
        \ .*?\ GET
        \ /(?P<user>[A-Za-z0-9_-]+)/api/v1/map/
        (?:(?P<template>[A-Za-z0-9_-]+@[A-Za-z0-9_]+)@)?
        (?P<layergroup>[A-Za-z0-9_]+):(?P<layergroup_ts>[0-9]+(?:\.[0-9]+)?)/
        /?
        (?P<z>[0-9]+)/
        (?P<x>-?[0-9]+)/
        (?P<y>-?[0-9]+)
        (?:/-?[0-9]+)?        # torque parameter, discarded
        \.(?P<type>[A-Za-z0-9_.]+)
        ",
    )
    .unwrap()
});

pub fn is_ignored(line: &str) -> bool {
    IGNORED_PATTERNS.iter().any(|pattern| line.contains(pattern))
}

/// Parses one log line.
///
/// Returns `Ok(None)` for ignorable lines. Any other line that does not
/// describe a tile request is an error; callers are expected to stop there.
pub fn parse(line: &str) -> Result<Option<Event>, ParseError> {
    if is_ignored(line) {
        debug!(line, "Skipping ignorable line");
        return Ok(None);
    }

    let captures = TILE_LOG_REGEX
        .captures(line)
        .ok_or_else(|| ParseError::new(line, ParseErrorKind::NoMatch))?;

    if let (
        Some(timematch),
        Some(ipmatch),
        Some(usermatch),
        Some(layergroupmatch),
        Some(layergroup_tsmatch),
        Some(zmatch),
        Some(xmatch),
        Some(ymatch),
        Some(typematch),
    ) = (
        captures.name("time"),
        captures.name("ip"),
        captures.name("user"),
        captures.name("layergroup"),
        captures.name("layergroup_ts"),
        captures.name("z"),
        captures.name("x"),
        captures.name("y"),
        captures.name("type"),
    ) {
        let time = parse_log_time(timematch.as_str())
            .ok_or_else(|| ParseError::new(line, ParseErrorKind::Timestamp))?;
        let layergroup_timestamp = parse_epoch_millis(layergroup_tsmatch.as_str())
            .ok_or_else(|| ParseError::new(line, ParseErrorKind::LayergroupTimestamp))?;
        let z = zmatch
            .as_str()
            .parse::<u32>()
            .map_err(|_| ParseError::new(line, ParseErrorKind::Integer))?;
        let x = xmatch
            .as_str()
            .parse::<i64>()
            .map_err(|_| ParseError::new(line, ParseErrorKind::Integer))?;
        let y = ymatch
            .as_str()
            .parse::<i64>()
            .map_err(|_| ParseError::new(line, ParseErrorKind::Integer))?;

        Ok(Some(Event {
            time,
            ip_address: ipmatch.as_str().to_owned(),
            user: usermatch.as_str().to_owned(),
            named_map_template: captures.name("template").map(|m| m.as_str().to_owned()),
            layergroup: layergroupmatch.as_str().to_owned(),
            layergroup_timestamp,
            z,
            x,
            y,
            r#type: typematch.as_str().to_owned(),
        }))
    } else {
        // All groups but the template are mandatory in the pattern
        Err(ParseError::new(line, ParseErrorKind::NoMatch))
    }
}

fn parse_log_time(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, LOG_TIME_FORMAT)
        .ok()
        // No leap seconds: second 60 is out of range
        .filter(|naive| naive.nanosecond() < 1_000_000_000)
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Unix epoch milliseconds (possibly fractional) to a UTC instant, rounded to
/// the microsecond.
fn parse_epoch_millis(value: &str) -> Option<DateTime<Utc>> {
    let millis = value.parse::<f64>().ok()?;
    let micros = (millis * 1000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    let micros = micros as i64;
    DateTime::from_timestamp(
        micros.div_euclid(1_000_000),
        (micros.rem_euclid(1_000_000) * 1_000) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    const LINE: &str = "<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png HTTP/1.1";

    fn utc(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn parses_tile_request() {
        let event = parse(LINE).unwrap().unwrap();
        assert_eq!(
            Event {
                time: utc("2015-06-01T10:00:00Z"),
                ip_address: "10.0.0.1".to_owned(),
                user: "alice".to_owned(),
                named_map_template: None,
                layergroup: "0123abcd".to_owned(),
                layergroup_timestamp: utc("2015-06-01T10:00:00Z"),
                z: 2,
                x: 1,
                y: 3,
                r#type: "png".to_owned(),
            },
            event
        );
    }

    #[test]
    fn parses_named_map_template() {
        let line = "<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /my-org/api/v1/map/tpl-stores@a1b2@0123abcd:1433152800000/4/-3/7.grid.json";
        let event = parse(line).unwrap().unwrap();
        assert_eq!(Some("tpl-stores@a1b2".to_owned()), event.named_map_template);
        assert_eq!("my-org", event.user);
        assert_eq!("0123abcd", event.layergroup);
        assert_eq!((4, -3, 7), (event.z, event.x, event.y));
        assert_eq!("grid.json", event.r#type);
    }

    #[test]
    fn discards_torque_parameter() {
        let line = "<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000//3/-1/-2/5.json.torque";
        let event = parse(line).unwrap().unwrap();
        assert_eq!((3, -1, -2), (event.z, event.x, event.y));
        assert_eq!("json.torque", event.r#type);
    }

    #[test]
    fn fractional_layergroup_timestamp() {
        let line = "<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800123.5/0/0/0.png";
        let event = parse(line).unwrap().unwrap();
        assert_eq!(utc("2015-06-01T10:00:00.123500Z"), event.layergroup_timestamp);
    }

    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/static/bbox/0,0,1,1/100/100.png"; "when static bbox")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/static/center/x.png"; "when static center")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /favicon.ico"; "when favicon")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 MISS 404 GET /alice/api/v1/map/nope"; "when miss 404")]
    #[test_case("garbage MISS 404 garbage"; "when otherwise malformed")]
    fn skips_ignorable_lines(line: &str) {
        assert_eq!(Ok(None), parse(line));
    }

    #[test_case("" => ParseErrorKind::NoMatch; "when empty")]
    #[test_case("2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::NoMatch; "when priority missing")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 POST /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::NoMatch; "when not a get")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v2/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::NoMatch; "when other api version")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd/2/1/3.png" => ParseErrorKind::NoMatch; "when layergroup timestamp missing")]
    #[test_case("<14>2015-13-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::Timestamp; "when month out of range")]
    #[test_case("<14>2015-06-30T23:59:60Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::Timestamp; "when leap second")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/99999999999/1/3.png" => ParseErrorKind::Integer; "when zoom overflows")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /ålice/api/v1/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::NoMatch; "when user is not ascii")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: 10.0.0.1 HIT 200 GET /alice/api/v1/map/lgé:1433152800000/2/1/3.png" => ParseErrorKind::NoMatch; "when layergroup is not ascii")]
    #[test_case("<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: ١.٢.٣.٤ HIT 200 GET /alice/api/v1/map/0123abcd:1433152800000/2/1/3.png" => ParseErrorKind::NoMatch; "when ip digits are not ascii")]
    fn rejects_malformed_lines(line: &str) -> ParseErrorKind {
        let error = parse(line).unwrap_err();
        assert_eq!(line, error.line);
        error.reason
    }

    #[test]
    fn error_message_contains_line() {
        let line = "<14>not a tile request";
        let message = parse(line).unwrap_err().to_string();
        assert!(message.contains(line), "{}", message);
    }

    #[test]
    fn trailing_content_is_ignored() {
        let line = format!("{} 0.004 \"Mozilla/5.0\"", LINE);
        assert_eq!(parse(LINE), parse(&line));
    }

    proptest! {
        #[test]
        fn ignorable_lines_always_skip(
            prefix in ".*",
            pattern in prop::sample::select(IGNORED_PATTERNS.to_vec()),
            suffix in ".*",
        ) {
            let line = format!("{}{}{}", prefix, pattern, suffix);
            prop_assert_eq!(Ok(None), parse(&line));
        }

        #[test]
        fn well_formed_lines_round_trip(
            ip in (0u8.., 0u8.., 0u8.., 0u8..),
            user in "[a-z][a-z0-9-]{0,12}",
            template in prop::option::of("[a-z][a-z0-9-]{0,8}@[a-z0-9]{1,6}"),
            layergroup in "[a-f0-9]{4,16}",
            millis in 0i64..4_000_000_000_000,
            z in 0u32..30,
            x in -100_000i64..100_000,
            y in -100_000i64..100_000,
            extension in prop::sample::select(vec!["png", "grid.json", "json.torque", "mvt"]),
        ) {
            let path = match &template {
                Some(template) => format!("{}@{}", template, layergroup),
                None => layergroup.clone(),
            };
            let line = format!(
                "<14>2015-06-01T10:00:00Z tiles-01 varnishncsa[4321]: {}.{}.{}.{} HIT 200 GET /{}/api/v1/map/{}:{}/{}/{}/{}.{}",
                ip.0, ip.1, ip.2, ip.3, user, path, millis, z, x, y, extension
            );
            let event = parse(&line).unwrap().unwrap();
            prop_assert_eq!(format!("{}.{}.{}.{}", ip.0, ip.1, ip.2, ip.3), event.ip_address);
            prop_assert_eq!(user, event.user);
            prop_assert_eq!(template, event.named_map_template);
            prop_assert_eq!(layergroup, event.layergroup);
            prop_assert_eq!(millis, event.layergroup_timestamp.timestamp_millis());
            prop_assert_eq!((z, x, y), (event.z, event.x, event.y));
            prop_assert_eq!(extension, event.r#type.as_str());
        }

        #[test]
        fn non_matching_lines_fail_with_line(line in "[a-zA-Z0-9 ]*") {
            let error = parse(&line).unwrap_err();
            prop_assert_eq!(ParseErrorKind::NoMatch, error.reason);
            prop_assert_eq!(line, error.line);
        }
    }
}
