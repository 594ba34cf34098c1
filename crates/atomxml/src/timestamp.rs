//! Date-construct timestamps
//!
//! Atom carries timestamps as `YYYY-MM-DDThh:mm:ss[.fraction](Z|±hh:mm)`.
//! Parsing is tolerant (anything else is `None`, per the generous-decode
//! policy); formatting always emits an explicit offset or `Z`.

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Parse a timestamp, `None` on any mismatch
pub fn parse(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text.trim(), &Rfc3339).ok()
}

/// Format a timestamp in the same grammar; UTC renders as `Z`
pub fn format(timestamp: OffsetDateTime) -> String {
    timestamp.format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_parse_utc() {
        let ts = parse("2012-12-13T08:29:29Z");
        assert_eq!(ts, Some(datetime!(2012-12-13 08:29:29 UTC)));
    }

    #[test]
    fn test_parse_offset_and_fraction() {
        let ts = parse("2012-12-13T08:29:29.25+01:30");
        assert_eq!(ts, Some(datetime!(2012-12-13 08:29:29.25 +01:30)));
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert!(parse("\n  2012-12-13T08:29:29Z  ").is_some());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert_eq!(parse("yesterday"), None);
        assert_eq!(parse("2012-12-13"), None);
        assert_eq!(parse("2012-12-13T08:29:29"), None);
        assert_eq!(parse(""), None);
    }

    #[test]
    fn test_format_utc_uses_z() {
        assert_eq!(
            format(datetime!(2012-12-13 08:29:29 UTC)),
            "2012-12-13T08:29:29Z"
        );
    }

    #[test]
    fn test_format_keeps_offset() {
        assert_eq!(
            format(datetime!(2012-12-13 08:29:29 -05:00)),
            "2012-12-13T08:29:29-05:00"
        );
    }

    #[test]
    fn test_round_trip() {
        let ts = datetime!(2020-02-29 23:59:59.5 +02:00);
        assert_eq!(parse(&format(ts)), Some(ts));
    }
}
