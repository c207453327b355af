//! UME timestamp handling
//!
//! UME stores timestamps as `yyyyMMddHHmmss` followed by a literal `Z`,
//! rendered as wall-clock time after shifting the instant by an hour offset.
//! The offset comes from configuration, or is the local standard (non-DST)
//! offset when none is configured.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use tracing::warn;

use idm_connector::error::{ConnectorError, ConnectorResult};
use idm_connector::operation::AttributeValue;

use crate::config::UmeConfig;

/// Wire format without the trailing suffix.
pub const UME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Literal suffix of wire timestamps.
pub const UME_SUFFIX: char = 'Z';

/// Format of the validity window strings in configuration.
pub const CONFIG_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration sentinel meaning "the instant of the write".
pub const CURRENT_TIME: &str = "<CURRENT_TIME>";

/// Length of a well-formed wire timestamp.
const UME_LENGTH: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Suffix,
}

const LAYOUT: [(Field, usize); 7] = [
    (Field::Year, 4),
    (Field::Month, 2),
    (Field::Day, 2),
    (Field::Hour, 2),
    (Field::Minute, 2),
    (Field::Second, 2),
    (Field::Suffix, 1),
];

/// Zone in which wall-clock timestamps are rendered and read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderZone {
    Local,
    Fixed(FixedOffset),
}

/// Converts instants to and from UME timestamps.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    offset: Duration,
    zone: RenderZone,
}

impl DateNormalizer {
    /// Create a normalizer rendering in the local time zone.
    ///
    /// `ume_offset` is a whole hour count. `None` uses the local standard offset.
    pub fn new(ume_offset: Option<i32>) -> Self {
        let offset = ume_offset
            .map(|hours| Duration::hours(i64::from(hours)))
            .unwrap_or_else(local_standard_offset);
        Self {
            offset,
            zone: RenderZone::Local,
        }
    }

    /// Create a normalizer rendering in a fixed zone.
    ///
    /// Without `ume_offset` the zone's own offset is used.
    pub fn with_zone(ume_offset: Option<i32>, zone: FixedOffset) -> Self {
        let offset = ume_offset.map_or_else(
            || Duration::seconds(i64::from(zone.local_minus_utc())),
            |hours| Duration::hours(i64::from(hours)),
        );
        Self {
            offset,
            zone: RenderZone::Fixed(zone),
        }
    }

    /// Create a normalizer from connector configuration.
    pub fn from_config(config: &UmeConfig) -> Self {
        Self::new(config.ume_offset)
    }

    /// Offset subtracted on encode and added back on decode.
    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Encode an instant as a UME timestamp.
    pub fn encode(&self, instant: DateTime<Utc>) -> String {
        let shifted = instant - self.offset;
        let wall = match self.zone {
            RenderZone::Local => shifted.with_timezone(&Local).naive_local(),
            RenderZone::Fixed(zone) => shifted.with_timezone(&zone).naive_local(),
        };
        format!("{}{UME_SUFFIX}", wall.format(UME_FORMAT))
    }

    /// Decode a UME timestamp into an instant.
    ///
    /// Inputs that are not 15 characters long are still attempted: longer
    /// inputs widen the year, shorter inputs drop leading pattern characters.
    pub fn decode(&self, value: &str) -> ConnectorResult<DateTime<Utc>> {
        if value.len() != UME_LENGTH {
            warn!(value = %value, "Unexpected input for date parsing");
        }
        let naive = parse_positional(value)?;
        let instant = self.from_wall_clock(&naive).ok_or_else(|| parse_error(value))?;
        Ok(instant + self.offset)
    }

    /// Current instant as a UME timestamp.
    pub fn now(&self) -> String {
        self.encode(Utc::now())
    }

    /// Resolve a configured validity window boundary.
    ///
    /// Blank yields `None`, the sentinel yields the current instant, anything
    /// else is read as `yyyy-MM-dd HH:mm:ss` in the render zone.
    pub fn parse_valid_time(&self, text: &str) -> ConnectorResult<Option<String>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        if text == CURRENT_TIME {
            return Ok(Some(self.now()));
        }

        let naive = NaiveDateTime::parse_from_str(text, CONFIG_FORMAT).map_err(|e| {
            ConnectorError::invalid_configuration(format!(
                "Error in parsing conf time : value={text}: {e}"
            ))
        })?;
        let instant = self.from_wall_clock(&naive).ok_or_else(|| {
            ConnectorError::invalid_configuration(format!(
                "Error in parsing conf time : value={text}: no such local time"
            ))
        })?;
        Ok(Some(self.encode(instant)))
    }

    /// Encode a host date value (instant or epoch milliseconds).
    pub fn encode_value(&self, value: &AttributeValue) -> ConnectorResult<Option<String>> {
        match value {
            AttributeValue::Null => Ok(None),
            AttributeValue::DateTime(instant) => Ok(Some(self.encode(*instant))),
            AttributeValue::Integer(millis) => {
                let instant = Utc.timestamp_millis_opt(*millis).single().ok_or_else(|| {
                    ConnectorError::invalid_attribute_value(format!(
                        "Epoch milliseconds out of range: {millis}"
                    ))
                })?;
                Ok(Some(self.encode(instant)))
            }
            AttributeValue::Array(values) => match values.first() {
                Some(first) => self.encode_value(first),
                None => Ok(None),
            },
            other => Err(ConnectorError::invalid_attribute_value(format!(
                "Unknown date object type: {other:?}"
            ))),
        }
    }

    fn from_wall_clock(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self.zone {
            RenderZone::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
            RenderZone::Fixed(zone) => zone
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Standard offset of the local zone, ignoring daylight saving.
fn local_standard_offset() -> Duration {
    let year = Local::now().year();
    [(1, 1), (7, 1)]
        .into_iter()
        .filter_map(|(month, day)| NaiveDate::from_ymd_opt(year, month, day))
        .filter_map(|date| date.and_hms_opt(12, 0, 0))
        .filter_map(|noon| Local.from_local_datetime(&noon).earliest())
        .map(|dt| dt.offset().local_minus_utc())
        .min()
        .map_or_else(Duration::zero, |secs| Duration::seconds(i64::from(secs)))
}

fn parse_error(value: &str) -> ConnectorError {
    ConnectorError::invalid_attribute_value(format!("Error in parsing ume time : value={value}"))
}

fn layout_for(len: usize) -> Vec<(Field, usize)> {
    let mut layout = LAYOUT.to_vec();
    if len > UME_LENGTH {
        layout[0].1 += len - UME_LENGTH;
    } else {
        let mut drop = UME_LENGTH - len;
        for slot in &mut layout {
            let cut = drop.min(slot.1);
            slot.1 -= cut;
            drop -= cut;
            if drop == 0 {
                break;
            }
        }
        layout.retain(|(_, width)| *width > 0);
    }
    layout
}

/// Two-digit years fall within 80 years before and 20 years after now.
fn expand_two_digit_year(yy: i32) -> i32 {
    let start = Utc::now().year() - 80;
    let year = (start / 100) * 100 + yy;
    if year < start {
        year + 100
    } else {
        year
    }
}

fn parse_positional(value: &str) -> ConnectorResult<NaiveDateTime> {
    if !value.is_ascii() {
        return Err(parse_error(value));
    }

    let (mut year, mut month, mut day) = (1970, 1, 1);
    let (mut hour, mut minute, mut second) = (0, 0, 0);

    let layout = layout_for(value.len());
    if !layout.iter().any(|(field, _)| *field != Field::Suffix) {
        return Err(parse_error(value));
    }

    let mut pos = 0;
    for (field, width) in layout {
        let text = value.get(pos..pos + width).ok_or_else(|| parse_error(value))?;
        pos += width;

        if field == Field::Suffix {
            if text != "Z" {
                return Err(parse_error(value));
            }
            continue;
        }
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(parse_error(value));
        }
        let number: u32 = text.parse().map_err(|_| parse_error(value))?;

        match field {
            Field::Year => {
                let literal = i32::try_from(number).map_err(|_| parse_error(value))?;
                year = if width <= 2 && text.len() == 2 {
                    expand_two_digit_year(literal)
                } else {
                    literal
                };
            }
            Field::Month => month = number,
            Field::Day => day = number,
            Field::Hour => hour = number,
            Field::Minute => minute = number,
            Field::Second => second = number,
            Field::Suffix => {}
        }
    }

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(|| parse_error(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_zone() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn instant(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn test_encode_subtracts_offset() {
        let dates = DateNormalizer::with_zone(Some(2), utc_zone());
        assert_eq!(
            dates.encode(instant("2024-03-01T12:00:00Z")),
            "20240301100000Z"
        );
    }

    #[test]
    fn test_encode_zone_offset_cancels_out() {
        let zone = FixedOffset::east_opt(3600).unwrap();
        let dates = DateNormalizer::with_zone(None, zone);
        assert_eq!(dates.offset(), Duration::hours(1));
        assert_eq!(
            dates.encode(instant("2024-03-01T12:00:00Z")),
            "20240301120000Z"
        );
    }

    #[test]
    fn test_now_is_well_formed() {
        let now = DateNormalizer::new(Some(0)).now();
        assert_eq!(now.len(), 15);
        assert!(now.ends_with('Z'));
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    #[test]
    fn test_round_trip_for_offsets() {
        let zones = [-18000, 0, 3600, 19800];
        let instants = [
            "1999-12-31T23:59:59Z",
            "2024-02-29T06:30:15Z",
            "2038-07-04T18:00:00Z",
        ];

        for zone_secs in zones {
            for hours in [None, Some(-8), Some(0), Some(5), Some(13)] {
                let zone = FixedOffset::east_opt(zone_secs).unwrap();
                let dates = DateNormalizer::with_zone(hours, zone);
                for s in instants {
                    let t = instant(s);
                    assert_eq!(dates.decode(&dates.encode(t)).unwrap(), t, "{s} {hours:?}");
                }
            }
        }
    }

    #[test]
    fn test_decode_adds_offset() {
        let dates = DateNormalizer::with_zone(Some(2), utc_zone());
        assert_eq!(
            dates.decode("20240301100000Z").unwrap(),
            instant("2024-03-01T12:00:00Z")
        );
    }

    #[test]
    fn test_decode_long_input_widens_year() {
        let dates = DateNormalizer::with_zone(Some(0), utc_zone());
        assert_eq!(
            dates.decode("020240301100000Z").unwrap(),
            instant("2024-03-01T10:00:00Z")
        );
    }

    #[test]
    fn test_decode_short_input_uses_two_digit_year() {
        let dates = DateNormalizer::with_zone(Some(0), utc_zone());
        assert_eq!(
            dates.decode("240301100000Z").unwrap(),
            instant("2024-03-01T10:00:00Z")
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let dates = DateNormalizer::with_zone(Some(0), utc_zone());
        for bad in ["not-a-date-at-all", "20241301100000Z", "2024030110000XZ", "20240301100000Y"] {
            let err = dates.decode(bad).unwrap_err();
            assert!(
                matches!(err, ConnectorError::InvalidAttributeValue { .. }),
                "{bad}"
            );
            assert!(err.to_string().contains("Error in parsing ume time"));
        }
    }

    #[test]
    fn test_decode_rejects_input_without_digits() {
        let dates = DateNormalizer::with_zone(Some(0), utc_zone());
        for bad in ["", "Z"] {
            let err = dates.decode(bad).unwrap_err();
            assert!(
                matches!(err, ConnectorError::InvalidAttributeValue { .. }),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_layout_for_short_input() {
        let layout = layout_for(13);
        assert_eq!(layout[0], (Field::Year, 2));
        assert_eq!(layout.len(), 7);

        let layout = layout_for(10);
        assert_eq!(layout[0], (Field::Month, 1));
        assert_eq!(layout.len(), 6);
    }

    // =========================================================================
    // Validity windows and host values
    // =========================================================================

    #[test]
    fn test_parse_valid_time() {
        let dates = DateNormalizer::with_zone(Some(0), utc_zone());
        assert_eq!(dates.parse_valid_time("").unwrap(), None);
        assert_eq!(dates.parse_valid_time("   ").unwrap(), None);
        assert_eq!(
            dates.parse_valid_time("9999-12-31 00:00:00").unwrap(),
            Some("99991231000000Z".to_string())
        );

        let now = dates.parse_valid_time(CURRENT_TIME).unwrap().unwrap();
        assert_eq!(now.len(), 15);

        let err = dates.parse_valid_time("31.12.2024").unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_encode_value() {
        let dates = DateNormalizer::with_zone(Some(0), utc_zone());
        let t = instant("2024-03-01T10:00:00Z");

        assert_eq!(
            dates.encode_value(&AttributeValue::DateTime(t)).unwrap(),
            Some("20240301100000Z".to_string())
        );
        assert_eq!(
            dates
                .encode_value(&AttributeValue::Integer(t.timestamp_millis()))
                .unwrap(),
            Some("20240301100000Z".to_string())
        );
        assert_eq!(dates.encode_value(&AttributeValue::Null).unwrap(), None);

        let err = dates
            .encode_value(&AttributeValue::String("tomorrow".into()))
            .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidAttributeValue { .. }));
    }
}
