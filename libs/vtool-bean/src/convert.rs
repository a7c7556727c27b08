use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::CopyError;
use crate::value::{Value, ValueMut, ValueRef};

/// Built-in conversions between differing field types.
///
/// - numeric → numeric, through a 64-bit intermediate and `as` casts
/// - `DateTime<Utc>` → `String`, RFC 3339 with whole seconds
/// - `String` → `DateTime<Utc>`, RFC 3339 parse normalised to UTC
pub(crate) fn convert(src: &dyn Value, dst: &mut dyn Value) -> Result<(), CopyError> {
    let from = src.type_info();
    let to = dst.type_info();

    match (src.reflect(), dst.reflect_mut()) {
        (ValueRef::Number(n), ValueMut::Number(slot)) => {
            slot.store(n);
            Ok(())
        }
        (ValueRef::Time(t), ValueMut::Str(s)) => {
            *s = format_time(t);
            Ok(())
        }
        (ValueRef::Str(s), ValueMut::Time(t)) => {
            *t = parse_time(s)?;
            Ok(())
        }
        _ => Err(CopyError::UnsupportedConversion { from, to }),
    }
}

pub(crate) fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn parse_time(s: &str) -> Result<DateTime<Utc>, CopyError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn float_to_int_truncates() {
        let mut dst = 0i64;
        convert(&3.75f64, &mut dst).unwrap();
        assert_eq!(dst, 3);
    }

    #[test]
    fn int_widening_and_narrowing() {
        let mut wide = 0i64;
        convert(&-7i8, &mut wide).unwrap();
        assert_eq!(wide, -7);

        let mut narrow = 0u8;
        convert(&513u32, &mut narrow).unwrap();
        assert_eq!(narrow, 1);

        let mut float = 0f32;
        convert(&100i32, &mut float).unwrap();
        assert_eq!(float, 100.0);
    }

    #[test]
    fn time_round_trips_through_rfc3339() {
        let t = Utc.with_ymd_and_hms(2024, 3, 9, 17, 5, 1).unwrap();
        let mut text = String::new();
        convert(&t, &mut text).unwrap();
        assert_eq!(text, "2024-03-09T17:05:01Z");

        let mut parsed = DateTime::<Utc>::default();
        convert(&String::from("2024-03-09T19:05:01+02:00"), &mut parsed).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn malformed_time_is_a_parse_error() {
        let mut parsed = DateTime::<Utc>::default();
        let err = convert(&String::from("yesterday"), &mut parsed).unwrap_err();
        assert!(matches!(err, CopyError::Parse(_)));
    }

    #[test]
    fn other_pairs_are_unsupported() {
        let mut dst = 0i32;
        let err = convert(&String::from("1"), &mut dst).unwrap_err();
        match err {
            CopyError::UnsupportedConversion { from, to } => {
                assert!(from.is::<String>());
                assert!(to.is::<i32>());
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut flag = false;
        assert!(convert(&1u8, &mut flag).is_err());
    }
}
