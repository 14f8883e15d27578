/// Convert the packed MS-DOS timestamp stored in RAR3 file headers.
///
/// The date lives in the high word and the time in the low word; the
/// seconds field counts two-second steps, so odd seconds cannot be
/// represented. Out-of-range fields (month 0 or 15, hour 31, ...) are
/// common in hostile archives and surface as an error the caller can
/// fall back from.
pub fn parse_dos_datetime(
    stamp: u32,
) -> Result<time::PrimitiveDateTime, time::error::ComponentRange> {
    let date_word = stamp >> 16;
    let time_word = stamp & 0xffff;

    let year = 1980 + (date_word >> 9) as i32;
    let month = time::Month::try_from(((date_word >> 5) & 0x0f) as u8)?;
    let day = (date_word & 0x1f) as u8;

    let hour = (time_word >> 11) as u8;
    let minute = ((time_word >> 5) & 0x3f) as u8;
    let second = ((time_word & 0x1f) * 2) as u8;

    Ok(time::PrimitiveDateTime::new(
        time::Date::from_calendar_date(year, month, day)?,
        time::Time::from_hms(hour, minute, second)?,
    ))
}

/// Parse a Unix timestamp in seconds, as stored in RAR5 headers.
pub fn parse_unix_timestamp_sec(
    seconds: u32,
) -> Result<time::OffsetDateTime, time::error::ComponentRange> {
    time::OffsetDateTime::from_unix_timestamp(seconds as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_datetime_fields_unpack() {
        // 2019-06-21 12:34:56
        let stamp = (39 << 25) | (6 << 21) | (21 << 16) | (12 << 11) | (34 << 5) | 28;
        let t = parse_dos_datetime(stamp).unwrap();

        assert_eq!(t.year(), 2019);
        assert_eq!(u8::from(t.month()), 6);
        assert_eq!(t.day(), 21);
        assert_eq!((t.hour(), t.minute(), t.second()), (12, 34, 56));
    }

    #[test]
    fn dos_datetime_rejects_invalid_month() {
        assert!(parse_dos_datetime(15 << 21).is_err());
    }

    #[test]
    fn dos_datetime_seconds_come_in_two_second_steps() {
        let stamp = (10 << 25) | (1 << 21) | (1 << 16) | 1;
        let t = parse_dos_datetime(stamp).unwrap();

        assert_eq!(t.second(), 2);
    }
}
