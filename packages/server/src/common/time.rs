use chrono::{DateTime, FixedOffset, NaiveTime, Offset, Utc};

const WIB_OFFSET_SECONDS: i32 = 7 * 3600;

/// Western Indonesia Time (UTC+7).
pub fn wib() -> FixedOffset {
    // 7h is always a valid offset
    FixedOffset::east_opt(WIB_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

/// Render a timestamp for Indonesian readers, e.g. `19/10/2026, 14.05.03 WIB`.
pub fn format_wib(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&wib())
        .format("%d/%m/%Y, %H.%M.%S WIB")
        .to_string()
}

/// Midnight UTC of the given instant's date.
pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_wib_shifts_seven_hours() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 20, 5, 3).unwrap();
        assert_eq!(format_wib(ts), "20/10/2026, 03.05.03 WIB");
    }

    #[test]
    fn test_start_of_utc_day() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 20, 5, 3).unwrap();
        assert_eq!(
            start_of_utc_day(ts),
            Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap()
        );
    }
}
