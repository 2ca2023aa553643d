// Wall-clock snapshot for the face.
//
// The snapshot only moves when `refresh` is called; there is no background
// timer here. Time zones are fixed UTC offsets, the host pushes a new one
// whenever the system zone changes.

use core::fmt::Write as _;

use heapless::String;

use crate::error::FaceError;

const MS_PER_DAY: i64 = 86_400_000;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Fixed offset from UTC.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeZone {
    offset_minutes: i16,
}

impl TimeZone {
    pub const UTC: TimeZone = TimeZone { offset_minutes: 0 };

    pub fn from_offset_minutes(minutes: i32) -> Result<Self, FaceError> {
        if minutes.unsigned_abs() > MAX_OFFSET_MINUTES as u32 {
            return Err(FaceError::InvalidTimeZone(minutes));
        }
        Ok(Self {
            offset_minutes: minutes as i16,
        })
    }

    #[inline]
    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes as i32
    }

    #[inline]
    fn offset_ms(&self) -> i64 {
        self.offset_minutes as i64 * 60_000
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::UTC
    }
}

/// Broken-down local time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CivilTime {
    pub year: i32,
    pub month: u8,   // 1-12
    pub day: u8,     // 1-31
    pub weekday: u8, // 0 = Monday
    pub hour: u8,    // 0-23
    pub minute: u8,  // 0-59
    pub second: u8,  // 0-59
    pub millisecond: u16,
}

impl CivilTime {
    /// Break a Unix timestamp in milliseconds into calendar fields.
    pub fn from_unix_ms(ms: i64) -> Self {
        let days = ms.div_euclid(MS_PER_DAY);
        let mut rem = ms.rem_euclid(MS_PER_DAY);

        let hour = (rem / 3_600_000) as u8;
        rem %= 3_600_000;
        let minute = (rem / 60_000) as u8;
        rem %= 60_000;
        let second = (rem / 1000) as u8;
        let millisecond = (rem % 1000) as u16;

        // 1970-01-01 was a Thursday
        let weekday = (days + 3).rem_euclid(7) as u8;

        let (year, month, day) = civil_from_days(days);
        Self {
            year,
            month,
            day,
            weekday,
            hour,
            minute,
            second,
            millisecond,
        }
    }
}

// Days since 1970-01-01 back to (year, month, day), proleptic Gregorian.
fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719_468; // 719468 = days from 0000-03-01 to 1970-01-01
    let era = z.div_euclid(146_097); // 146097 = days in 400 years
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = if month <= 2 { y + 1 } else { y };
    (year as i32, month as u8, day as u8)
}

/// Mutable local-time snapshot.
#[derive(Clone, Debug)]
pub struct TimeSource {
    zone: TimeZone,
    instant_ms: i64,
    local: CivilTime,
}

impl TimeSource {
    pub fn new(zone: TimeZone) -> Self {
        Self {
            zone,
            instant_ms: 0,
            local: CivilTime::from_unix_ms(zone.offset_ms()),
        }
    }

    /// Move the snapshot to `now_ms` (Unix milliseconds) in the current zone.
    pub fn refresh(&mut self, now_ms: i64) {
        self.instant_ms = now_ms;
        self.local = CivilTime::from_unix_ms(now_ms + self.zone.offset_ms());
    }

    /// Change the zone, keeping the instant.
    pub fn set_time_zone(&mut self, zone: TimeZone) {
        self.zone = zone;
        self.refresh(self.instant_ms);
    }

    #[inline]
    pub fn time_zone(&self) -> TimeZone {
        self.zone
    }

    #[inline]
    pub fn instant_ms(&self) -> i64 {
        self.instant_ms
    }

    #[inline]
    pub fn local(&self) -> &CivilTime {
        &self.local
    }

    /// Hour in 12-hour form, 1..=12.
    pub fn hour12(&self) -> u8 {
        match self.local.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    #[inline]
    pub fn hour24(&self) -> u8 {
        self.local.hour
    }

    #[inline]
    pub fn minute(&self) -> u8 {
        self.local.minute
    }

    #[inline]
    pub fn second(&self) -> u8 {
        self.local.second
    }

    #[inline]
    pub fn millisecond(&self) -> u16 {
        self.local.millisecond
    }

    /// Seconds including the millisecond fraction.
    pub fn seconds_fraction(&self) -> f32 {
        self.local.second as f32 + self.local.millisecond as f32 / 1000.0
    }

    pub fn day_of_week(&self) -> &'static str {
        WEEKDAYS[self.local.weekday as usize % 7]
    }

    /// Short day and date, e.g. "Fri Oct 16".
    pub fn day_date(&self) -> String<16> {
        let mut s = String::new();
        let day = self.day_of_week();
        let month = MONTHS[(self.local.month as usize).saturating_sub(1) % 12];
        // capacity covers the longest "Wed Sep 30"
        let _ = write!(s, "{} {} {}", &day[..3], month, self.local.day);
        s
    }

    /// Digital readout, e.g. "9:05" or "12:40".
    pub fn readout(&self) -> String<8> {
        let mut s = String::new();
        let _ = write!(s, "{}:{:02}", self.hour12(), self.local.minute);
        s
    }
}

impl Default for TimeSource {
    fn default() -> Self {
        Self::new(TimeZone::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2026-10-16 13:47:05.250 UTC, a Friday
    const FRI_AFTERNOON: i64 = 1_792_158_425_250;

    #[test]
    fn breaks_down_known_instant() {
        let t = CivilTime::from_unix_ms(FRI_AFTERNOON);
        assert_eq!((t.year, t.month, t.day), (2026, 10, 16));
        assert_eq!((t.hour, t.minute, t.second, t.millisecond), (13, 47, 5, 250));
        assert_eq!(t.weekday, 4);
    }

    #[test]
    fn epoch_and_before_epoch() {
        let t = CivilTime::from_unix_ms(0);
        assert_eq!((t.year, t.month, t.day, t.weekday), (1970, 1, 1, 3));

        let t = CivilTime::from_unix_ms(-1);
        assert_eq!((t.year, t.month, t.day), (1969, 12, 31));
        assert_eq!((t.hour, t.minute, t.second, t.millisecond), (23, 59, 59, 999));
    }

    #[test]
    fn leap_day() {
        // 2024-02-29 00:00:00 UTC
        let t = CivilTime::from_unix_ms(1_709_164_800_000);
        assert_eq!((t.year, t.month, t.day), (2024, 2, 29));
    }

    #[test]
    fn twelve_hour_form_normalizes_midnight_and_noon() {
        let mut ts = TimeSource::default();
        ts.refresh(0);
        assert_eq!(ts.hour12(), 12);
        ts.refresh(12 * 3_600_000);
        assert_eq!(ts.hour12(), 12);
        ts.refresh(13 * 3_600_000);
        assert_eq!(ts.hour12(), 1);
    }

    #[test]
    fn zone_change_keeps_instant() {
        let mut ts = TimeSource::default();
        ts.refresh(FRI_AFTERNOON);
        ts.set_time_zone(TimeZone::from_offset_minutes(-5 * 60).unwrap());
        assert_eq!(ts.instant_ms(), FRI_AFTERNOON);
        assert_eq!(ts.hour24(), 8);
        assert_eq!(ts.minute(), 47);
    }

    #[test]
    fn zone_offset_can_cross_midnight() {
        let mut ts = TimeSource::new(TimeZone::from_offset_minutes(11 * 60).unwrap());
        ts.refresh(FRI_AFTERNOON);
        assert_eq!(ts.local().day, 17);
        assert_eq!(ts.day_of_week(), "Saturday");
    }

    #[test]
    fn rejects_out_of_range_zone() {
        assert_eq!(
            TimeZone::from_offset_minutes(15 * 60),
            Err(FaceError::InvalidTimeZone(900))
        );
    }

    #[test]
    fn refresh_is_idempotent() {
        let mut ts = TimeSource::default();
        ts.refresh(FRI_AFTERNOON);
        let first = (*ts.local(), ts.readout(), ts.day_date());
        ts.refresh(FRI_AFTERNOON);
        assert_eq!(first, (*ts.local(), ts.readout(), ts.day_date()));
    }

    #[test]
    fn formats_readout_and_date() {
        let mut ts = TimeSource::default();
        ts.refresh(FRI_AFTERNOON);
        assert_eq!(ts.readout().as_str(), "1:47");
        assert_eq!(ts.day_date().as_str(), "Fri Oct 16");
        assert_eq!(ts.day_of_week(), "Friday");
        assert!((ts.seconds_fraction() - 5.25).abs() < 1e-6);
    }
}
