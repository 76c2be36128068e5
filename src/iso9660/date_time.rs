//! Decodes the 7-byte ISO9660 directory-record timestamp into a Unix epoch offset.
//!
//! ISO9660 stores a timestamp as year-since-1900, month, day, hour, minute, second (all unsigned),
//! followed by a signed byte giving the offset from GMT in 15-minute units. There is no `chrono`
//! or `time` dependency here; the calendar math is hand-rolled instead.

/// A decoded ISO9660 record timestamp, or the "unknown" sentinel for an all-zero field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordTimestamp {
    /// Seconds since the Unix epoch (1970-01-01T00:00:00Z), already adjusted for the record's
    /// GMT offset.
    Known(i64),
    /// Year byte was 0, meaning the original tool considers the timestamp unset.
    Unknown,
}

/// Raw fields as stored in the 7-byte ISO9660 date/time.
#[derive(Clone, Copy, Debug)]
pub struct RawRecordDate {
    pub year_since_1900: u8,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub gmt_offset_quarter_hours: i8,
}

impl RawRecordDate {
    pub fn from_bytes(bytes: [u8; 7]) -> Self {
        RawRecordDate {
            year_since_1900: bytes[0],
            month: bytes[1],
            day: bytes[2],
            hour: bytes[3],
            minute: bytes[4],
            second: bytes[5],
            gmt_offset_quarter_hours: bytes[6] as i8,
        }
    }

    pub fn to_timestamp(self) -> RecordTimestamp {
        if self.year_since_1900 == 0 {
            return RecordTimestamp::Unknown;
        }

        let year = 1900u32 + self.year_since_1900 as u32;
        let days = ymd_to_days_since_epoch(year, self.month, self.day);
        let mut secs = days * 86_400
            + self.hour as i64 * 3_600
            + self.minute as i64 * 60
            + self.second as i64;
        secs -= self.gmt_offset_quarter_hours as i64 * 15 * 60;

        RecordTimestamp::Known(secs)
    }
}

/// Days between 1970-01-01 and `year-month-day` (may be negative for dates before the epoch).
fn ymd_to_days_since_epoch(year: u32, month: u8, day: u8) -> i64 {
    let mut days: i64 = 0;

    if year >= 1970 {
        for y in 1970..year {
            days += days_in_year(y) as i64;
        }
    }
    else {
        for y in year..1970 {
            days -= days_in_year(y) as i64;
        }
    }

    let month_lengths = if is_leap_year(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    }
    else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let month_idx = month.saturating_sub(1).min(11) as usize;
    for &mlen in &month_lengths[..month_idx] {
        days += mlen as i64;
    }

    days + (day.saturating_sub(1)) as i64
}

fn days_in_year(year: u32) -> u16 {
    if is_leap_year(year) {
        366
    }
    else {
        365
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
