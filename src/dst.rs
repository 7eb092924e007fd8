//! Daylight-saving artifact correction.
//!
//! Building exports record local wall-clock time, so the hour after the
//! spring transition is missing and the hour before the autumn transition
//! appears twice. [`correct`] rewrites such a column onto a single fixed
//! offset (winter time) using the Central European transition rules:
//!
//! * summer period starts on the last Sunday on/before 31 March, 03:15 local
//! * winter period starts on the last Sunday on/before 31 October, 03:00 local
//!
//! Transition instants are recomputed for every calendar year the scan
//! crosses.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

/// Clock basis of a [`TimestampColumn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBasis {
    /// Raw local wall-clock readings, DST artifacts included
    LocalWallClock,
    /// Corrected onto a single fixed offset
    FixedOffset,
}

/// A timestamp column together with the clock basis of its values
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampColumn {
    values: Vec<Option<NaiveDateTime>>,
    basis: TimeBasis,
}

impl TimestampColumn {
    pub fn local(values: Vec<Option<NaiveDateTime>>) -> Self {
        Self {
            values,
            basis: TimeBasis::LocalWallClock,
        }
    }

    pub fn values(&self) -> &[Option<NaiveDateTime>] {
        &self.values
    }

    pub fn basis(&self) -> TimeBasis {
        self.basis
    }

    pub fn into_values(self) -> Vec<Option<NaiveDateTime>> {
        self.values
    }
}

/// Outcome of one correction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionStats {
    /// Timestamps moved back by one hour
    pub shifted: usize,
    /// Fall-back instants collapsed onto the preceding hour
    pub collapsed: usize,
}

/// Start of the summer period for `year` (local wall-clock)
pub fn summer_start(year: i32) -> NaiveDateTime {
    last_sunday_on_or_before(year, 3, 31)
        .and_hms_opt(3, 15, 0)
        .unwrap_or_default()
}

/// Start of the winter period for `year` (local wall-clock)
pub fn winter_start(year: i32) -> NaiveDateTime {
    last_sunday_on_or_before(year, 10, 31)
        .and_hms_opt(3, 0, 0)
        .unwrap_or_default()
}

fn last_sunday_on_or_before(year: i32, month: u32, day: u32) -> NaiveDate {
    let candidate = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default();
    // ISO weekday: Monday = 1 .. Sunday = 7, so Sunday maps to an offset of 0
    let offset = candidate.weekday().number_from_monday() % 7;
    candidate - Duration::days(i64::from(offset))
}

fn in_summer(ts: &NaiveDateTime) -> bool {
    let year = ts.year();
    summer_start(year) < *ts && *ts <= winter_start(year)
}

/// Move `ts` back by `shift`; a timestamp at the bottom of the range stays put
fn shift_back(ts: &mut NaiveDateTime, shift: Duration) -> bool {
    match ts.checked_sub_signed(shift) {
        Some(shifted) => {
            *ts = shifted;
            true
        }
        None => false,
    }
}

/// Rewrite a local wall-clock column onto winter time.
///
/// Missing entries are left untouched. A column that is already on a fixed
/// offset is returned unchanged, which makes the correction idempotent.
pub fn correct(column: &mut TimestampColumn) -> CorrectionStats {
    let mut stats = CorrectionStats::default();
    if column.basis == TimeBasis::FixedOffset {
        return stats;
    }

    let shift = Duration::hours(1);
    let mut summer = column
        .values
        .iter()
        .flatten()
        .next()
        .is_some_and(in_summer);

    for slot in column.values.iter_mut() {
        let Some(ts) = slot.as_mut() else {
            continue;
        };
        let year = ts.year();

        if *ts == winter_start(year) && summer {
            summer = false;
            shift_back(ts, shift);
            stats.collapsed += 1;
        }
        if *ts == summer_start(year) {
            summer = true;
        }
        if summer && shift_back(ts, shift) {
            stats.shifted += 1;
        }
    }

    column.basis = TimeBasis::FixedOffset;
    debug!(
        "DST correction shifted {} timestamps, collapsed {} fall-back instants",
        stats.shifted, stats.collapsed
    );
    stats
}
