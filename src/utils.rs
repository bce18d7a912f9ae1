use chrono::{Datelike, Days, NaiveDate};

/// Every calendar date from `start` to `end`, both inclusive. Empty if `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |date| *date <= end)
}

/// Last day to request from the weather archive for a range ending in `end_year`.
///
/// The archive lags a couple of days behind, so the current year is cut off at
/// `today - 2 days`; any other year runs through December 31.
pub fn archive_end_date(end_year: i32, today: NaiveDate) -> Option<NaiveDate> {
    if end_year == today.year() {
        today.checked_sub_days(Days::new(2))
    } else {
        NaiveDate::from_ymd_opt(end_year, 12, 31)
    }
}
