use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use polars::prelude::{DataType, DateChunked, Expr, col, lit};
use polars::series::IntoSeries;

use crate::schema::FeatureCol;

/// U.S. federal holiday dates within one table's date span.
pub type HolidaySet = BTreeSet<NaiveDate>;

/// All U.S. federal holidays in the inclusive range `[start, end]`,
/// including observed dates (fixed-date holidays falling on a Saturday are
/// observed the Friday before, on a Sunday the Monday after).
///
/// An empty or inverted range yields an empty set.
pub fn us_federal_holidays(start: NaiveDate, end: NaiveDate) -> HolidaySet {
    if start > end {
        return HolidaySet::new();
    }

    // Observed New Year's Day can land in the previous calendar year
    // (e.g. Sat 2022-01-01 is observed Fri 2021-12-31), so pad the year loop.
    (start.year() - 1..=end.year() + 1)
        .flat_map(holidays_for_year)
        .filter(|d| (start..=end).contains(d))
        .collect()
}

fn holidays_for_year(year: i32) -> impl Iterator<Item = NaiveDate> {
    let fixed = move |month, day| NaiveDate::from_ymd_opt(year, month, day).map(nearest_weekday);
    let nth = move |month, weekday, n| NaiveDate::from_weekday_of_month_opt(year, month, weekday, n);

    [
        // New Year's Day
        fixed(1, 1),
        // Birthday of Martin Luther King, Jr. (observed since 1986)
        (year >= 1986)
            .then(|| nth(1, Weekday::Mon, 3))
            .flatten(),
        // Washington's Birthday
        nth(2, Weekday::Mon, 3),
        // Memorial Day
        last_weekday_of_month(year, 5, Weekday::Mon),
        // Juneteenth National Independence Day (since 2021)
        (year >= 2021).then(|| fixed(6, 19)).flatten(),
        // Independence Day
        fixed(7, 4),
        // Labor Day
        nth(9, Weekday::Mon, 1),
        // Columbus Day
        nth(10, Weekday::Mon, 2),
        // Veterans Day
        fixed(11, 11),
        // Thanksgiving Day
        nth(11, Weekday::Thu, 4),
        // Christmas Day
        fixed(12, 25),
    ]
    .into_iter()
    .flatten()
}

fn nearest_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    let last = first_of_next.pred_opt()?;

    let back =
        (last.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    Some(last - Duration::days(back as i64))
}

/// `is_holiday`: membership of the row's `date` in the holiday set.
///
/// Membership semantics rather than a join: rows sharing a date necessarily
/// agree, and the flag is false (never null) for non-holidays.
pub fn holiday_flag_expr(holidays: &HolidaySet) -> Expr {
    let dates =
        DateChunked::from_naive_date(FeatureCol::IsHoliday.name(), holidays.iter().copied())
            .into_series();

    col(FeatureCol::Date)
        .is_in(lit(dates), false)
        .alias(FeatureCol::IsHoliday)
}

/// `month_index`: calendar month of `date` (1-12).
pub fn month_index_expr() -> Expr {
    col(FeatureCol::Date)
        .dt()
        .month()
        .cast(DataType::Int32)
        .alias(FeatureCol::MonthIndex)
}

/// `day_of_year`: ordinal day of `datetime` within its year (1-366).
pub fn day_of_year_expr() -> Expr {
    col(FeatureCol::Datetime)
        .dt()
        .ordinal_day()
        .cast(DataType::Int32)
        .alias(FeatureCol::DayOfYear)
}

/// `hour_of_day`: hour component of `datetime` (0-23).
pub fn hour_of_day_expr() -> Expr {
    col(FeatureCol::Datetime)
        .dt()
        .hour()
        .cast(DataType::Int32)
        .alias(FeatureCol::HourOfDay)
}
