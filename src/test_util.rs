use chrono::{NaiveDate, NaiveDateTime};
use polars::{
    frame::DataFrame,
    prelude::{DateChunked, DatetimeChunked, IntoColumn, NamedFrom, Series, TimeUnit},
    series::IntoSeries,
};

use crate::schema::FeatureCol;

/// Builds a valid input frame from `(date, datetime, open, high, low, close)`
/// rows.
pub(crate) fn ohlc_frame(rows: &[(&str, &str, f64, f64, f64, f64)]) -> DataFrame {
    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.0.parse().unwrap()).collect();
    let datetimes: Vec<NaiveDateTime> = rows.iter().map(|r| r.1.parse().unwrap()).collect();

    let date = DateChunked::from_naive_date(FeatureCol::Date.name(), dates).into_series();
    let datetime = DatetimeChunked::from_naive_datetime(
        FeatureCol::Datetime.name(),
        datetimes,
        TimeUnit::Microseconds,
    )
    .into_series();

    let open: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let high: Vec<f64> = rows.iter().map(|r| r.3).collect();
    let low: Vec<f64> = rows.iter().map(|r| r.4).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.5).collect();

    DataFrame::new(vec![
        date.into_column(),
        datetime.into_column(),
        Series::new(FeatureCol::Open.name(), open).into_column(),
        Series::new(FeatureCol::High.name(), high).into_column(),
        Series::new(FeatureCol::Low.name(), low).into_column(),
        Series::new(FeatureCol::Close.name(), close).into_column(),
    ])
    .unwrap()
}

/// Builds an hourly walk starting 2023-01-02 00:00 with the given closes;
/// highs/lows bracket the close, opens trail by one row.
pub(crate) fn walk_frame(closes: &[f64]) -> DataFrame {
    let start: NaiveDateTime = "2023-01-02T00:00:00".parse().unwrap();

    let rows: Vec<(String, String, f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let ts = start + chrono::Duration::hours(i as i64);
            let open = if i == 0 { close } else { closes[i - 1] };
            (
                ts.date().to_string(),
                ts.format("%Y-%m-%dT%H:%M:%S").to_string(),
                open,
                close + 0.5,
                close - 0.5,
                close,
            )
        })
        .collect();

    let borrowed: Vec<(&str, &str, f64, f64, f64, f64)> = rows
        .iter()
        .map(|r| (r.0.as_str(), r.1.as_str(), r.2, r.3, r.4, r.5))
        .collect();

    ohlc_frame(&borrowed)
}
