use chrono::{NaiveDate, NaiveDateTime};
use ochre::prelude::*;
use polars::{
    frame::DataFrame,
    prelude::{DateChunked, DatetimeChunked, IntoColumn, NamedFrom, Series, TimeUnit},
    series::IntoSeries,
};
use statrs::distribution::{ContinuousCDF, Normal};

/// Builds a validated hourly table starting 2023-01-02 00:00 from a close
/// series; highs/lows bracket each close, opens trail by one row.
pub fn hourly_table(closes: &[f64]) -> FeatureTable {
    let start: NaiveDateTime = "2023-01-02T00:00:00".parse().expect("bad start timestamp");

    let datetimes: Vec<NaiveDateTime> = (0..closes.len())
        .map(|i| start + chrono::Duration::hours(i as i64))
        .collect();
    let dates: Vec<NaiveDate> = datetimes.iter().map(|ts| ts.date()).collect();

    let open: Vec<f64> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| if i == 0 { c } else { closes[i - 1] })
        .collect();
    let high: Vec<f64> = closes.iter().map(|c| c + 0.5).collect();
    let low: Vec<f64> = closes.iter().map(|c| c - 0.5).collect();

    let df = DataFrame::new(vec![
        DateChunked::from_naive_date(FeatureCol::Date.name(), dates)
            .into_series()
            .into_column(),
        DatetimeChunked::from_naive_datetime(
            FeatureCol::Datetime.name(),
            datetimes,
            TimeUnit::Microseconds,
        )
        .into_series()
        .into_column(),
        Series::new(FeatureCol::Open.name(), open).into_column(),
        Series::new(FeatureCol::High.name(), high).into_column(),
        Series::new(FeatureCol::Low.name(), low).into_column(),
        Series::new(FeatureCol::Close.name(), closes.to_vec()).into_column(),
    ])
    .expect("failed to build fixture frame");

    FeatureTable::new(df).expect("fixture frame rejected")
}

/// A deterministic standard-normal sample: stratified inverse-CDF draws,
/// one per probability stratum. Sample mean is exactly 0 by symmetry and
/// the sample standard deviation approaches 1 as `n` grows.
pub fn standard_normal_sample(n: usize) -> Vec<f64> {
    let normal = Normal::new(0.0, 1.0).expect("standard normal");
    (0..n)
        .map(|i| normal.inverse_cdf((i as f64 + 0.5) / n as f64))
        .collect()
}

/// Turns a diff series into a close series starting at 100.0.
pub fn closes_from_diffs(diffs: &[f64]) -> Vec<f64> {
    let mut closes = Vec::with_capacity(diffs.len() + 1);
    closes.push(100.0);
    for diff in diffs {
        let prev = *closes.last().expect("non-empty closes");
        closes.push(prev + diff);
    }
    closes
}
