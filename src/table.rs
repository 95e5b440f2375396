use std::{
    fs::File,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use polars::{
    frame::DataFrame,
    prelude::{ParquetReader, ParquetWriter, SerReader},
};

use crate::{
    error::{DataError, IoError, OchreResult},
    io::write_atomic,
    schema::FeatureCol,
};

/// A price table with a validated input schema, enriched in place by the
/// feature transforms.
///
/// Construction enforces the invariants every transform relies on: the
/// required OHLC columns with their canonical dtypes, a non-empty frame, and
/// a strictly ascending, null-free, duplicate-free `datetime` index. Row
/// count and order are never changed after construction; transforms only
/// append columns.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    df: DataFrame,
}

impl FeatureTable {
    pub fn new(df: DataFrame) -> OchreResult<Self> {
        if df.is_empty() {
            return Err(DataError::EmptyTable.into());
        }

        for col in FeatureCol::REQUIRED_INPUT {
            let column = df
                .column(col.as_str())
                .map_err(|_| DataError::MissingColumn(col.as_str().to_string()))?;

            let expected = col.dtype();
            if column.dtype() != &expected {
                return Err(DataError::ColumnDtype {
                    col: col.as_str().to_string(),
                    expected: expected.to_string(),
                    actual: column.dtype().to_string(),
                }
                .into());
            }
        }

        validate_datetime_index(&df)?;
        validate_date_column(&df)?;

        Ok(Self { df })
    }

    pub fn as_df(&self) -> &DataFrame {
        &self.df
    }

    pub fn into_df(self) -> DataFrame {
        self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Inclusive [min(date), max(date)] span of the table.
    pub fn date_span(&self) -> OchreResult<(NaiveDate, NaiveDate)> {
        let dates = self
            .df
            .column(FeatureCol::Date.as_str())
            .map_err(|e| DataError::DataFrame(e.to_string()))?
            .date()
            .map_err(|e| DataError::DataFrame(e.to_string()))?;

        let (mut min, mut max) = (i32::MAX, i32::MIN);
        for days in dates.physical().into_iter().flatten() {
            min = min.min(days);
            max = max.max(days);
        }
        if min > max {
            return Err(DataError::EmptyTable.into());
        }

        Ok((date_from_epoch_days(min), date_from_epoch_days(max)))
    }

    /// The table serialized as an in-memory parquet file.
    pub fn to_parquet_bytes(&self) -> OchreResult<Vec<u8>> {
        let mut buf = Vec::new();
        ParquetWriter::new(&mut buf)
            .finish(&mut self.df.clone())
            .map_err(|e| IoError::WriteFailed(format!("Parquet serialization failed: {e}")))?;
        Ok(buf)
    }

    /// Writes the table to `<dir>/<file_name>` as parquet. The file is
    /// serialized to memory first and renamed into place, so no partial
    /// snapshot is ever visible at the final path.
    pub fn write_parquet(&self, dir: impl AsRef<Path>, file_name: &str) -> OchreResult<PathBuf> {
        write_atomic(dir.as_ref(), file_name, &self.to_parquet_bytes()?)
    }

    /// Reloads a previously exported snapshot, re-validating the input
    /// invariants at the boundary.
    pub fn read_parquet(path: impl AsRef<Path>) -> OchreResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            IoError::ReadFailed(format!("Failed to open {}: {e}", path.display()))
        })?;

        let df = ParquetReader::new(file).finish().map_err(|e| {
            IoError::ReadFailed(format!("Failed to read {}: {e}", path.display()))
        })?;

        Self::new(df)
    }
}

fn validate_datetime_index(df: &DataFrame) -> OchreResult<()> {
    let col = FeatureCol::Datetime.as_str();
    let timestamps = df
        .column(col)
        .map_err(|e| DataError::DataFrame(e.to_string()))?
        .datetime()
        .map_err(|e| DataError::DataFrame(e.to_string()))?;

    let mut prev: Option<i64> = None;
    for (row, ts) in timestamps.physical().into_iter().enumerate() {
        let Some(ts) = ts else {
            return Err(DataError::NullTimestamp {
                col: col.to_string(),
                row,
            }
            .into());
        };

        if let Some(prev) = prev {
            if ts == prev {
                return Err(DataError::DuplicateTimestamp {
                    col: col.to_string(),
                    row,
                }
                .into());
            }
            if ts < prev {
                return Err(DataError::NonMonotonicTimestamp {
                    col: col.to_string(),
                    row,
                }
                .into());
            }
        }
        prev = Some(ts);
    }

    Ok(())
}

fn validate_date_column(df: &DataFrame) -> OchreResult<()> {
    let col = FeatureCol::Date.as_str();
    let dates = df
        .column(col)
        .map_err(|e| DataError::DataFrame(e.to_string()))?
        .date()
        .map_err(|e| DataError::DataFrame(e.to_string()))?;

    if let Some(row) = dates.physical().into_iter().position(|d| d.is_none()) {
        return Err(DataError::NullTimestamp {
            col: col.to_string(),
            row,
        }
        .into());
    }

    Ok(())
}

fn date_from_epoch_days(days: i32) -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive() + Duration::days(days as i64)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{DataType, IntoLazy, col, lit};

    use super::*;
    use crate::error::OchreError;

    fn base_frame() -> DataFrame {
        crate::test_util::ohlc_frame(&[
            ("2023-01-03", "2023-01-03T09:00:00", 10.0, 11.0, 9.5, 10.5),
            ("2023-01-03", "2023-01-03T10:00:00", 10.5, 11.5, 10.0, 11.0),
            ("2023-01-04", "2023-01-04T09:00:00", 11.0, 12.0, 10.5, 11.5),
        ])
    }

    #[test]
    fn test_accepts_valid_frame() {
        let table = FeatureTable::new(base_frame()).expect("valid frame rejected");
        assert_eq!(table.height(), 3);
    }

    #[test]
    fn test_rejects_empty_frame() {
        let df = base_frame()
            .lazy()
            .filter(col(FeatureCol::Close.as_str()).lt(lit(0.0)))
            .collect()
            .expect("filter failed");

        let err = FeatureTable::new(df).expect_err("empty frame accepted");
        assert!(matches!(err, OchreError::Data(DataError::EmptyTable)));
    }

    #[test]
    fn test_rejects_missing_column() {
        let df = base_frame()
            .drop(FeatureCol::High.as_str())
            .expect("drop failed");

        let err = FeatureTable::new(df).expect_err("missing column accepted");
        assert!(matches!(err, OchreError::Data(DataError::MissingColumn(c)) if c == "high"));
    }

    #[test]
    fn test_rejects_wrong_dtype() {
        let df = base_frame()
            .lazy()
            .with_column(col(FeatureCol::Close.as_str()).cast(DataType::Int64))
            .collect()
            .expect("cast failed");

        let err = FeatureTable::new(df).expect_err("wrong dtype accepted");
        assert!(matches!(err, OchreError::Data(DataError::ColumnDtype { col, .. }) if col == "close"));
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let df = crate::test_util::ohlc_frame(&[
            ("2023-01-03", "2023-01-03T09:00:00", 10.0, 11.0, 9.5, 10.5),
            ("2023-01-03", "2023-01-03T09:00:00", 10.5, 11.5, 10.0, 11.0),
        ]);

        let err = FeatureTable::new(df).expect_err("duplicate timestamps accepted");
        assert!(matches!(
            err,
            OchreError::Data(DataError::DuplicateTimestamp { row: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_unsorted_timestamps() {
        let df = crate::test_util::ohlc_frame(&[
            ("2023-01-03", "2023-01-03T10:00:00", 10.0, 11.0, 9.5, 10.5),
            ("2023-01-03", "2023-01-03T09:00:00", 10.5, 11.5, 10.0, 11.0),
        ]);

        let err = FeatureTable::new(df).expect_err("unsorted timestamps accepted");
        assert!(matches!(
            err,
            OchreError::Data(DataError::NonMonotonicTimestamp { row: 1, .. })
        ));
    }

    #[test]
    fn test_date_span() {
        let table = FeatureTable::new(base_frame()).expect("valid frame rejected");
        let (start, end) = table.date_span().expect("date span failed");

        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 1, 3).expect("bad date"));
        assert_eq!(end, NaiveDate::from_ymd_opt(2023, 1, 4).expect("bad date"));
    }

    #[test]
    fn test_parquet_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let table = FeatureTable::new(base_frame()).expect("valid frame rejected");

        let path = table
            .write_parquet(dir.path(), "snapshot.parquet")
            .expect("write failed");
        let reloaded = FeatureTable::read_parquet(&path).expect("read failed");

        assert!(table.as_df().equals_missing(reloaded.as_df()));
    }
}
