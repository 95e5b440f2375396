use polars::{
    frame::DataFrame,
    prelude::{DataType, Expr, Null, col, lit, when},
    series::ops::NullBehavior,
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    error::{DataError, OchreResult},
    schema::FeatureCol,
};

/// Trend category of one row's close-price difference.
///
/// Stored in the table as a nullable `Int32` (`1`, `0`, `-1`); the row 0
/// label is null because the first difference is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum Label {
    Up,
    Flat,
    Down,
}

impl Label {
    pub fn value(&self) -> i32 {
        match self {
            Label::Up => 1,
            Label::Flat => 0,
            Label::Down => -1,
        }
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            1 => Some(Label::Up),
            0 => Some(Label::Flat),
            -1 => Some(Label::Down),
            _ => None,
        }
    }
}

/// `close_diff`: first difference of `close`. Null at row 0 only.
pub fn close_diff_expr() -> Expr {
    col(FeatureCol::Close)
        .diff(lit(1), NullBehavior::Ignore)
        .alias(FeatureCol::CloseDiff)
}

/// `label`: quantile thresholding of `close_diff`.
///
/// Boundary values belong to `Flat` (the interval is closed on both sides);
/// a null diff yields a null label, never a default.
pub fn label_expr(lower: f64, upper: f64) -> Expr {
    when(col(FeatureCol::CloseDiff).gt(lit(upper)))
        .then(lit(Label::Up.value()))
        .when(col(FeatureCol::CloseDiff).lt(lit(lower)))
        .then(lit(Label::Down.value()))
        .when(col(FeatureCol::CloseDiff).is_not_null())
        .then(lit(Label::Flat.value()))
        .otherwise(lit(Null {}))
        .cast(DataType::Int32)
        .alias(FeatureCol::Label)
}

/// The defined close diffs, in row order, for distribution fitting and the
/// diagnostic histogram.
pub fn non_null_close_diffs(df: &DataFrame) -> OchreResult<Vec<f64>> {
    let diffs = df
        .column(FeatureCol::CloseDiff.as_str())
        .map_err(|e| DataError::DataFrame(e.to_string()))?
        .f64()
        .map_err(|e| DataError::DataFrame(e.to_string()))?;

    Ok(diffs.into_iter().flatten().collect())
}
