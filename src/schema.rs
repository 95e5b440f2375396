use std::sync::Arc;

use polars::prelude::{DataType, Field, PlSmallStr, Schema, SchemaRef, TimeUnit};
use strum::{Display, EnumString, IntoStaticStr};

/// The standardized vocabulary for all Ochre feature columns.
///
/// Indicator columns are window-parameterized and therefore not part of this
/// enum; their names come from the window types in
/// [`crate::feature::indicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FeatureCol {
    // ========================================================================
    // Required input columns
    // ========================================================================
    /// Calendar date of the row. Several rows may share one date.
    Date,
    /// The primary index timestamp. Strictly ascending, unique.
    Datetime,
    Open,
    High,
    Low,
    Close,

    // ========================================================================
    // Calendar features
    // ========================================================================
    /// Whether `date` is a U.S. federal holiday. Never null.
    IsHoliday,
    /// Calendar month of `date` (1-12).
    MonthIndex,
    /// Ordinal day of `datetime` within its year (1-366).
    DayOfYear,
    /// Hour component of `datetime` (0-23).
    HourOfDay,

    // ========================================================================
    // Label features
    // ========================================================================
    /// First difference of `close`. Null at row 0 only.
    CloseDiff,
    /// Trend label: 1 = Up, 0 = Flat, -1 = Down. Null iff `close_diff` is.
    Label,
}

impl From<FeatureCol> for PlSmallStr {
    fn from(value: FeatureCol) -> Self {
        value.as_str().into()
    }
}

impl FeatureCol {
    pub fn name(&self) -> PlSmallStr {
        self.as_str().into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Columns the input table must provide, with their canonical dtypes.
    pub const REQUIRED_INPUT: [FeatureCol; 6] = [
        FeatureCol::Date,
        FeatureCol::Datetime,
        FeatureCol::Open,
        FeatureCol::High,
        FeatureCol::Low,
        FeatureCol::Close,
    ];

    /// Canonical dtype of this column in the feature table.
    pub fn dtype(&self) -> DataType {
        match self {
            FeatureCol::Date => DataType::Date,
            FeatureCol::Datetime => DataType::Datetime(TimeUnit::Microseconds, None),
            FeatureCol::Open | FeatureCol::High | FeatureCol::Low | FeatureCol::Close => {
                DataType::Float64
            }
            FeatureCol::IsHoliday => DataType::Boolean,
            FeatureCol::MonthIndex | FeatureCol::DayOfYear | FeatureCol::HourOfDay => {
                DataType::Int32
            }
            FeatureCol::CloseDiff => DataType::Float64,
            FeatureCol::Label => DataType::Int32,
        }
    }
}

/// The canonical schema of the raw input table.
pub fn input_schema() -> SchemaRef {
    let fields: Vec<Field> = FeatureCol::REQUIRED_INPUT
        .iter()
        .map(|col| Field::new(col.name(), col.dtype()))
        .collect();

    Arc::new(Schema::from_iter(fields))
}
