// 1. The Core Run Types
pub use crate::deriver::{
    CLOSE_DIFFS_HISTOGRAM_FILE, DeriverConfig, FEATURES_DATASET_FILE, FeatureDeriver,
    IndicatorConfig, LabelConfig,
};
pub use crate::table::FeatureTable;

// 2. Column Vocabulary
pub use crate::schema::{FeatureCol, input_schema};

// 3. Feature Building Blocks
pub use crate::feature::calendar::{HolidaySet, us_federal_holidays};
pub use crate::feature::indicator::{AtrWindow, EmaWindow, RsiWindow, SmaWindow};
pub use crate::feature::label::Label;

// 4. Math
pub use crate::math::stats::NormalFit;

// 5. Errors
pub use crate::error::{DataError, FeatureError, IoError, OchreError, OchreResult};
