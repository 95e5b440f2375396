use std::path::PathBuf;

use polars::prelude::{Expr, IntoLazy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{DataError, FeatureError, OchreResult},
    feature::{
        calendar,
        indicator::{AtrWindow, EmaWindow, RsiWindow, SmaWindow},
        label,
    },
    math::stats::NormalFit,
    report::histogram::render_close_diff_histogram,
    table::FeatureTable,
};

pub const FEATURES_DATASET_FILE: &str = "features_dataset.parquet";
pub const CLOSE_DIFFS_HISTOGRAM_FILE: &str = "close_diffs_histogram.svg";

/// Indicator windows applied to the table. Defaults are the production
/// parameterization; tests shrink them to keep fixtures small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorConfig {
    pub sma_windows: Vec<SmaWindow>,
    pub ema_windows: Vec<EmaWindow>,
    pub rsi_window: RsiWindow,
    pub atr_window: AtrWindow,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_windows: vec![SmaWindow(7), SmaWindow(14), SmaWindow(28)],
            ema_windows: vec![EmaWindow(7), EmaWindow(14), EmaWindow(28)],
            rsi_window: RsiWindow(14),
            atr_window: AtrWindow(14),
        }
    }
}

impl IndicatorConfig {
    pub fn largest_window(&self) -> usize {
        self.windows().max().unwrap_or(0) as usize
    }

    fn windows(&self) -> impl Iterator<Item = u16> {
        self.sma_windows
            .iter()
            .map(|w| w.0)
            .chain(self.ema_windows.iter().map(|w| w.0))
            .chain([self.rsi_window.0, self.atr_window.0])
    }

    fn validate(&self) -> OchreResult<()> {
        if self.windows().any(|w| w == 0) {
            return Err(FeatureError::InvalidWindow("window size must be positive".to_string()).into());
        }
        Ok(())
    }
}

/// Quantile thresholds and diagnostics for the label generator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LabelConfig {
    pub lower_quantile: f64,
    pub upper_quantile: f64,
    pub histogram_buckets: usize,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            lower_quantile: 0.4,
            upper_quantile: 0.6,
            histogram_buckets: 100,
        }
    }
}

impl LabelConfig {
    fn validate(&self) -> OchreResult<()> {
        let in_open_unit = |q: f64| q > 0.0 && q < 1.0;
        if !in_open_unit(self.lower_quantile)
            || !in_open_unit(self.upper_quantile)
            || self.lower_quantile >= self.upper_quantile
        {
            return Err(FeatureError::InvalidQuantiles {
                lower: self.lower_quantile,
                upper: self.upper_quantile,
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeriverConfig {
    /// Target directory of the exported feature table. Created if absent.
    pub saving_directory: PathBuf,
    /// Target directory of the diagnostic histogram. Created if absent.
    pub plot_saving_directory: PathBuf,
    #[serde(default)]
    pub indicators: IndicatorConfig,
    #[serde(default)]
    pub label: LabelConfig,
}

impl DeriverConfig {
    pub fn new(
        saving_directory: impl Into<PathBuf>,
        plot_saving_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            saving_directory: saving_directory.into(),
            plot_saving_directory: plot_saving_directory.into(),
            indicators: IndicatorConfig::default(),
            label: LabelConfig::default(),
        }
    }

    fn validate(&self) -> OchreResult<()> {
        self.indicators.validate()?;
        self.label.validate()
    }
}

/// Derives the feature columns and trend label for one validated price
/// table, then exports the enriched snapshot and its diagnostic histogram.
///
/// Steps run strictly in sequence and fail fast; a failed run persists
/// nothing.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    config: DeriverConfig,
}

impl FeatureDeriver {
    pub fn new(config: DeriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DeriverConfig {
        &self.config
    }

    pub fn run(&self, table: FeatureTable) -> OchreResult<FeatureTable> {
        self.config.validate()?;

        let rows = table.height();
        let largest = self.config.indicators.largest_window();
        if rows < largest {
            return Err(FeatureError::SeriesTooShort {
                rows,
                window: largest,
            }
            .into());
        }

        let table = self.add_holiday_feature(table)?;
        let table = apply(table, "month_index", calendar::month_index_expr())?;
        let table = apply(table, "day_of_year", calendar::day_of_year_expr())?;
        let table = apply(table, "hour_of_day", calendar::hour_of_day_expr())?;
        let table = self.add_indicator_features(table)?;
        let (table, diffs) = self.add_label_feature(table)?;

        self.export(&table, &diffs)?;

        Ok(table)
    }

    fn add_holiday_feature(&self, table: FeatureTable) -> OchreResult<FeatureTable> {
        let (start, end) = table.date_span()?;
        let holidays = calendar::us_federal_holidays(start, end);
        debug!(%start, %end, count = holidays.len(), "derived holiday calendar");

        apply(table, "is_holiday", calendar::holiday_flag_expr(&holidays))
    }

    fn add_indicator_features(&self, mut table: FeatureTable) -> OchreResult<FeatureTable> {
        for window in &self.config.indicators.sma_windows {
            table = apply(table, window.column_name().as_str(), window.expr())?;
        }
        for window in &self.config.indicators.ema_windows {
            table = apply(table, window.column_name().as_str(), window.expr())?;
        }

        let rsi = self.config.indicators.rsi_window;
        table = apply(table, rsi.column_name().as_str(), rsi.expr())?;

        let atr = self.config.indicators.atr_window;
        apply(table, atr.column_name().as_str(), atr.expr()?)
    }

    fn add_label_feature(&self, table: FeatureTable) -> OchreResult<(FeatureTable, Vec<f64>)> {
        let table = apply(table, "close_diff", label::close_diff_expr())?;

        let diffs = label::non_null_close_diffs(table.as_df())?;
        let fit = NormalFit::fit(&diffs)?;
        let lower = fit.quantile(self.config.label.lower_quantile)?;
        let upper = fit.quantile(self.config.label.upper_quantile)?;
        info!(
            mean = fit.mean(),
            std_dev = fit.std_dev(),
            lower,
            upper,
            "fitted close-diff distribution"
        );

        let table = apply(table, "label", label::label_expr(lower, upper))?;
        Ok((table, diffs))
    }

    /// Both artifacts are rendered in memory and staged as temp files
    /// before either rename, so a failed export publishes neither.
    fn export(&self, table: &FeatureTable, diffs: &[f64]) -> OchreResult<()> {
        let svg = render_close_diff_histogram(diffs, self.config.label.histogram_buckets)?;
        let parquet = table.to_parquet_bytes()?;

        let staged_table = crate::io::stage(
            &self.config.saving_directory,
            FEATURES_DATASET_FILE,
            &parquet,
        )?;
        let staged_plot = match crate::io::stage(
            &self.config.plot_saving_directory,
            CLOSE_DIFFS_HISTOGRAM_FILE,
            svg.as_bytes(),
        ) {
            Ok(staged) => staged,
            Err(e) => {
                staged_table.discard();
                return Err(e);
            }
        };

        let dataset = match staged_table.commit() {
            Ok(path) => path,
            Err(e) => {
                staged_plot.discard();
                return Err(e);
            }
        };
        info!(path = %dataset.display(), rows = table.height(), "exported feature table");

        let plot = staged_plot.commit()?;
        debug!(path = %plot.display(), "exported close-diff histogram");

        Ok(())
    }
}

/// One column-adding step. Re-validates the table at the step boundary so a
/// misbehaving transform cannot smuggle a row-count or ordering change past
/// the next step.
fn apply(table: FeatureTable, step: &str, expr: Expr) -> OchreResult<FeatureTable> {
    let df = table
        .into_df()
        .lazy()
        .with_column(expr)
        .collect()
        .map_err(|e| DataError::DataFrame(format!("Step '{step}' failed: {e}")))?;

    let table = FeatureTable::new(df)?;
    debug!(step, rows = table.height(), "applied transform");
    Ok(table)
}
