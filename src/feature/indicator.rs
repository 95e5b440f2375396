use polars::{
    prelude::{
        EWMOptions, Expr, Null, PlSmallStr, RollingOptionsFixedWindow, col, lit, max_horizontal,
        when,
    },
    series::ops::NullBehavior,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DataError, OchreResult},
    schema::FeatureCol,
};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SmaWindow(pub u16);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmaWindow(pub u16);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RsiWindow(pub u16);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtrWindow(pub u16);

impl SmaWindow {
    pub fn column_name(&self) -> PlSmallStr {
        format!("sma_{}", self.0).into()
    }

    /// Simple moving average of `close`. Null for the first window-1 rows.
    pub fn expr(&self) -> Expr {
        let options = RollingOptionsFixedWindow {
            window_size: self.0 as usize,
            min_periods: self.0 as usize, // Strict: Require full window validity
            weights: None,                // Standard SMA is unweighted
            center: false,                // False prevents look-ahead bias
            fn_params: None,
        };

        col(FeatureCol::Close)
            .rolling_mean(options)
            .alias(self.column_name())
    }
}

impl EmaWindow {
    pub fn column_name(&self) -> PlSmallStr {
        format!("ema_{}", self.0).into()
    }

    /// Exponentially weighted moving average of `close`, defined for every
    /// row (the seed value is the first close).
    pub fn expr(&self) -> Expr {
        let window = self.0;

        // Standard EMA formula: alpha = 2 / (span + 1)
        let alpha = 2.0 / (window as f64 + 1.0);
        let options = EWMOptions {
            alpha,
            // Use recursive calculation
            adjust: false,

            // Do not apply statistical sample correction; we want the raw weighted average.
            bias: false,

            // Emit from the first row on; the recursion is seeded with close[0].
            min_periods: 1,

            // If a price is missing, skip the decay step for that row.
            ignore_nulls: true,
        };

        col(FeatureCol::Close)
            .ewm_mean(options)
            .alias(self.column_name())
    }
}

impl RsiWindow {
    pub fn column_name(&self) -> PlSmallStr {
        format!("rsi_{}", self.0).into()
    }

    /// Relative strength index of `close`. Null for the first `window` rows.
    pub fn expr(&self) -> Expr {
        let window = self.0;
        // Wilder's Smoothing for RSI: alpha = 1 / N
        let alpha = 1.0 / (window as f64);

        // Wilder's Smoothing (effectively an EMA with alpha = 1/window)
        // Note: Some RSI implementations use SMA, but Wilder's is standard.
        let options = EWMOptions {
            alpha,
            adjust: false,
            bias: false,

            // Don't emit values until we have seen 'window' price changes.
            min_periods: window as usize,

            // The first diff is null; skip it rather than decaying over it.
            ignore_nulls: true,
        };

        // 1. Calculate the CHANGE (P_t - P_t-1)
        let delta = col(FeatureCol::Close).diff(lit(1), NullBehavior::Ignore);

        // 2. Separate Gains (Up moves) and Losses (Down moves)
        let gain = delta.clone().clip(lit(0), lit(f64::MAX));
        let loss = delta.clip(lit(f64::MIN), lit(0)).abs();

        // 3. Apply Wilder's Smoothing
        let avg_gain = gain.ewm_mean(options);
        let avg_loss = loss.ewm_mean(options);

        // 4. Calculate Ratio and Normalize to 0-100
        let rs = avg_gain / avg_loss;
        let rsi = lit(100.0) - (lit(100.0) / (lit(1.0) + rs));

        rsi.alias(self.column_name())
    }
}

impl AtrWindow {
    pub fn column_name(&self) -> PlSmallStr {
        format!("atr_{}", self.0).into()
    }

    /// Average true range over `high`/`low`/`close`. Null for the first
    /// `window` rows (the true range itself is undefined at row 0).
    pub fn expr(&self) -> OchreResult<Expr> {
        let window = self.0 as usize;

        let prev_close = col(FeatureCol::Close).shift(lit(1));
        let true_range = max_horizontal([
            col(FeatureCol::High) - col(FeatureCol::Low),
            (col(FeatureCol::High) - prev_close.clone()).abs(),
            (col(FeatureCol::Low) - prev_close.clone()).abs(),
        ])
        .map_err(|e| DataError::DataFrame(e.to_string()))?;

        // max_horizontal skips nulls, so pin row 0 (no previous close) back
        // to null explicitly.
        let true_range = when(prev_close.is_null())
            .then(lit(Null {}))
            .otherwise(true_range);

        let options = RollingOptionsFixedWindow {
            window_size: window,
            min_periods: window,
            weights: None,
            center: false,
            fn_params: None,
        };

        Ok(true_range.rolling_mean(options).alias(self.column_name()))
    }
}
