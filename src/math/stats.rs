use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::{FeatureError, OchreResult};

/// A Normal distribution fitted by maximum likelihood to a sample.
///
/// The standard deviation is the biased (/n) estimate, so thresholds derived
/// from the fit match a textbook ML fit of the same sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    mean: f64,
    std_dev: f64,
}

impl NormalFit {
    pub fn fit(values: &[f64]) -> OchreResult<Self> {
        if values.len() < 2 {
            return Err(FeatureError::DegenerateFit(format!(
                "need at least 2 observations, got {}",
                values.len()
            ))
            .into());
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        if !mean.is_finite() || !std_dev.is_finite() {
            return Err(FeatureError::DegenerateFit("non-finite sample moments".to_string()).into());
        }
        if std_dev <= 0.0 {
            return Err(FeatureError::DegenerateFit(
                "zero variance, all observations identical".to_string(),
            )
            .into());
        }

        Ok(Self { mean, std_dev })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Inverse CDF (percent-point function) of the fitted distribution.
    /// `p` must lie strictly inside (0, 1).
    pub fn quantile(&self, p: f64) -> OchreResult<f64> {
        if !(p > 0.0 && p < 1.0) {
            return Err(FeatureError::InvalidQuantiles { lower: p, upper: p }.into());
        }

        let normal = Normal::new(self.mean, self.std_dev)
            .map_err(|e| FeatureError::DegenerateFit(e.to_string()))?;

        Ok(normal.inverse_cdf(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OchreError;

    #[test]
    fn test_fit_recovers_sample_moments() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let fit = NormalFit::fit(&values).expect("fit failed");

        assert!((fit.mean() - 2.5).abs() < 1e-12);
        // Biased estimate: sqrt(mean of squared deviations), not /(n-1).
        assert!((fit.std_dev() - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_standard_normal_quantiles() {
        // Large symmetric sample around 0 with unit-ish spread is not needed;
        // construct the fit directly from two points giving mean 0, std 1.
        let fit = NormalFit::fit(&[-1.0, 1.0]).expect("fit failed");

        let lower = fit.quantile(0.4).expect("quantile failed");
        let upper = fit.quantile(0.6).expect("quantile failed");

        // Phi^-1(0.4) and Phi^-1(0.6) for N(0, 1).
        assert!((lower + 0.2533).abs() < 1e-3, "lower was {lower}");
        assert!((upper - 0.2533).abs() < 1e-3, "upper was {upper}");
    }

    #[test]
    fn test_zero_variance_is_an_error() {
        let err = NormalFit::fit(&[2.0, 2.0, 2.0]).expect_err("degenerate fit accepted");
        assert!(matches!(
            err,
            OchreError::Feature(FeatureError::DegenerateFit(_))
        ));
    }

    #[test]
    fn test_single_observation_is_an_error() {
        let err = NormalFit::fit(&[1.0]).expect_err("single observation accepted");
        assert!(matches!(
            err,
            OchreError::Feature(FeatureError::DegenerateFit(_))
        ));
    }

    #[test]
    fn test_quantile_bounds_rejected() {
        let fit = NormalFit::fit(&[-1.0, 1.0]).expect("fit failed");
        assert!(fit.quantile(0.0).is_err());
        assert!(fit.quantile(1.0).is_err());
        assert!(fit.quantile(-0.1).is_err());
    }
}
