use std::fmt::Debug;

use gmc_core::{ComponentConvention, IntensityMeasure};
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

/// Converts ln-means and ln-standard deviations between component conventions.
pub trait ComponentConverter: Debug + Send + Sync {
    /// Converts a ln-mean array from `from` to `to` for `measure`.
    fn convert_mean(
        &self,
        mean: ArrayD<f64>,
        from: ComponentConvention,
        to: ComponentConvention,
        measure: &IntensityMeasure,
    ) -> ArrayD<f64>;

    /// Converts a ln-standard-deviation array from `from` to `to` for `measure`.
    fn convert_stddev(
        &self,
        stddev: ArrayD<f64>,
        from: ComponentConvention,
        to: ComponentConvention,
        measure: &IntensityMeasure,
    ) -> ArrayD<f64>;
}

/// Ratio of a convention to the geometric mean of the as-recorded components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentRatio {
    /// Median ratio for PGA and SA at or below the short-period corner.
    pub short: f64,
    /// Median ratio for SA at or above the long-period corner.
    pub long: f64,
    /// Median ratio for PGV.
    pub pgv: f64,
    /// Ratio of standard deviations.
    pub sigma: f64,
}

impl ComponentRatio {
    const fn uniform(median: f64, sigma: f64) -> Self {
        Self {
            short: median,
            long: median,
            pgv: median,
            sigma,
        }
    }
}

/// Short-period corner (s) of the spectral ratio interpolation.
const SHORT_CORNER: f64 = 0.15;
/// Long-period corner (s) of the spectral ratio interpolation.
const LONG_CORNER: f64 = 0.8;

/// Ratio table in the manner of Beyer & Bommer (2006).
///
/// Every conversion goes through the geometric mean of the as-recorded
/// components: `ln y_gm = ln y_in - ln R_in`, then `ln y_out = ln y_gm + ln R_out`.
/// Standard deviations scale by the sigma ratios the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeyerBommer2006;

impl BeyerBommer2006 {
    /// Ratio entry for `convention`.
    pub fn ratio(convention: ComponentConvention) -> ComponentRatio {
        match convention {
            ComponentConvention::AverageHorizontal | ComponentConvention::GmRotI50 => {
                ComponentRatio::uniform(1.0, 1.0)
            }
            ComponentConvention::MedianHorizontal => ComponentRatio {
                short: 1.0,
                long: 1.02,
                pgv: 1.0,
                sigma: 1.0,
            },
            ComponentConvention::RandomHorizontal => ComponentRatio::uniform(1.0, 1.07),
            ComponentConvention::GreaterOfTwoHorizontal => ComponentRatio {
                short: 1.1,
                long: 1.2,
                pgv: 1.1,
                sigma: 1.02,
            },
        }
    }

    /// Natural log of the median ratio of `convention` for `measure`.
    pub fn ln_median_ratio(convention: ComponentConvention, measure: &IntensityMeasure) -> f64 {
        let ratio = Self::ratio(convention);
        match measure {
            IntensityMeasure::Pga => ratio.short.ln(),
            IntensityMeasure::Pgv => ratio.pgv.ln(),
            IntensityMeasure::Sa(period) => {
                let (short, long) = (ratio.short.ln(), ratio.long.ln());
                if *period <= SHORT_CORNER {
                    short
                } else if *period >= LONG_CORNER {
                    long
                } else {
                    let frac = (period / SHORT_CORNER).ln() / (LONG_CORNER / SHORT_CORNER).ln();
                    short + (long - short) * frac
                }
            }
        }
    }
}

impl ComponentConverter for BeyerBommer2006 {
    fn convert_mean(
        &self,
        mean: ArrayD<f64>,
        from: ComponentConvention,
        to: ComponentConvention,
        measure: &IntensityMeasure,
    ) -> ArrayD<f64> {
        if from == to {
            return mean;
        }
        let shift = Self::ln_median_ratio(to, measure) - Self::ln_median_ratio(from, measure);
        mean + shift
    }

    fn convert_stddev(
        &self,
        stddev: ArrayD<f64>,
        from: ComponentConvention,
        to: ComponentConvention,
        _measure: &IntensityMeasure,
    ) -> ArrayD<f64> {
        if from == to {
            return stddev;
        }
        let scale = Self::ratio(to).sigma / Self::ratio(from).sigma;
        stddev * scale
    }
}
