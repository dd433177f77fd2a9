use std::collections::BTreeMap;
use std::fmt::Debug;

use ndarray::ArrayD;

use crate::descriptor::CapabilityDescriptor;
use crate::errors::{ErrorInfo, GmcError};
use crate::measure::IntensityMeasure;
use crate::params::{DistanceParams, RuptureParams, SiteParams};
use crate::types::UncertaintyType;

/// Flattened inputs handed to a model: every computational array is one
/// dimensional with `len` entries, scalars apply to every site.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Site parameters.
    pub sites: &'a SiteParams,
    /// Rupture parameters.
    pub rupture: &'a RuptureParams,
    /// Distance parameters.
    pub distances: &'a DistanceParams,
    /// Number of sites.
    pub len: usize,
}

/// Mean and standard deviations in natural-log units.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Mean of ln(intensity).
    pub mean: ArrayD<f64>,
    /// Standard deviation per uncertainty type.
    pub stddevs: BTreeMap<UncertaintyType, ArrayD<f64>>,
}

impl Prediction {
    /// Returns the standard deviation array for `kind`.
    pub fn stddev(&self, kind: UncertaintyType) -> Option<&ArrayD<f64>> {
        self.stddevs.get(&kind)
    }

    /// Shape shared by the mean and every standard deviation array.
    pub fn shape(&self) -> &[usize] {
        self.mean.shape()
    }

    /// Takes the standard deviation for `kind`, failing with the model name in context.
    pub fn take_stddev(&mut self, kind: UncertaintyType, model: &str) -> Result<ArrayD<f64>, GmcError> {
        self.stddevs.remove(&kind).ok_or_else(|| {
            GmcError::UnsupportedUncertaintyType(
                ErrorInfo::new("missing_stddev", "model did not report a requested uncertainty")
                    .with_context("model", model)
                    .with_context("uncertainty", kind.as_str()),
            )
        })
    }
}

/// A primitive ground-motion prediction model supplied by an external library.
pub trait GroundMotionModel: Debug + Send + Sync {
    /// Registry name of the model.
    fn name(&self) -> &str;

    /// Static capability metadata.
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// Predicts ln-mean and standard deviations for every site in `ctx`.
    ///
    /// Implementations return one-dimensional arrays of length `ctx.len` and
    /// one entry per requested uncertainty type.
    fn mean_and_stddevs(
        &self,
        ctx: &EvalContext<'_>,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError>;
}
