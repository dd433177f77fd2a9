//! Weighted mean and law-of-total-variance combination.

use std::collections::{BTreeMap, BTreeSet};

use gmc_convert::NewmarkHall1982;
use gmc_core::{
    CapabilityDescriptor, DistanceParams, ErrorInfo, EvalContext, GmcError, IntensityMeasure,
    MeasureKind, Prediction, RuptureParams, SiteParams, UncertaintyType, VariancePolicy,
    PGV_PROXY_PERIOD,
};
use ndarray::{ArrayD, IxDyn, Zip};
use tracing::{debug, warn};

use crate::model_ref::ModelRef;
use crate::set::WeightedModelSet;
use crate::shape::{as_flat, FlatInputs};

/// Round-off band for combined variance at unit mean; scaled by the squared mean per site.
pub const VARIANCE_ROUNDOFF: f64 = -1e-10;

/// Measure a member is evaluated at: SA(1.0) stands in for PGV when the member lacks it.
pub(crate) fn evaluated_measure(
    descriptor: &CapabilityDescriptor,
    measure: IntensityMeasure,
) -> IntensityMeasure {
    if measure.kind() == MeasureKind::Pgv && !descriptor.supports(&measure) {
        IntensityMeasure::Sa(PGV_PROXY_PERIOD)
    } else {
        measure
    }
}

/// Member output harmonised onto the set's measure and convention.
struct MemberOutput {
    mean: ArrayD<f64>,
    stddevs: Vec<ArrayD<f64>>,
}

impl WeightedModelSet {
    /// Evaluates the weighted combination at every site.
    ///
    /// Outputs have the shape shared by the array-valued input fields. Duplicate
    /// uncertainty types are evaluated once.
    pub fn evaluate(
        &self,
        sites: &SiteParams,
        rupture: &RuptureParams,
        distances: &DistanceParams,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError> {
        let types: Vec<UncertaintyType> = uncertainty_types
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.check_uncertainties(&types)?;
        let flat = FlatInputs::new(sites, rupture, distances)?;
        let prediction = self.evaluate_flat(&flat.context(), measure, &types)?;
        flat.restore(prediction)
    }

    pub(crate) fn evaluate_flat(
        &self,
        ctx: &EvalContext<'_>,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError> {
        self.check_uncertainties(uncertainty_types)?;
        let len = ctx.len;
        let mut mean = ArrayD::<f64>::zeros(IxDyn(&[len]));
        let mut second_moments: Vec<ArrayD<f64>> = uncertainty_types
            .iter()
            .map(|_| ArrayD::zeros(IxDyn(&[len])))
            .collect();
        let mut site_factors: Vec<(IntensityMeasure, ArrayD<f64>)> = Vec::new();

        for (index, (member, &weight)) in self.members().iter().zip(self.weights()).enumerate() {
            if weight == 0.0 {
                debug!(set = %self.name(), model = %member.name(), "skipping zero-weight member");
                continue;
            }
            let output = self
                .member_output(index, member, ctx, measure, uncertainty_types, &mut site_factors)
                .map_err(|err| {
                    err.with_context("model", member.name())
                        .with_context("set", self.name())
                })?;

            Zip::from(&mut mean)
                .and(&output.mean)
                .par_for_each(|acc, &mu| *acc += weight * mu);
            for (acc, sigma) in second_moments.iter_mut().zip(&output.stddevs) {
                Zip::from(acc)
                    .and(&output.mean)
                    .and(sigma)
                    .par_for_each(|acc, &mu, &sd| *acc += weight * (mu * mu + sd * sd));
            }
        }

        let mut stddevs = BTreeMap::new();
        for (kind, mut variance) in uncertainty_types.iter().copied().zip(second_moments) {
            Zip::from(&mut variance)
                .and(&mean)
                .par_for_each(|var, &mu| *var -= mu * mu);
            let sd = variance_to_stddev(variance, &mean, self.variance_policy(), kind, self.name())?;
            stddevs.insert(kind, sd);
        }
        Ok(Prediction { mean, stddevs })
    }

    fn member_output(
        &self,
        index: usize,
        member: &ModelRef,
        ctx: &EvalContext<'_>,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
        site_factors: &mut Vec<(IntensityMeasure, ArrayD<f64>)>,
    ) -> Result<MemberOutput, GmcError> {
        let descriptor = member.descriptor();
        let evaluated = evaluated_measure(descriptor, measure);
        let pgv_proxy = evaluated != measure;
        debug!(
            set = %self.name(),
            model = %member.name(),
            measure = %evaluated,
            pgv_proxy,
            "evaluating member"
        );

        let mut prediction = member.evaluate_flat(ctx, evaluated, uncertainty_types)?;
        let mut stddevs = Vec::with_capacity(uncertainty_types.len());
        for kind in uncertainty_types {
            let sd = prediction.take_stddev(*kind, member.name())?;
            stddevs.push(as_flat(sd, ctx.len, member.name())?);
        }
        let mut mean = as_flat(prediction.mean, ctx.len, member.name())?;

        if !self.member_site_terms()[index] {
            let cached = site_factors.iter().position(|(m, _)| *m == evaluated);
            let position = match cached {
                Some(position) => position,
                None => {
                    let factor = self.site_factor_flat(ctx, evaluated, true)?;
                    site_factors.push((evaluated, factor));
                    site_factors.len() - 1
                }
            };
            mean += &site_factors[position].1;
        }

        if pgv_proxy {
            mean = NewmarkHall1982::psa10_to_pgv_mean(mean);
            for (kind, sd) in uncertainty_types.iter().zip(stddevs.iter_mut()) {
                if *kind != UncertaintyType::InterEvent {
                    *sd = NewmarkHall1982::psa10_to_pgv_sigma(sd);
                }
            }
        }

        let from = descriptor.component;
        let to = self.convention();
        let converter = self.converter();
        let mean = converter.convert_mean(mean, from, to, &measure);
        let stddevs = stddevs
            .into_iter()
            .map(|sd| converter.convert_stddev(sd, from, to, &measure))
            .collect();
        Ok(MemberOutput { mean, stddevs })
    }
}

/// Turns a combined variance into a standard deviation under `policy`.
///
/// Negative values are clamped to zero. A negative value counts as round-off
/// while it stays above `VARIANCE_ROUNDOFF * max(1, mean²)` at its site, since
/// the subtraction loses precision in proportion to the squared mean. Under
/// [`VariancePolicy::Strict`] anything below that bound is an error instead.
pub fn variance_to_stddev(
    variance: ArrayD<f64>,
    mean: &ArrayD<f64>,
    policy: VariancePolicy,
    kind: UncertaintyType,
    set: &str,
) -> Result<ArrayD<f64>, GmcError> {
    let mut clamped = 0usize;
    let mut significant = 0usize;
    let mut min = f64::INFINITY;
    Zip::from(&variance).and(mean).for_each(|&var, &mu| {
        if var < 0.0 {
            clamped += 1;
            min = min.min(var);
            if var < VARIANCE_ROUNDOFF * (mu * mu).max(1.0) {
                significant += 1;
            }
        }
    });
    if significant > 0 {
        if policy == VariancePolicy::Strict {
            return Err(GmcError::NegativeVariance(
                ErrorInfo::new("negative_variance", "combined variance is negative")
                    .with_context("set", set)
                    .with_context("uncertainty", kind.as_str())
                    .with_context("min_variance", min.to_string())
                    .with_context("sites", significant.to_string()),
            ));
        }
        warn!(set, uncertainty = %kind, min_variance = min, sites = significant, "clamping negative variance");
    } else if clamped > 0 {
        debug!(set, uncertainty = %kind, min_variance = min, sites = clamped, "clamping variance round-off");
    }
    Ok(variance.mapv(|value| if value < 0.0 { 0.0 } else { value.sqrt() }))
}
