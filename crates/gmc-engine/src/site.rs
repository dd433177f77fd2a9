use gmc_core::{
    DistanceParams, ErrorInfo, EvalContext, GmcError, IntensityMeasure, ParamKey, RuptureParams,
    SiteParam, SiteParams, UncertaintyType,
};
use ndarray::ArrayD;

use crate::set::WeightedModelSet;
use crate::shape::{reshape, FlatInputs};

/// Copy of `sites` with every vs30 value replaced by `reference_vs30`, same shape.
pub fn reference_sites(sites: &SiteParams, reference_vs30: f64) -> Result<SiteParams, GmcError> {
    let vs30 = sites.get(SiteParam::Vs30).ok_or_else(|| {
        GmcError::MissingParameter(
            ErrorInfo::new("missing_parameter", "site factors need vs30")
                .with_context("field", SiteParam::Vs30.as_str()),
        )
    })?;
    Ok(sites.replaced(SiteParam::Vs30, vs30.map(|_| reference_vs30)))
}

impl WeightedModelSet {
    /// Natural-log site amplification relative to the reference vs30.
    ///
    /// With `use_default` the default site-term set is evaluated, otherwise this
    /// set itself. Either way the result is `mean(true sites) - mean(reference sites)`
    /// in the shape of the inputs.
    pub fn site_factor(
        &self,
        sites: &SiteParams,
        rupture: &RuptureParams,
        distances: &DistanceParams,
        measure: IntensityMeasure,
        use_default: bool,
    ) -> Result<ArrayD<f64>, GmcError> {
        let flat = FlatInputs::new(sites, rupture, distances)?;
        let factor = self.site_factor_flat(&flat.context(), measure, use_default)?;
        reshape(&factor, &flat.shape)
    }

    pub(crate) fn site_factor_flat(
        &self,
        ctx: &EvalContext<'_>,
        measure: IntensityMeasure,
        use_default: bool,
    ) -> Result<ArrayD<f64>, GmcError> {
        let target = if use_default {
            self.site_term_set().ok_or_else(|| {
                GmcError::MissingDefaultSiteModel(
                    ErrorInfo::new("missing_default_site_model", "set has no default site models")
                        .with_context("set", self.name()),
                )
            })?
        } else {
            self
        };
        let types: Vec<UncertaintyType> =
            target.descriptor().uncertainty_types.iter().copied().collect();
        let reference = reference_sites(ctx.sites, self.reference_vs30())?;
        let reference_ctx = EvalContext {
            sites: &reference,
            ..*ctx
        };
        let actual = target.evaluate_flat(ctx, measure, &types)?;
        let rock = target.evaluate_flat(&reference_ctx, measure, &types)?;
        Ok(actual.mean - rock.mean)
    }
}
