use std::collections::BTreeSet;
use std::sync::Arc;

use gmc_convert::{BeyerBommer2006, ComponentConverter};
use gmc_core::{
    CapabilityDescriptor, ComponentConvention, ErrorInfo, GmcError, IntensityMeasure,
    MeasureKind, SiteParam, TectonicRegion, UncertaintyType, VariancePolicy,
};
use tracing::info;

use crate::model_ref::ModelRef;

/// Absolute tolerance on the sum of a weight vector.
pub const WEIGHT_TOLERANCE: f64 = 1e-7;

/// Site condition (m/s) used for the reference side of a site factor.
pub const DEFAULT_REFERENCE_VS30: f64 = 760.0;

/// Checks that weights are finite, non-negative and sum to one.
pub fn check_weights(weights: &[f64], set: &str) -> Result<(), GmcError> {
    if let Some((index, weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, weight)| !weight.is_finite() || **weight < 0.0)
    {
        return Err(GmcError::WeightSum(
            ErrorInfo::new("invalid_weight", "weights must be finite and non-negative")
                .with_context("set", set)
                .with_context("index", index.to_string())
                .with_context("weight", weight.to_string()),
        ));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(GmcError::WeightSum(
            ErrorInfo::new("weight_sum", format!("weights sum to {sum}, expected 1"))
                .with_context("set", set)
                .with_context("sum", sum.to_string())
                .with_hint("normalise the weights so they sum to 1 within 1e-7"),
        ));
    }
    Ok(())
}

pub(crate) fn check_count(models: usize, weights: usize, set: &str) -> Result<(), GmcError> {
    if models != weights {
        return Err(GmcError::WeightCountMismatch(
            ErrorInfo::new("weight_count", "one weight is required per model")
                .with_context("set", set)
                .with_context("models", models.to_string())
                .with_context("weights", weights.to_string()),
        ));
    }
    Ok(())
}

/// Derives the descriptor of a composite node from its members.
///
/// Measures, parameters and coefficient entries are unions; uncertainty types
/// are the intersection.
pub(crate) fn merge_descriptors<'a>(
    region: TectonicRegion,
    component: ComponentConvention,
    members: impl IntoIterator<Item = &'a CapabilityDescriptor>,
) -> CapabilityDescriptor {
    let mut merged = CapabilityDescriptor::new(region, component);
    let mut uncertainties: Option<BTreeSet<UncertaintyType>> = None;
    for descriptor in members {
        merged.intensity_measures.extend(descriptor.intensity_measures.iter().copied());
        merged.required_site.extend(descriptor.required_site.iter().copied());
        merged.required_rupture.extend(descriptor.required_rupture.iter().copied());
        merged.required_distance.extend(descriptor.required_distance.iter().copied());
        merged.coefficients = merged.coefficients.merged(&descriptor.coefficients);
        uncertainties = Some(match uncertainties {
            None => descriptor.uncertainty_types.clone(),
            Some(current) => current
                .intersection(&descriptor.uncertainty_types)
                .copied()
                .collect(),
        });
    }
    merged.uncertainty_types = uncertainties.unwrap_or_default();
    merged
}

/// Validated, immutable weighted set of models with cached derived metadata.
#[derive(Debug)]
pub struct WeightedModelSet {
    name: String,
    members: Vec<ModelRef>,
    weights: Vec<f64>,
    has_site_term: Vec<bool>,
    all_have_pgv: bool,
    descriptor: CapabilityDescriptor,
    reference_vs30: f64,
    variance_policy: VariancePolicy,
    converter: Arc<dyn ComponentConverter>,
    site_term_set: Option<Arc<WeightedModelSet>>,
}

impl WeightedModelSet {
    /// Starts a builder for `models` with `weights`.
    pub fn builder(models: Vec<ModelRef>, weights: Vec<f64>) -> WeightedModelSetBuilder {
        WeightedModelSetBuilder::new(models, weights)
    }

    /// Builds a set from parallel model and weight lists.
    ///
    /// `default_site_models` are mandatory when any member lacks a native site
    /// term. Omitted `default_site_weights` mean equal weights and an omitted
    /// `reference_vs30` means 760 m/s.
    pub fn from_models(
        models: Vec<ModelRef>,
        weights: Vec<f64>,
        convention: ComponentConvention,
        default_site_models: Option<Vec<ModelRef>>,
        default_site_weights: Option<Vec<f64>>,
        reference_vs30: Option<f64>,
    ) -> Result<Self, GmcError> {
        let mut builder = Self::builder(models, weights).convention(convention);
        if let Some(site_models) = default_site_models {
            builder = builder.default_site_models(site_models, default_site_weights);
        }
        if let Some(vs30) = reference_vs30 {
            builder = builder.reference_vs30(vs30);
        }
        builder.build()
    }

    /// Name used in logs and error context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in configuration order.
    pub fn members(&self) -> &[ModelRef] {
        &self.members
    }

    /// Weights parallel to [`Self::members`].
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Derived descriptor of the whole set.
    pub fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    /// Output component convention.
    pub fn convention(&self) -> ComponentConvention {
        self.descriptor.component
    }

    /// Tectonic region shared by the members, or `Mixed`.
    pub fn tectonic_region(&self) -> TectonicRegion {
        self.descriptor.tectonic_region
    }

    /// Whether each member carries its own site term.
    pub fn member_site_terms(&self) -> &[bool] {
        &self.has_site_term
    }

    /// True iff every member predicts PGV natively.
    pub fn all_have_pgv(&self) -> bool {
        self.all_have_pgv
    }

    /// Reference vs30 (m/s) used by site factors.
    pub fn reference_vs30(&self) -> f64 {
        self.reference_vs30
    }

    /// Variance clamping behaviour.
    pub fn variance_policy(&self) -> VariancePolicy {
        self.variance_policy
    }

    /// Default site-term set, when one was configured.
    pub fn site_term_set(&self) -> Option<&WeightedModelSet> {
        self.site_term_set.as_deref()
    }

    pub(crate) fn converter(&self) -> &dyn ComponentConverter {
        self.converter.as_ref()
    }

    /// Fails unless every type in `requested` is supported by all members.
    pub fn check_uncertainties(&self, requested: &[UncertaintyType]) -> Result<(), GmcError> {
        match requested
            .iter()
            .find(|kind| !self.descriptor.uncertainty_types.contains(kind))
        {
            Some(kind) => Err(GmcError::UnsupportedUncertaintyType(
                ErrorInfo::new(
                    "unsupported_uncertainty",
                    "requested uncertainty type is not supported by every member",
                )
                .with_context("set", self.name.as_str())
                .with_context("uncertainty", kind.as_str())
                .with_context(
                    "supported",
                    self.descriptor
                        .uncertainty_types
                        .iter()
                        .map(|kind| kind.as_str())
                        .collect::<Vec<_>>()
                        .join(","),
                ),
            )),
            None => Ok(()),
        }
    }

    /// Whether the set can produce `measure`, natively or through the PGV proxy.
    pub fn can_evaluate(&self, measure: &IntensityMeasure) -> bool {
        self.descriptor.supports(measure)
            || (measure.kind() == MeasureKind::Pgv
                && self.descriptor.intensity_measures.contains(&MeasureKind::Sa))
    }
}

/// Builder for [`WeightedModelSet`].
#[derive(Debug)]
pub struct WeightedModelSetBuilder {
    name: String,
    models: Vec<ModelRef>,
    weights: Vec<f64>,
    convention: ComponentConvention,
    site_models: Option<(Vec<ModelRef>, Option<Vec<f64>>)>,
    reference_vs30: f64,
    variance_policy: VariancePolicy,
    converter: Arc<dyn ComponentConverter>,
    allow_mixed_regions: bool,
}

impl WeightedModelSetBuilder {
    fn new(models: Vec<ModelRef>, weights: Vec<f64>) -> Self {
        Self {
            name: "composite".to_string(),
            models,
            weights,
            convention: ComponentConvention::default(),
            site_models: None,
            reference_vs30: DEFAULT_REFERENCE_VS30,
            variance_policy: VariancePolicy::default(),
            converter: Arc::new(BeyerBommer2006),
            allow_mixed_regions: false,
        }
    }

    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the output component convention.
    pub fn convention(mut self, convention: ComponentConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Configures the default site-term models; `None` weights mean equal weights.
    pub fn default_site_models(mut self, models: Vec<ModelRef>, weights: Option<Vec<f64>>) -> Self {
        self.site_models = Some((models, weights));
        self
    }

    /// Sets the reference vs30 (m/s).
    pub fn reference_vs30(mut self, vs30: f64) -> Self {
        self.reference_vs30 = vs30;
        self
    }

    /// Sets the variance policy.
    pub fn variance_policy(mut self, policy: VariancePolicy) -> Self {
        self.variance_policy = policy;
        self
    }

    /// Replaces the component converter.
    pub fn converter(mut self, converter: Arc<dyn ComponentConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Accepts members from different tectonic regions; the set region becomes `Mixed`.
    pub fn allow_mixed_regions(mut self, allow: bool) -> Self {
        self.allow_mixed_regions = allow;
        self
    }

    /// Validates the inputs and builds the set.
    pub fn build(self) -> Result<WeightedModelSet, GmcError> {
        let name = self.name;
        check_weights(&self.weights, &name)?;
        check_count(self.models.len(), self.weights.len(), &name)?;
        if self.models.is_empty() {
            return Err(GmcError::InvalidModel(
                ErrorInfo::new("empty_set", "a model set needs at least one member")
                    .with_context("set", name.as_str()),
            ));
        }
        for member in &self.models {
            member.descriptor().validate(member.name())?;
        }
        if !self.reference_vs30.is_finite() || self.reference_vs30 <= 0.0 {
            return Err(GmcError::Config(
                ErrorInfo::new("reference_vs30", "reference vs30 must be positive")
                    .with_context("set", name.as_str())
                    .with_context("value", self.reference_vs30.to_string()),
            ));
        }
        let region = resolve_region(&self.models, self.allow_mixed_regions, &name)?;

        let has_site_term: Vec<bool> = self
            .models
            .iter()
            .map(|member| member.descriptor().has_site_term())
            .collect();
        let all_have_pgv = self
            .models
            .iter()
            .all(|member| member.descriptor().supports(&IntensityMeasure::Pgv));

        let site_term_set = match self.site_models {
            Some((models, weights)) => {
                let weights = weights.unwrap_or_else(|| equal_weights(models.len()));
                let site_set = WeightedModelSetBuilder::new(models, weights)
                    .name(format!("{name}/site"))
                    .convention(self.convention)
                    .reference_vs30(self.reference_vs30)
                    .variance_policy(self.variance_policy)
                    .converter(Arc::clone(&self.converter))
                    .allow_mixed_regions(true)
                    .build()?;
                Some(Arc::new(site_set))
            }
            None => None,
        };
        if site_term_set.is_none() {
            if let Some(index) = has_site_term.iter().position(|has| !has) {
                return Err(GmcError::MissingDefaultSiteModel(
                    ErrorInfo::new(
                        "missing_default_site_model",
                        "a member has no site term and no default site models were given",
                    )
                    .with_context("set", name.as_str())
                    .with_context("model", self.models[index].name()),
                ));
            }
        }

        let mut descriptor = merge_descriptors(
            region,
            self.convention,
            self.models.iter().map(ModelRef::descriptor),
        );
        if descriptor.uncertainty_types.is_empty() {
            return Err(GmcError::InvalidModel(
                ErrorInfo::new("no_common_uncertainty", "members share no uncertainty type")
                    .with_context("set", name.as_str()),
            ));
        }
        descriptor.required_site.insert(SiteParam::Vs30);
        if let Some(site_set) = &site_term_set {
            let site = site_set.descriptor();
            descriptor.required_site.extend(site.required_site.iter().copied());
            descriptor.required_rupture.extend(site.required_rupture.iter().copied());
            descriptor.required_distance.extend(site.required_distance.iter().copied());
        }

        info!(
            set = %name,
            members = self.models.len(),
            region = %region,
            convention = %self.convention,
            default_site_models = site_term_set.as_ref().map_or(0, |set| set.members.len()),
            "assembled weighted model set"
        );

        Ok(WeightedModelSet {
            name,
            members: self.models,
            weights: self.weights,
            has_site_term,
            all_have_pgv,
            descriptor,
            reference_vs30: self.reference_vs30,
            variance_policy: self.variance_policy,
            converter: self.converter,
            site_term_set,
        })
    }
}

/// Equal weights summing to one.
pub fn equal_weights(count: usize) -> Vec<f64> {
    vec![1.0 / count as f64; count]
}

fn resolve_region(
    models: &[ModelRef],
    allow_mixed: bool,
    set: &str,
) -> Result<TectonicRegion, GmcError> {
    let first = models[0].descriptor().tectonic_region;
    match models
        .iter()
        .find(|member| member.descriptor().tectonic_region != first)
    {
        None => Ok(first),
        Some(_) if allow_mixed => Ok(TectonicRegion::Mixed),
        Some(other) => Err(GmcError::TectonicRegionMismatch(
            ErrorInfo::new("region_mismatch", "members must share one tectonic region")
                .with_context("set", set)
                .with_context("model", other.name())
                .with_context("region", other.descriptor().tectonic_region.as_str())
                .with_context("expected", first.as_str())
                .with_hint("combine regions through a configuration composite instead"),
        )),
    }
}
