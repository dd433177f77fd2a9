use std::sync::Arc;

use gmc_core::{ComponentConvention, ErrorInfo, GmcError, IntensityMeasure, VariancePolicy};
use gmc_engine::{
    check_weights, filter_models, DistanceBlendedModel, FarField, ModelRef, WeightedModelSet,
    DEFAULT_REFERENCE_VS30,
};
use tracing::info;

use crate::catalog::SetDefinition;
use crate::registry::ModelRegistry;

/// Set-wide settings applied when a definition is assembled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyOptions {
    /// Output component convention.
    pub convention: ComponentConvention,
    /// Reference vs30 (m/s) for site factors.
    pub reference_vs30: f64,
    /// Variance clamping behaviour.
    pub variance_policy: VariancePolicy,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            convention: ComponentConvention::default(),
            reference_vs30: DEFAULT_REFERENCE_VS30,
            variance_policy: VariancePolicy::default(),
        }
    }
}

fn build_set(
    name: String,
    models: Vec<ModelRef>,
    weights: Vec<f64>,
    site_models: Option<(Vec<ModelRef>, Option<Vec<f64>>)>,
    options: &AssemblyOptions,
) -> Result<WeightedModelSet, GmcError> {
    let mut builder = WeightedModelSet::builder(models, weights)
        .name(name)
        .convention(options.convention)
        .reference_vs30(options.reference_vs30)
        .variance_policy(options.variance_policy);
    if let Some((models, weights)) = site_models {
        builder = builder.default_site_models(models, weights);
    }
    builder.build()
}

/// Assembles a named definition into a near/far distance-switched model.
///
/// When `measure` is given, the near and far weight vectors are filtered
/// separately for that measure and renormalised. Both sets share the default
/// site-term models.
pub fn assemble_definition(
    definition: &SetDefinition,
    registry: &ModelRegistry,
    measure: Option<IntensityMeasure>,
    options: &AssemblyOptions,
) -> Result<DistanceBlendedModel, GmcError> {
    let name = definition.name.as_str();
    check_weights(&definition.weights, name)?;
    if definition.models.len() != definition.weights.len() {
        return Err(GmcError::WeightCountMismatch(
            ErrorInfo::new("weight_count", "one weight is required per model")
                .with_context("set", name)
                .with_context("models", definition.models.len().to_string())
                .with_context("weights", definition.weights.len().to_string()),
        ));
    }
    let models = registry.create_all(&definition.models)?;
    let site_models = if definition.site_models.is_empty() {
        None
    } else {
        Some((
            registry.create_all(&definition.site_models)?,
            definition.site_weights.clone(),
        ))
    };

    let (near_models, near_weights) = match &measure {
        Some(measure) => filter_models(&models, &definition.weights, measure)
            .map_err(|err| err.with_context("set", name))?,
        None => (models.clone(), definition.weights.clone()),
    };
    let near = build_set(
        name.to_string(),
        near_models,
        near_weights,
        site_models.clone(),
        options,
    )?;

    let far = match (&definition.far_weights, definition.cutoff_km) {
        (None, None) => None,
        (Some(far_weights), Some(cutoff)) => {
            check_weights(far_weights, name)?;
            let (far_models, far_weights) = match &measure {
                Some(measure) => filter_models(&models, far_weights, measure)
                    .map_err(|err| err.with_context("set", name))?,
                None => (models.clone(), far_weights.clone()),
            };
            let set = build_set(
                format!("{name}/far"),
                far_models,
                far_weights,
                site_models,
                options,
            )?;
            Some(FarField {
                set: Arc::new(set),
                cutoff,
            })
        }
        _ => {
            return Err(GmcError::Config(
                ErrorInfo::new(
                    "far_field",
                    "far-field weights and a cutoff distance must be given together",
                )
                .with_context("set", name),
            ))
        }
    };

    info!(
        set = name,
        measure = %measure.map(|m| m.to_string()).unwrap_or_else(|| "any".to_string()),
        members = near.members().len(),
        far_field = far.is_some(),
        "assembled set definition"
    );
    DistanceBlendedModel::new(name, Arc::new(near), far)
}
