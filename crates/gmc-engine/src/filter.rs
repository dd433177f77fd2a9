//! Period and measure applicability filtering.

use gmc_core::{
    CapabilityDescriptor, ErrorInfo, GmcError, IntensityMeasure, MeasureKind, PGV_PROXY_PERIOD,
};
use tracing::debug;

use crate::combine::evaluated_measure;
use crate::model_ref::ModelRef;
use crate::set::{check_count, WeightedModelSet};

/// Whether a model with `descriptor` can serve `measure`.
///
/// PGA needs a PGA table entry. PGV needs a PGV entry or a period range that
/// spans the 1.0 s proxy. SA needs a period range covering the period.
pub fn is_applicable(descriptor: &CapabilityDescriptor, measure: &IntensityMeasure) -> bool {
    let table = &descriptor.coefficients;
    match measure {
        IntensityMeasure::Pga => table.has_entry(MeasureKind::Pga),
        IntensityMeasure::Pgv => {
            table.has_entry(MeasureKind::Pgv) || table.covers_period(PGV_PROXY_PERIOD)
        }
        IntensityMeasure::Sa(period) => table.covers_period(*period),
    }
}

/// Whether `model` can serve `measure` at every site.
///
/// A leaf is judged by its descriptor. A set needs every positive-weight member
/// to qualify, plus its default site set wherever a member relies on it. A
/// blended model needs both its near and far sets.
pub fn model_applicable(model: &ModelRef, measure: &IntensityMeasure) -> bool {
    match model {
        ModelRef::Leaf(_) => is_applicable(model.descriptor(), measure),
        ModelRef::Set(set) => set_applicable(set, measure),
        ModelRef::Blended(blended) => {
            set_applicable(blended.near(), measure)
                && blended
                    .far()
                    .map_or(true, |far| set_applicable(&far.set, measure))
        }
    }
}

fn set_applicable(set: &WeightedModelSet, measure: &IntensityMeasure) -> bool {
    set.members()
        .iter()
        .zip(set.weights())
        .zip(set.member_site_terms())
        .filter(|((_, weight), _)| **weight > 0.0)
        .all(|((member, _), has_site_term)| {
            if !model_applicable(member, measure) {
                return false;
            }
            if *has_site_term {
                return true;
            }
            let evaluated = evaluated_measure(member.descriptor(), *measure);
            set.site_term_set()
                .map_or(false, |site| set_applicable(site, &evaluated))
        })
}

/// Drops the models that cannot serve `measure` and renormalises the remaining weights.
pub fn filter_models(
    models: &[ModelRef],
    weights: &[f64],
    measure: &IntensityMeasure,
) -> Result<(Vec<ModelRef>, Vec<f64>), GmcError> {
    check_count(models.len(), weights.len(), "filter")?;
    let mut kept_models = Vec::new();
    let mut kept_weights = Vec::new();
    for (model, weight) in models.iter().zip(weights) {
        let keep = model_applicable(model, measure);
        debug!(model = %model.name(), measure = %measure, keep, "period filter");
        if keep {
            kept_models.push(model.clone());
            kept_weights.push(*weight);
        }
    }

    let total: f64 = kept_weights.iter().sum();
    if kept_models.is_empty() || total <= 0.0 {
        return Err(GmcError::NoApplicableModel(
            ErrorInfo::new("no_applicable_model", "no model supports the requested measure")
                .with_context("measure", measure.to_string())
                .with_context("candidates", models.len().to_string())
                .with_context("kept", kept_models.len().to_string()),
        ));
    }
    for weight in &mut kept_weights {
        *weight /= total;
    }
    Ok((kept_models, kept_weights))
}
