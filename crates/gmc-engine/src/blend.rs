//! Near/far distance switching between two weighted sets.

use std::collections::BTreeSet;
use std::sync::Arc;

use gmc_core::{
    CapabilityDescriptor, DistanceParam, DistanceParams, ErrorInfo, EvalContext, GmcError,
    IntensityMeasure, Prediction, RuptureParams, SiteParams, TectonicRegion, UncertaintyType,
};
use ndarray::Zip;
use tracing::debug;

use crate::set::{merge_descriptors, WeightedModelSet};
use crate::shape::FlatInputs;

/// Far-field set and the distance (km) beyond which it replaces the near-field set.
#[derive(Debug, Clone)]
pub struct FarField {
    /// Set used strictly beyond `cutoff`.
    pub set: Arc<WeightedModelSet>,
    /// Switch distance in km.
    pub cutoff: f64,
}

/// Model that switches from a near-field to a far-field set at a cutoff distance.
///
/// The switch is hard: sites with `distance > cutoff` take the far-field mean
/// and standard deviations, all others the near-field ones.
#[derive(Debug)]
pub struct DistanceBlendedModel {
    name: String,
    near: Arc<WeightedModelSet>,
    far: Option<FarField>,
    distance_field: DistanceParam,
    descriptor: CapabilityDescriptor,
}

impl DistanceBlendedModel {
    /// Creates a blended model switching on Joyner-Boore distance.
    pub fn new(
        name: impl Into<String>,
        near: Arc<WeightedModelSet>,
        far: Option<FarField>,
    ) -> Result<Self, GmcError> {
        let name = name.into();
        if let Some(far) = &far {
            if !far.cutoff.is_finite() || far.cutoff < 0.0 {
                return Err(GmcError::Config(
                    ErrorInfo::new("distance_cutoff", "cutoff must be a finite, non-negative distance")
                        .with_context("model", name.as_str())
                        .with_context("cutoff", far.cutoff.to_string()),
                ));
            }
            if far.set.convention() != near.convention() {
                return Err(GmcError::Config(
                    ErrorInfo::new("blend_convention", "near and far sets must share an output convention")
                        .with_context("model", name.as_str())
                        .with_context("near", near.convention().as_str())
                        .with_context("far", far.set.convention().as_str()),
                ));
            }
        }
        let descriptor = blended_descriptor(&near, far.as_ref(), DistanceParam::Rjb);
        Ok(Self {
            name,
            near,
            far,
            distance_field: DistanceParam::Rjb,
            descriptor,
        })
    }

    /// Wraps a single set with no far-field switch.
    pub fn near_only(name: impl Into<String>, near: Arc<WeightedModelSet>) -> Self {
        let descriptor = blended_descriptor(&near, None, DistanceParam::Rjb);
        Self {
            name: name.into(),
            near,
            far: None,
            distance_field: DistanceParam::Rjb,
            descriptor,
        }
    }

    /// Switches on `field` instead of Joyner-Boore distance.
    pub fn with_distance_field(mut self, field: DistanceParam) -> Self {
        self.distance_field = field;
        self.descriptor = blended_descriptor(&self.near, self.far.as_ref(), field);
        self
    }

    /// Name used in logs and error context.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Near-field set.
    pub fn near(&self) -> &WeightedModelSet {
        &self.near
    }

    /// Far-field set and cutoff, if configured.
    pub fn far(&self) -> Option<&FarField> {
        self.far.as_ref()
    }

    /// Distance measure compared against the cutoff.
    pub fn distance_field(&self) -> DistanceParam {
        self.distance_field
    }

    /// Derived descriptor covering both sets.
    pub fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    /// Evaluates both sets and switches per site; outputs keep the input shape.
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
        let mut near = self.near.evaluate_flat(ctx, measure, uncertainty_types)?;
        let Some(far) = &self.far else {
            return Ok(near);
        };
        let distance = ctx.distances.values(self.distance_field, ctx.len)?.into_dyn();
        let cutoff = far.cutoff;
        let switched = distance.iter().filter(|d| **d > cutoff).count();
        debug!(model = %self.name, cutoff, switched, sites = ctx.len, "distance switch");
        if switched == 0 {
            return Ok(near);
        }

        let far_prediction = far.set.evaluate_flat(ctx, measure, uncertainty_types)?;
        Zip::from(&mut near.mean)
            .and(&far_prediction.mean)
            .and(&distance)
            .for_each(|value, &far_value, &d| {
                if d > cutoff {
                    *value = far_value;
                }
            });
        for (kind, sd) in near.stddevs.iter_mut() {
            if let Some(far_sd) = far_prediction.stddevs.get(kind) {
                Zip::from(sd).and(far_sd).and(&distance).for_each(|value, &far_value, &d| {
                    if d > cutoff {
                        *value = far_value;
                    }
                });
            }
        }
        Ok(near)
    }
}

fn blended_descriptor(
    near: &WeightedModelSet,
    far: Option<&FarField>,
    field: DistanceParam,
) -> CapabilityDescriptor {
    let region = match far {
        Some(far) if far.set.tectonic_region() != near.tectonic_region() => TectonicRegion::Mixed,
        _ => near.tectonic_region(),
    };
    let mut descriptor = merge_descriptors(
        region,
        near.convention(),
        std::iter::once(near.descriptor()).chain(far.map(|far| far.set.descriptor())),
    );
    if far.is_some() {
        descriptor.required_distance.insert(field);
    }
    descriptor
}
