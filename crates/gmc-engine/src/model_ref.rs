use std::sync::Arc;

use gmc_core::{
    CapabilityDescriptor, DistanceParams, EvalContext, GmcError, GroundMotionModel,
    IntensityMeasure, Prediction, RuptureParams, SiteParams, UncertaintyType,
};

use crate::blend::DistanceBlendedModel;
use crate::depth::with_depth_parameter;
use crate::set::WeightedModelSet;
use crate::shape::FlatInputs;

/// A node of a composite model tree.
///
/// Leaves are primitive models; `Set` and `Blended` nodes are composites that
/// are evaluated recursively with the same contract.
#[derive(Debug, Clone)]
pub enum ModelRef {
    /// Primitive model.
    Leaf(Arc<dyn GroundMotionModel>),
    /// Weighted set of models.
    Set(Arc<WeightedModelSet>),
    /// Near/far distance-switched pair of sets.
    Blended(Arc<DistanceBlendedModel>),
}

impl ModelRef {
    /// Wraps a primitive model.
    pub fn leaf(model: impl GroundMotionModel + 'static) -> Self {
        ModelRef::Leaf(Arc::new(model))
    }

    /// Wraps a weighted set.
    pub fn set(set: WeightedModelSet) -> Self {
        ModelRef::Set(Arc::new(set))
    }

    /// Wraps a distance-blended model.
    pub fn blended(model: DistanceBlendedModel) -> Self {
        ModelRef::Blended(Arc::new(model))
    }

    /// Name of the node.
    pub fn name(&self) -> &str {
        match self {
            ModelRef::Leaf(model) => model.name(),
            ModelRef::Set(set) => set.name(),
            ModelRef::Blended(model) => model.name(),
        }
    }

    /// Capability descriptor of the node. Composites expose a derived descriptor.
    pub fn descriptor(&self) -> &CapabilityDescriptor {
        match self {
            ModelRef::Leaf(model) => model.descriptor(),
            ModelRef::Set(set) => set.descriptor(),
            ModelRef::Blended(model) => model.descriptor(),
        }
    }

    /// Evaluates the node, returning arrays in the shape of the inputs.
    pub fn evaluate(
        &self,
        sites: &SiteParams,
        rupture: &RuptureParams,
        distances: &DistanceParams,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError> {
        match self {
            ModelRef::Set(set) => set.evaluate(sites, rupture, distances, measure, uncertainty_types),
            ModelRef::Blended(model) => {
                model.evaluate(sites, rupture, distances, measure, uncertainty_types)
            }
            ModelRef::Leaf(_) => {
                let flat = FlatInputs::new(sites, rupture, distances)?;
                let prediction = self.evaluate_flat(&flat.context(), measure, uncertainty_types)?;
                flat.restore(prediction)
            }
        }
    }

    pub(crate) fn evaluate_flat(
        &self,
        ctx: &EvalContext<'_>,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError> {
        match self {
            ModelRef::Leaf(model) => match model.descriptor().depth_relation {
                Some(relation) => {
                    let sites = with_depth_parameter(ctx.sites, relation)?;
                    let ctx = EvalContext {
                        sites: &sites,
                        ..*ctx
                    };
                    model.mean_and_stddevs(&ctx, measure, uncertainty_types)
                }
                None => model.mean_and_stddevs(ctx, measure, uncertainty_types),
            },
            ModelRef::Set(set) => set.evaluate_flat(ctx, measure, uncertainty_types),
            ModelRef::Blended(model) => model.evaluate_flat(ctx, measure, uncertainty_types),
        }
    }
}

impl From<Arc<dyn GroundMotionModel>> for ModelRef {
    fn from(model: Arc<dyn GroundMotionModel>) -> Self {
        ModelRef::Leaf(model)
    }
}

impl From<WeightedModelSet> for ModelRef {
    fn from(set: WeightedModelSet) -> Self {
        ModelRef::set(set)
    }
}

impl From<DistanceBlendedModel> for ModelRef {
    fn from(model: DistanceBlendedModel) -> Self {
        ModelRef::blended(model)
    }
}
