#![deny(missing_docs)]
#![doc = "Combination engine for composite ground-motion models: weighted sets, site-term resolution, period filtering, distance switching and nested composites."]

pub mod blend;
mod combine;
pub mod depth;
pub mod filter;
mod model_ref;
mod set;
pub mod shape;
mod site;

pub use blend::{DistanceBlendedModel, FarField};
pub use combine::{variance_to_stddev, VARIANCE_ROUNDOFF};
pub use depth::{depth_from_vs30, with_depth_parameter};
pub use filter::{filter_models, is_applicable, model_applicable};
pub use model_ref::ModelRef;
pub use set::{
    check_weights, equal_weights, WeightedModelSet, WeightedModelSetBuilder,
    DEFAULT_REFERENCE_VS30, WEIGHT_TOLERANCE,
};
pub use shape::common_shape;
pub use site::reference_sites;
