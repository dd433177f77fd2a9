#![deny(missing_docs)]
#![doc = "Core types for composite ground-motion models: the error surface, intensity measures, capability descriptors, parameter bundles and the model trait consumed by the combination engine."]

pub mod descriptor;
pub mod errors;
/// Intensity measures.
pub mod measure;
mod model;
pub mod params;
mod types;

pub use descriptor::{CapabilityDescriptor, CoefficientTable, DepthRelation};
pub use errors::{ErrorInfo, GmcError};
pub use measure::{IntensityMeasure, MeasureKind, PGV_PROXY_PERIOD};
pub use model::{EvalContext, GroundMotionModel, Prediction};
pub use params::{
    DistanceParam, DistanceParams, FieldValue, ParamBundle, ParamKey, RuptureParam,
    RuptureParams, SiteParam, SiteParams,
};
pub use types::{ComponentConvention, TectonicRegion, UncertaintyType, VariancePolicy};
