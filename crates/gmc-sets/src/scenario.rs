//! Scenario documents: site, rupture and distance fields for one evaluation.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use gmc_core::{
    DistanceParam, DistanceParams, ErrorInfo, FieldValue, GmcError, ParamBundle, ParamKey,
    RuptureParam, RuptureParams, SiteParam, SiteParams,
};
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::serde::from_yaml_slice;

/// Field as written in a scenario: a scalar, a flat list, or a shaped grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    /// Same value at every site.
    Scalar(f64),
    /// One value per site.
    List(Vec<f64>),
    /// Row-major values with an explicit shape.
    Grid {
        /// Array shape.
        shape: Vec<usize>,
        /// Values in row-major order.
        values: Vec<f64>,
    },
}

impl FieldSpec {
    /// Converts to a bundle field value.
    pub fn to_field(&self, field: &str) -> Result<FieldValue, GmcError> {
        match self {
            FieldSpec::Scalar(value) => Ok(FieldValue::Scalar(*value)),
            FieldSpec::List(values) => Ok(FieldValue::from(values.clone())),
            FieldSpec::Grid { shape, values } => {
                ArrayD::from_shape_vec(IxDyn(shape), values.clone())
                    .map(FieldValue::Array)
                    .map_err(|err| {
                        GmcError::ShapeMismatch(
                            ErrorInfo::new("grid_shape", err.to_string())
                                .with_context("field", field)
                                .with_context("shape", format!("{shape:?}"))
                                .with_context("values", values.len().to_string()),
                        )
                    })
            }
        }
    }
}

/// Inputs of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Site fields keyed by parameter name.
    #[serde(default)]
    pub sites: BTreeMap<SiteParam, FieldSpec>,
    /// Rupture fields keyed by parameter name.
    #[serde(default)]
    pub rupture: BTreeMap<RuptureParam, FieldSpec>,
    /// Distance fields keyed by parameter name.
    #[serde(default)]
    pub distances: BTreeMap<DistanceParam, FieldSpec>,
}

fn bundle<K: ParamKey>(fields: &BTreeMap<K, FieldSpec>) -> Result<ParamBundle<K>, GmcError> {
    fields
        .iter()
        .try_fold(ParamBundle::new(), |bundle, (key, spec)| {
            Ok(bundle.with(*key, spec.to_field(key.as_str())?))
        })
}

impl Scenario {
    /// Builds the three parameter bundles.
    pub fn bundles(&self) -> Result<(SiteParams, RuptureParams, DistanceParams), GmcError> {
        Ok((
            bundle(&self.sites)?,
            bundle(&self.rupture)?,
            bundle(&self.distances)?,
        ))
    }
}

/// Loads a scenario file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, GmcError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        GmcError::Config(
            ErrorInfo::new("scenario_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    from_yaml_slice(&bytes).map_err(|err| err.with_context("path", path.display().to_string()))
}
