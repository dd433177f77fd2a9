//! Site, rupture and distance parameter bundles.
//!
//! Bundles are immutable values keyed by a closed set of parameter names.
//! Every transformation returns a new bundle; nothing is reshaped in place.

use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};

use ndarray::{Array, Array1, ArrayD, Dimension};
use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, GmcError};

/// Behaviour shared by the enumerated parameter names.
pub trait ParamKey: Copy + Ord + Debug + Display + Send + Sync + 'static {
    /// Canonical lower-case label.
    fn as_str(&self) -> &'static str;

    /// Descriptive fields (coordinates) are excluded from the shape invariant.
    fn is_descriptive(&self) -> bool {
        false
    }
}

/// Site parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteParam {
    /// Time-averaged shear-wave velocity of the top 30 m (m/s).
    Vs30,
    /// 1.0 where vs30 was measured, 0.0 where inferred.
    Vs30Measured,
    /// Depth to the 1.0 km/s shear-wave horizon (m).
    Z1pt0,
    /// Depth to the 2.5 km/s shear-wave horizon (km).
    Z2pt5,
    /// 1.0 for backarc sites.
    Backarc,
    /// Site longitude (descriptive).
    Lons,
    /// Site latitude (descriptive).
    Lats,
}

impl ParamKey for SiteParam {
    fn as_str(&self) -> &'static str {
        match self {
            SiteParam::Vs30 => "vs30",
            SiteParam::Vs30Measured => "vs30_measured",
            SiteParam::Z1pt0 => "z1pt0",
            SiteParam::Z2pt5 => "z2pt5",
            SiteParam::Backarc => "backarc",
            SiteParam::Lons => "lons",
            SiteParam::Lats => "lats",
        }
    }

    fn is_descriptive(&self) -> bool {
        matches!(self, SiteParam::Lons | SiteParam::Lats)
    }
}

/// Rupture parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuptureParam {
    /// Moment magnitude.
    Mag,
    /// Rake angle (degrees).
    Rake,
    /// Dip angle (degrees).
    Dip,
    /// Depth to the top of rupture (km).
    Ztor,
    /// Hypocentral depth (km).
    HypoDepth,
    /// Down-dip rupture width (km).
    Width,
}

impl ParamKey for RuptureParam {
    fn as_str(&self) -> &'static str {
        match self {
            RuptureParam::Mag => "mag",
            RuptureParam::Rake => "rake",
            RuptureParam::Dip => "dip",
            RuptureParam::Ztor => "ztor",
            RuptureParam::HypoDepth => "hypo_depth",
            RuptureParam::Width => "width",
        }
    }
}

/// Source-to-site distance measures (km).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceParam {
    /// Closest distance to the rupture surface.
    Rrup,
    /// Joyner-Boore distance.
    Rjb,
    /// Horizontal distance perpendicular to strike.
    Rx,
    /// Horizontal distance off the rupture end.
    Ry0,
    /// Hypocentral distance.
    Rhypo,
    /// Epicentral distance.
    Repi,
}

impl ParamKey for DistanceParam {
    fn as_str(&self) -> &'static str {
        match self {
            DistanceParam::Rrup => "rrup",
            DistanceParam::Rjb => "rjb",
            DistanceParam::Rx => "rx",
            DistanceParam::Ry0 => "ry0",
            DistanceParam::Rhypo => "rhypo",
            DistanceParam::Repi => "repi",
        }
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(SiteParam, RuptureParam, DistanceParam);

/// Value of a single named field: one scalar for all sites, or one value per site.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Same value at every site.
    Scalar(f64),
    /// Per-site values in an arbitrary shape.
    Array(ArrayD<f64>),
}

impl FieldValue {
    /// Returns the array shape, or `None` for scalars.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            FieldValue::Scalar(_) => None,
            FieldValue::Array(values) => Some(values.shape()),
        }
    }

    /// Applies `f` elementwise, preserving the scalar/array form.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> FieldValue {
        match self {
            FieldValue::Scalar(value) => FieldValue::Scalar(f(*value)),
            FieldValue::Array(values) => FieldValue::Array(values.mapv(f)),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Scalar(value)
    }
}

impl<D: Dimension> From<Array<f64, D>> for FieldValue {
    fn from(values: Array<f64, D>) -> Self {
        FieldValue::Array(values.into_dyn())
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(values: Vec<f64>) -> Self {
        FieldValue::Array(Array1::from(values).into_dyn())
    }
}

/// Mapping from enumerated parameter names to field values.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamBundle<K: ParamKey> {
    fields: BTreeMap<K, FieldValue>,
}

/// Site parameter bundle.
pub type SiteParams = ParamBundle<SiteParam>;
/// Rupture parameter bundle.
pub type RuptureParams = ParamBundle<RuptureParam>;
/// Distance parameter bundle.
pub type DistanceParams = ParamBundle<DistanceParam>;

impl<K: ParamKey> Default for ParamBundle<K> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<K: ParamKey> ParamBundle<K> {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a bundle with `key` set to `value`, replacing any previous value.
    pub fn with(mut self, key: K, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key, value.into());
        self
    }

    /// Returns a copy of this bundle with `key` set to `value`.
    pub fn replaced(&self, key: K, value: impl Into<FieldValue>) -> Self {
        self.clone().with(key, value)
    }

    /// Returns a copy of this bundle without `key`.
    pub fn without(&self, key: K) -> Self {
        let mut fields = self.fields.clone();
        fields.remove(&key);
        Self { fields }
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: K) -> Option<&FieldValue> {
        self.fields.get(&key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: K) -> bool {
        self.fields.contains_key(&key)
    }

    /// Iterates over all fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &FieldValue)> + '_ {
        self.fields.iter().map(|(key, value)| (*key, value))
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the bundle holds no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the shapes of the computational (non-descriptive) array fields.
    pub fn array_shapes(&self) -> impl Iterator<Item = (K, &[usize])> + '_ {
        self.fields
            .iter()
            .filter(|(key, _)| !key.is_descriptive())
            .filter_map(|(key, value)| value.shape().map(|shape| (*key, shape)))
    }

    /// Returns a new bundle where every computational array field has been
    /// passed through `reshape`. Scalars and descriptive fields are copied.
    pub fn map_arrays<F>(&self, mut reshape: F) -> Result<Self, GmcError>
    where
        F: FnMut(K, &ArrayD<f64>) -> Result<ArrayD<f64>, GmcError>,
    {
        let mut fields = BTreeMap::new();
        for (key, value) in &self.fields {
            let mapped = match value {
                FieldValue::Array(values) if !key.is_descriptive() => {
                    FieldValue::Array(reshape(*key, values)?)
                }
                other => other.clone(),
            };
            fields.insert(*key, mapped);
        }
        Ok(Self { fields })
    }

    /// Returns the flattened per-site values of `key`, broadcasting scalars to `len`.
    ///
    /// Fails with [`GmcError::MissingParameter`] when the field is absent and with
    /// [`GmcError::ShapeMismatch`] when an array does not hold `len` values.
    pub fn values(&self, key: K, len: usize) -> Result<Array1<f64>, GmcError> {
        match self.fields.get(&key) {
            None => Err(GmcError::MissingParameter(
                ErrorInfo::new("missing_parameter", format!("field '{key}' is required"))
                    .with_context("field", key.as_str()),
            )),
            Some(FieldValue::Scalar(value)) => Ok(Array1::from_elem(len, *value)),
            Some(FieldValue::Array(values)) => {
                if values.len() != len {
                    return Err(GmcError::ShapeMismatch(
                        ErrorInfo::new(
                            "field_length",
                            format!("field '{key}' holds {} values, expected {len}", values.len()),
                        )
                        .with_context("field", key.as_str()),
                    ));
                }
                Ok(values.iter().copied().collect())
            }
        }
    }

    /// Returns the scalar value of `key`, failing if it is absent or array valued.
    pub fn scalar(&self, key: K) -> Result<f64, GmcError> {
        match self.fields.get(&key) {
            Some(FieldValue::Scalar(value)) => Ok(*value),
            Some(FieldValue::Array(_)) => Err(GmcError::ShapeMismatch(
                ErrorInfo::new("expected_scalar", format!("field '{key}' must be a scalar"))
                    .with_context("field", key.as_str()),
            )),
            None => Err(GmcError::MissingParameter(
                ErrorInfo::new("missing_parameter", format!("field '{key}' is required"))
                    .with_context("field", key.as_str()),
            )),
        }
    }
}
