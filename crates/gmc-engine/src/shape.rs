//! Shape validation, flattening and restoration of per-site arrays.

use gmc_core::{
    DistanceParams, ErrorInfo, EvalContext, GmcError, ParamBundle, ParamKey, Prediction,
    RuptureParams, SiteParams,
};
use ndarray::{ArrayD, IxDyn};

fn shape_label(shape: &[usize]) -> String {
    format!("{shape:?}")
}

fn push_shapes<'a, K: ParamKey>(
    bundle: &'a ParamBundle<K>,
    out: &mut Vec<(&'static str, &'a [usize])>,
) {
    out.extend(bundle.array_shapes().map(|(key, shape)| (key.as_str(), shape)));
}

/// Returns the shape shared by every computational array field of the three bundles.
///
/// Coordinates are ignored. When no field is array valued the shape is empty
/// (a single site).
pub fn common_shape(
    sites: &SiteParams,
    rupture: &RuptureParams,
    distances: &DistanceParams,
) -> Result<Vec<usize>, GmcError> {
    let mut shapes = Vec::new();
    push_shapes(sites, &mut shapes);
    push_shapes(rupture, &mut shapes);
    push_shapes(distances, &mut shapes);

    let Some((first_field, expected)) = shapes.first().copied() else {
        return Ok(Vec::new());
    };
    for (field, shape) in shapes.iter().skip(1) {
        if *shape != expected {
            return Err(GmcError::ShapeMismatch(
                ErrorInfo::new(
                    "shape_mismatch",
                    "site, rupture and distance arrays must share one shape",
                )
                .with_context("field", *field)
                .with_context("shape", shape_label(shape))
                .with_context("expected_field", first_field)
                .with_context("expected_shape", shape_label(expected)),
            ));
        }
    }
    Ok(expected.to_vec())
}

/// Reshapes `values` to `shape`, keeping logical element order.
pub fn reshape(values: &ArrayD<f64>, shape: &[usize]) -> Result<ArrayD<f64>, GmcError> {
    ArrayD::from_shape_vec(IxDyn(shape), values.iter().copied().collect()).map_err(|err| {
        GmcError::ShapeMismatch(
            ErrorInfo::new("reshape", err.to_string())
                .with_context("from", shape_label(values.shape()))
                .with_context("to", shape_label(shape)),
        )
    })
}

/// Checks that a member output holds `len` values and returns it as a 1-D array.
pub(crate) fn as_flat(values: ArrayD<f64>, len: usize, model: &str) -> Result<ArrayD<f64>, GmcError> {
    if values.len() != len {
        return Err(GmcError::ShapeMismatch(
            ErrorInfo::new("member_output_length", "model returned the wrong number of values")
                .with_context("model", model)
                .with_context("expected", len.to_string())
                .with_context("actual", values.len().to_string()),
        ));
    }
    if values.ndim() == 1 {
        return Ok(values);
    }
    reshape(&values, &[len])
}

fn flatten<K: ParamKey>(bundle: &ParamBundle<K>, len: usize) -> Result<ParamBundle<K>, GmcError> {
    bundle.map_arrays(|_, values| reshape(values, &[len]))
}

/// Flattened copies of the three bundles with the shape they came in.
#[derive(Debug, Clone)]
pub(crate) struct FlatInputs {
    pub(crate) sites: SiteParams,
    pub(crate) rupture: RuptureParams,
    pub(crate) distances: DistanceParams,
    pub(crate) shape: Vec<usize>,
    pub(crate) len: usize,
}

impl FlatInputs {
    pub(crate) fn new(
        sites: &SiteParams,
        rupture: &RuptureParams,
        distances: &DistanceParams,
    ) -> Result<Self, GmcError> {
        let shape = common_shape(sites, rupture, distances)?;
        let len = shape.iter().product();
        Ok(Self {
            sites: flatten(sites, len)?,
            rupture: flatten(rupture, len)?,
            distances: flatten(distances, len)?,
            shape,
            len,
        })
    }

    pub(crate) fn context(&self) -> EvalContext<'_> {
        EvalContext {
            sites: &self.sites,
            rupture: &self.rupture,
            distances: &self.distances,
            len: self.len,
        }
    }

    /// Restores the original shape on the mean and every standard deviation.
    pub(crate) fn restore(&self, prediction: Prediction) -> Result<Prediction, GmcError> {
        let mean = reshape(&prediction.mean, &self.shape)?;
        let stddevs = prediction
            .stddevs
            .iter()
            .map(|(kind, values)| Ok((*kind, reshape(values, &self.shape)?)))
            .collect::<Result<_, GmcError>>()?;
        Ok(Prediction { mean, stddevs })
    }
}
