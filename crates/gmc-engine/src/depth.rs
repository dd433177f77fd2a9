//! Basin-depth parameters derived from vs30.

use gmc_core::{DepthRelation, ErrorInfo, GmcError, ParamKey, SiteParam, SiteParams};

fn z1pt0_cy08(vs30: f64) -> f64 {
    (28.5 - 3.82 / 8.0 * (vs30.powi(8) + 378.7_f64.powi(8)).ln()).exp()
}

/// Evaluates `relation` at a single vs30 (m/s).
///
/// z1.0 values are returned in metres, z2.5 values in kilometres.
pub fn depth_from_vs30(relation: DepthRelation, vs30: f64) -> f64 {
    match relation {
        DepthRelation::Ask14California => {
            let num = vs30.powi(4) + 610.0_f64.powi(4);
            let den = 1360.0_f64.powi(4) + 610.0_f64.powi(4);
            (-7.67 / 4.0 * (num / den).ln()).exp()
        }
        DepthRelation::Cy14California => {
            let num = vs30.powi(4) + 571.0_f64.powi(4);
            let den = 1360.0_f64.powi(4) + 571.0_f64.powi(4);
            (-7.15 / 4.0 * (num / den).ln()).exp()
        }
        DepthRelation::Cb14California => (7.089 - 1.144 * vs30.ln()).exp(),
        DepthRelation::Cy08 => z1pt0_cy08(vs30),
        DepthRelation::Cb07 => 0.519 + 3.595 * z1pt0_cy08(vs30) / 1000.0,
    }
}

/// Returns a new site bundle carrying the parameter produced by `relation`.
pub fn with_depth_parameter(
    sites: &SiteParams,
    relation: DepthRelation,
) -> Result<SiteParams, GmcError> {
    let vs30 = sites.get(SiteParam::Vs30).ok_or_else(|| {
        GmcError::MissingParameter(
            ErrorInfo::new("missing_parameter", "vs30 is needed to derive basin depth")
                .with_context("field", SiteParam::Vs30.as_str())
                .with_context("relation", format!("{relation:?}")),
        )
    })?;
    let depth = vs30.map(|value| depth_from_vs30(relation, value));
    Ok(sites.replaced(relation.target(), depth))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_rock_depths_are_plausible() {
        let ask = depth_from_vs30(DepthRelation::Ask14California, 760.0);
        let cy = depth_from_vs30(DepthRelation::Cy14California, 760.0);
        assert!(ask > 20.0 && ask < 100.0, "ask14 z1.0 = {ask}");
        assert!(cy > 20.0 && cy < 100.0, "cy14 z1.0 = {cy}");
        let cb = depth_from_vs30(DepthRelation::Cb14California, 760.0);
        assert!(cb > 0.5 && cb < 1.0, "cb14 z2.5 = {cb}");
    }

    #[test]
    fn softer_sites_are_deeper() {
        for relation in [
            DepthRelation::Ask14California,
            DepthRelation::Cy14California,
            DepthRelation::Cb14California,
            DepthRelation::Cy08,
            DepthRelation::Cb07,
        ] {
            assert!(depth_from_vs30(relation, 250.0) > depth_from_vs30(relation, 760.0));
        }
    }
}
