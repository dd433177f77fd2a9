//! Named model-set definitions, including the NSHMP 2014 sets.

use serde::{Deserialize, Serialize};

/// Declarative weighted set: model names, weights and the optional far-field split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDefinition {
    /// Set name.
    pub name: String,
    /// Registry names of the members.
    pub models: Vec<String>,
    /// Near-field weights, parallel to `models`.
    pub weights: Vec<f64>,
    /// Far-field weights, parallel to `models`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub far_weights: Option<Vec<f64>>,
    /// Distance (km) beyond which the far-field weights apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_km: Option<f64>,
    /// Registry names of the default site-term models.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub site_models: Vec<String>,
    /// Weights of the default site-term models; equal when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_weights: Option<Vec<f64>>,
}

fn names(models: &[&str]) -> Vec<String> {
    models.iter().map(|model| model.to_string()).collect()
}

/// Names of the built-in sets.
pub const BUILTIN_SETS: [&str; 5] = [
    "nshmp14_acr",
    "nshmp14_scr_rlme",
    "nshmp14_scr_grd",
    "nshmp14_sub_i",
    "nshmp14_sub_s",
];

const SCR_FAR_WEIGHTS: [f64; 9] = [0.16, 0.0, 0.0, 0.17, 0.17, 0.3, 0.2, 0.0, 0.0];
const SCR_CUTOFF_KM: f64 = 500.0;

fn scr_models(pezeshk: &str) -> Vec<String> {
    names(&[
        "FrankelEtAl1996MwNSHMP2008",
        "ToroEtAl1997MwNSHMP2008",
        "SilvaEtAl2002MwNSHMP2008",
        "Campbell2003MwNSHMP2008",
        "TavakoliPezeshk2005MwNSHMP2008",
        "AtkinsonBoore2006Modified2011",
        pezeshk,
        "Atkinson2008prime",
        "SomervilleEtAl2001NSHMP2008",
    ])
}

/// Returns the built-in definition called `name`.
pub fn builtin_set(name: &str) -> Option<SetDefinition> {
    let definition = match name {
        "nshmp14_acr" => SetDefinition {
            name: name.to_string(),
            models: names(&[
                "AbrahamsonEtAl2014",
                "BooreEtAl2014",
                "CampbellBozorgnia2014",
                "ChiouYoungs2014",
            ]),
            weights: vec![0.25, 0.25, 0.25, 0.25],
            far_weights: None,
            cutoff_km: None,
            site_models: Vec::new(),
            site_weights: None,
        },
        "nshmp14_scr_rlme" => SetDefinition {
            name: name.to_string(),
            models: scr_models("PezeshkEtAl2011NEHRPBC"),
            weights: vec![0.06, 0.11, 0.06, 0.11, 0.11, 0.22, 0.15, 0.08, 0.1],
            far_weights: Some(SCR_FAR_WEIGHTS.to_vec()),
            cutoff_km: Some(SCR_CUTOFF_KM),
            site_models: names(&["AtkinsonBoore2006Modified2011"]),
            site_weights: None,
        },
        "nshmp14_scr_grd" => SetDefinition {
            name: name.to_string(),
            models: scr_models("PezeshkEtAl2011"),
            weights: vec![0.06, 0.13, 0.06, 0.13, 0.13, 0.25, 0.16, 0.08, 0.0],
            far_weights: Some(SCR_FAR_WEIGHTS.to_vec()),
            cutoff_km: Some(SCR_CUTOFF_KM),
            site_models: names(&["AtkinsonBoore2006Modified2011"]),
            site_weights: None,
        },
        "nshmp14_sub_i" => SetDefinition {
            name: name.to_string(),
            models: names(&[
                "AtkinsonBoore2003SInter",
                "ZhaoEtAl2006SInter",
                "AtkinsonMacias2009",
                "AbrahamsonEtAl2015SInter",
            ]),
            weights: vec![0.1, 0.3, 0.3, 0.3],
            far_weights: None,
            cutoff_km: None,
            site_models: names(&["AbrahamsonEtAl2015SInter", "AtkinsonBoore2003SInter"]),
            site_weights: None,
        },
        "nshmp14_sub_s" => SetDefinition {
            name: name.to_string(),
            models: names(&[
                "AtkinsonBoore2003SSlab",
                "AtkinsonBoore2003SSlabCascadia",
                "ZhaoEtAl2006SSlab",
                "AbrahamsonEtAl2015SSlab",
            ]),
            weights: vec![0.1667, 0.1666, 0.3333, 0.3334],
            far_weights: None,
            cutoff_km: None,
            site_models: Vec::new(),
            site_weights: None,
        },
        _ => return None,
    };
    Some(definition)
}

/// All built-in definitions, in [`BUILTIN_SETS`] order.
pub fn builtin_sets() -> Vec<SetDefinition> {
    BUILTIN_SETS.iter().filter_map(|name| builtin_set(name)).collect()
}
