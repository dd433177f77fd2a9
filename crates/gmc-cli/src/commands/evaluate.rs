use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use gmc_core::{IntensityMeasure, UncertaintyType};
use gmc_sets::load_scenario;
use serde::Serialize;
use tracing::info;

use crate::{load_optional_config, write_output};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// YAML configuration defining models, sets and composites.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// YAML scenario with site, rupture and distance fields.
    #[arg(long)]
    pub scenario: PathBuf,
    /// Set or composite to evaluate; defaults to the configuration's selection.
    #[arg(long)]
    pub set: Option<String>,
    /// Intensity measure, e.g. PGA, PGV or SA(1.0).
    #[arg(long)]
    pub measure: IntensityMeasure,
    /// Comma separated uncertainty types.
    #[arg(long, value_delimiter = ',', default_value = "total")]
    pub uncertainty: Vec<UncertaintyType>,
    /// Keep members whose coefficient tables do not cover the measure.
    #[arg(long)]
    pub no_filter: bool,
    /// Write the JSON result here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EvaluationOutput {
    set: String,
    measure: String,
    config_hash: String,
    shape: Vec<usize>,
    mean: Vec<f64>,
    stddevs: BTreeMap<String, Vec<f64>>,
}

pub fn run(args: &EvaluateArgs) -> Result<(), Box<dyn Error>> {
    let config = load_optional_config(args.config.as_deref())?;
    let name = match &args.set {
        Some(name) => name.clone(),
        None => config.default_name()?,
    };
    let filter_measure = (!args.no_filter).then_some(args.measure);
    let model = config.resolve(&name, filter_measure)?;

    let scenario = load_scenario(&args.scenario)?;
    let (sites, rupture, distances) = scenario.bundles()?;
    let prediction = model.evaluate(&sites, &rupture, &distances, args.measure, &args.uncertainty)?;
    info!(set = %name, measure = %args.measure, sites = prediction.mean.len(), "evaluated");

    let output = EvaluationOutput {
        set: name,
        measure: args.measure.to_string(),
        config_hash: config.config_hash()?,
        shape: prediction.shape().to_vec(),
        mean: prediction.mean.iter().copied().collect(),
        stddevs: prediction
            .stddevs
            .iter()
            .map(|(kind, values)| (kind.as_str().to_string(), values.iter().copied().collect()))
            .collect(),
    };
    let json = gmc_sets::serde::to_canonical_json_pretty(&output)?;
    write_output(args.out.as_ref(), &json)
}
