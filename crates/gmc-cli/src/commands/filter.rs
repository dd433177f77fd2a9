use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use gmc_core::IntensityMeasure;
use gmc_engine::{filter_models, ModelRef};

use crate::load_optional_config;

#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Configuration providing the registry of models.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Set definition to filter.
    #[arg(long)]
    pub set: String,
    /// Intensity measure, e.g. PGA, PGV or SA(1.0).
    #[arg(long)]
    pub measure: IntensityMeasure,
}

fn print_kept(label: &str, models: &[ModelRef], weights: &[f64]) {
    println!("{label}:");
    for (model, weight) in models.iter().zip(weights) {
        println!("  {}={weight:.6}", model.name());
    }
}

pub fn run(args: &FilterArgs) -> Result<(), Box<dyn Error>> {
    let config = load_optional_config(args.config.as_deref())?;
    let definition = config
        .definition(&args.set)
        .ok_or_else(|| format!("no set definition named '{}'", args.set))?;
    let registry = config.registry()?;
    let models = registry.create_all(&definition.models)?;

    let (near, near_weights) = filter_models(&models, &definition.weights, &args.measure)?;
    print_kept("near", &near, &near_weights);
    if let Some(far_weights) = &definition.far_weights {
        let (far, far_weights) = filter_models(&models, far_weights, &args.measure)?;
        print_kept("far", &far, &far_weights);
    }
    Ok(())
}
