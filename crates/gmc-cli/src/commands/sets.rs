use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use gmc_sets::SetDefinition;

use crate::load_optional_config;

#[derive(Args, Debug)]
pub struct SetsArgs {
    /// Optional configuration whose sets and composites are listed first.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn format_weights(models: &[String], weights: &[f64]) -> String {
    models
        .iter()
        .zip(weights)
        .map(|(model, weight)| format!("{model}={weight}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_definition(definition: &SetDefinition) {
    println!("{}", definition.name);
    println!("  near: {}", format_weights(&definition.models, &definition.weights));
    if let (Some(far), Some(cutoff)) = (&definition.far_weights, definition.cutoff_km) {
        println!("  far (> {cutoff} km): {}", format_weights(&definition.models, far));
    }
    if !definition.site_models.is_empty() {
        println!("  site: {}", definition.site_models.join(" "));
    }
}

pub fn run(args: &SetsArgs) -> Result<(), Box<dyn Error>> {
    let config = load_optional_config(args.config.as_deref())?;
    for name in config.set_names() {
        if let Some(composite) = config.composite(&name) {
            println!("{name} (composite)");
            for member in &composite.members {
                println!("  {}={}", member.set, member.weight);
            }
        } else if let Some(definition) = config.definition(&name) {
            print_definition(&definition);
        }
    }
    Ok(())
}
