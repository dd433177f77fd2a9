use std::error::Error;
use std::process::Command;

use clap::Args;
use gmc_sets::BUILTIN_SETS;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Emit extended metadata including the git commit and built-in sets.
    #[arg(long)]
    pub long: bool,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: String,
    git_commit: String,
    builtin_sets: Vec<String>,
}

pub fn run(args: &VersionArgs) -> Result<(), Box<dyn Error>> {
    if !args.long {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let git_commit = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".into());
    let info = VersionInfo {
        version: env!("CARGO_PKG_VERSION").into(),
        git_commit,
        builtin_sets: BUILTIN_SETS.iter().map(|name| name.to_string()).collect(),
    };
    println!("{}", gmc_sets::serde::to_canonical_json_pretty(&info)?);
    Ok(())
}
