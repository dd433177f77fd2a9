//! YAML configuration of model sets and nested composites.

use std::fs;
use std::path::Path;

use gmc_core::{ComponentConvention, ErrorInfo, GmcError, IntensityMeasure, VariancePolicy};
use gmc_engine::{ModelRef, WeightedModelSet, DEFAULT_REFERENCE_VS30};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assemble::{assemble_definition, AssemblyOptions};
use crate::catalog::{builtin_set, SetDefinition, BUILTIN_SETS};
use crate::hash::stable_hash_string;
use crate::registry::ModelRegistry;
use crate::serde::{from_yaml_slice, to_yaml_string};
use crate::table::TableModelSpec;

fn config_error(code: &str, message: impl Into<String>) -> GmcError {
    GmcError::Config(ErrorInfo::new(code, message))
}

/// Member of a composite: a set name and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeMember {
    /// Name of a configured set, built-in set or other composite.
    pub set: String,
    /// Weight of the member.
    pub weight: f64,
}

/// Weighted combination of named sets, possibly spanning tectonic regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    /// Composite name.
    pub name: String,
    /// Weighted members.
    pub members: Vec<CompositeMember>,
}

/// Top-level configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    /// Output component convention of every assembled set.
    #[serde(default)]
    pub output_convention: ComponentConvention,
    /// Reference vs30 (m/s) for site factors.
    #[serde(default = "CompositeConfig::default_reference_vs30")]
    pub reference_vs30: f64,
    /// Variance clamping behaviour.
    #[serde(default)]
    pub variance_policy: VariancePolicy,
    /// Inline coefficient-table models, registered by name.
    #[serde(default)]
    pub models: Vec<TableModelSpec>,
    /// Named set definitions.
    #[serde(default)]
    pub model_sets: Vec<SetDefinition>,
    /// Weighted combinations of named sets.
    #[serde(default)]
    pub composites: Vec<CompositeSpec>,
    /// Name resolved when the caller does not pick one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<String>,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            output_convention: ComponentConvention::default(),
            reference_vs30: DEFAULT_REFERENCE_VS30,
            variance_policy: VariancePolicy::default(),
            models: Vec::new(),
            model_sets: Vec::new(),
            composites: Vec::new(),
            select: None,
        }
    }
}

impl CompositeConfig {
    fn default_reference_vs30() -> f64 {
        DEFAULT_REFERENCE_VS30
    }

    /// Parses a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, GmcError> {
        from_yaml_slice(text.as_bytes())
    }

    /// Serializes the configuration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, GmcError> {
        to_yaml_string(self)
    }

    /// Stable fingerprint of the configuration contents.
    pub fn config_hash(&self) -> Result<String, GmcError> {
        stable_hash_string(self)
    }

    /// Assembly options derived from the top-level settings.
    pub fn options(&self) -> AssemblyOptions {
        AssemblyOptions {
            convention: self.output_convention,
            reference_vs30: self.reference_vs30,
            variance_policy: self.variance_policy,
        }
    }

    /// Registry holding every inline model.
    pub fn registry(&self) -> Result<ModelRegistry, GmcError> {
        let mut registry = ModelRegistry::new();
        for spec in &self.models {
            registry.register_table(spec.clone())?;
        }
        Ok(registry)
    }

    /// Configured sets, composites and built-in sets, in that order.
    pub fn set_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.model_sets.iter().map(|set| set.name.clone()).collect();
        names.extend(self.composites.iter().map(|composite| composite.name.clone()));
        names.extend(
            BUILTIN_SETS
                .iter()
                .filter(|name| !self.model_sets.iter().any(|set| set.name == **name))
                .map(|name| name.to_string()),
        );
        names
    }

    /// Looks up a set definition, preferring configured sets over built-in ones.
    pub fn definition(&self, name: &str) -> Option<SetDefinition> {
        self.model_sets
            .iter()
            .find(|set| set.name == name)
            .cloned()
            .or_else(|| builtin_set(name))
    }

    /// Looks up a composite by name.
    pub fn composite(&self, name: &str) -> Option<&CompositeSpec> {
        self.composites.iter().find(|composite| composite.name == name)
    }

    /// Name to resolve when the caller gives none: `select`, else the only set or composite.
    pub fn default_name(&self) -> Result<String, GmcError> {
        if let Some(select) = &self.select {
            return Ok(select.clone());
        }
        let mut configured = self
            .model_sets
            .iter()
            .map(|set| set.name.as_str())
            .chain(self.composites.iter().map(|composite| composite.name.as_str()));
        match (configured.next(), configured.next()) {
            (Some(only), None) => Ok(only.to_string()),
            _ => Err(config_error(
                "no_selection",
                "configuration does not select a set; pass one explicitly",
            )),
        }
    }

    /// Builds the model called `name` using the configuration's registry.
    pub fn resolve(
        &self,
        name: &str,
        measure: Option<IntensityMeasure>,
    ) -> Result<ModelRef, GmcError> {
        let registry = self.registry()?;
        self.resolve_with(name, &registry, measure)
    }

    /// Builds the model called `name` with an explicit registry.
    pub fn resolve_with(
        &self,
        name: &str,
        registry: &ModelRegistry,
        measure: Option<IntensityMeasure>,
    ) -> Result<ModelRef, GmcError> {
        let mut stack = Vec::new();
        self.resolve_inner(name, registry, measure, &mut stack)
    }

    fn resolve_inner(
        &self,
        name: &str,
        registry: &ModelRegistry,
        measure: Option<IntensityMeasure>,
        stack: &mut Vec<String>,
    ) -> Result<ModelRef, GmcError> {
        if stack.iter().any(|entry| entry == name) {
            return Err(GmcError::Config(
                ErrorInfo::new("composite_cycle", "composite refers back to itself")
                    .with_context("set", name)
                    .with_context("path", stack.join(" -> ")),
            ));
        }
        if let Some(composite) = self.composite(name) {
            stack.push(name.to_string());
            let resolved = self.resolve_composite(composite, registry, measure, stack);
            stack.pop();
            return resolved;
        }
        if let Some(definition) = self.definition(name) {
            debug!(set = name, "assembling set definition");
            let model = assemble_definition(&definition, registry, measure, &self.options())?;
            return Ok(ModelRef::blended(model));
        }
        Err(GmcError::InvalidModel(
            ErrorInfo::new("unknown_set", format!("no set or composite is named '{name}'"))
                .with_context("set", name)
                .with_hint(format!("known sets: {}", self.set_names().join(", "))),
        ))
    }

    fn resolve_composite(
        &self,
        composite: &CompositeSpec,
        registry: &ModelRegistry,
        measure: Option<IntensityMeasure>,
        stack: &mut Vec<String>,
    ) -> Result<ModelRef, GmcError> {
        let weights: Vec<f64> = composite.members.iter().map(|member| member.weight).collect();
        let mut members = Vec::with_capacity(composite.members.len());
        for member in &composite.members {
            members.push(self.resolve_inner(&member.set, registry, measure, stack)?);
        }
        let set = WeightedModelSet::builder(members, weights)
            .name(composite.name.as_str())
            .convention(self.output_convention)
            .reference_vs30(self.reference_vs30)
            .variance_policy(self.variance_policy)
            .allow_mixed_regions(true)
            .build()?;
        info!(
            composite = %composite.name,
            members = composite.members.len(),
            region = %set.tectonic_region(),
            "assembled composite"
        );
        Ok(ModelRef::set(set))
    }
}

/// Loads a configuration file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CompositeConfig, GmcError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| {
        GmcError::Config(
            ErrorInfo::new("config_read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    from_yaml_slice(&bytes).map_err(|err| err.with_context("path", path.display().to_string()))
}
