#![deny(missing_docs)]
#![doc = "Model-set assembly for GMC: the model registry, named NSHMP 2014 sets, YAML configuration with nested composites, and a coefficient-table reference model."]

/// Name-driven assembly of set definitions.
pub mod assemble;
pub mod catalog;
pub mod config;
/// Canonical hashing helpers.
pub mod hash;
/// Model registry.
pub mod registry;
pub mod scenario;
/// Canonical JSON and YAML serde helpers.
pub mod serde;
pub mod table;

pub use assemble::{assemble_definition, AssemblyOptions};
pub use catalog::{builtin_set, builtin_sets, SetDefinition, BUILTIN_SETS};
pub use config::{load_config, CompositeConfig, CompositeMember, CompositeSpec};
pub use registry::{ModelFactory, ModelRegistry};
pub use scenario::{load_scenario, FieldSpec, Scenario};
pub use table::{SpectralRow, TableModel, TableModelSpec, TableRow};
