use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gmc_core::{ErrorInfo, GmcError, GroundMotionModel};
use gmc_engine::ModelRef;

use crate::table::{TableModel, TableModelSpec};

/// Constructor registered under a model name.
pub type ModelFactory =
    Arc<dyn Fn() -> Result<Arc<dyn GroundMotionModel>, GmcError> + Send + Sync>;

/// Name to constructor mapping used by name-driven assembly.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    factories: BTreeMap<String, ModelFactory>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("models", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ModelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Arc<dyn GroundMotionModel>, GmcError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Registers an already built model under its own name.
    pub fn register_model(&mut self, model: Arc<dyn GroundMotionModel>) {
        let name = model.name().to_string();
        self.register(name, move || Ok(Arc::clone(&model)));
    }

    /// Validates `spec` and registers the resulting table model.
    pub fn register_table(&mut self, spec: TableModelSpec) -> Result<(), GmcError> {
        let model: Arc<dyn GroundMotionModel> = Arc::new(TableModel::new(spec)?);
        self.register_model(model);
        Ok(())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    /// Instantiates the model registered under `name`.
    pub fn create(&self, name: &str) -> Result<ModelRef, GmcError> {
        let factory = self.factories.get(name).ok_or_else(|| {
            GmcError::InvalidModel(
                ErrorInfo::new("unknown_model", format!("no model is registered as '{name}'"))
                    .with_context("model", name)
                    .with_hint("register the model or define it under `models` in the configuration"),
            )
        })?;
        Ok(ModelRef::Leaf(factory()?))
    }

    /// Instantiates every model in `names`, in order.
    pub fn create_all(&self, names: &[String]) -> Result<Vec<ModelRef>, GmcError> {
        names.iter().map(|name| self.create(name)).collect()
    }
}
