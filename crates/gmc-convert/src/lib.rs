#![deny(missing_docs)]
#![doc = "Conversions between horizontal-component conventions and between related intensity measures, all in natural-log units."]

/// Component-convention conversions.
pub mod component;
/// Intensity-measure conversions.
pub mod measure;

pub use component::{BeyerBommer2006, ComponentConverter, ComponentRatio};
pub use measure::{BommerAlarcon2006, NewmarkHall1982};
