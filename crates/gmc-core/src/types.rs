use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, GmcError};

fn parse_error(kind: &str, value: &str, accepted: &[&str]) -> GmcError {
    GmcError::Config(
        ErrorInfo::new("unknown_variant", format!("unrecognised {kind} '{value}'"))
            .with_context("value", value)
            .with_hint(format!("expected one of: {}", accepted.join(", "))),
    )
}

/// Tectonic setting a model is calibrated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TectonicRegion {
    /// Shallow crustal earthquakes in active tectonic regions.
    ActiveShallowCrust,
    /// Shallow crustal earthquakes in stable continental regions.
    StableShallowCrust,
    /// Subduction interface events.
    SubductionInterface,
    /// Intraslab subduction events.
    SubductionIntraslab,
    /// Volcanic sources.
    Volcanic,
    /// Composite spanning several regions (configuration-driven mixtures only).
    Mixed,
}

impl TectonicRegion {
    const NAMES: [&'static str; 6] = [
        "active-shallow-crust",
        "stable-shallow-crust",
        "subduction-interface",
        "subduction-intraslab",
        "volcanic",
        "mixed",
    ];

    /// Returns the canonical kebab-case label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TectonicRegion::ActiveShallowCrust => Self::NAMES[0],
            TectonicRegion::StableShallowCrust => Self::NAMES[1],
            TectonicRegion::SubductionInterface => Self::NAMES[2],
            TectonicRegion::SubductionIntraslab => Self::NAMES[3],
            TectonicRegion::Volcanic => Self::NAMES[4],
            TectonicRegion::Mixed => Self::NAMES[5],
        }
    }
}

impl Display for TectonicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal-component convention of a predicted intensity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum ComponentConvention {
    /// Geometric mean of the two as-recorded horizontal components.
    AverageHorizontal,
    /// Orientation-independent geometric mean, 50th percentile.
    #[serde(rename = "gmroti50")]
    GmRotI50,
    /// Rotation-independent median of the two horizontal components (RotD50).
    #[serde(alias = "rotd50", alias = "median-of-two-horizontal")]
    MedianHorizontal,
    /// Randomly chosen horizontal component.
    RandomHorizontal,
    /// Larger of the two as-recorded horizontal components.
    #[default]
    GreaterOfTwoHorizontal,
}

impl ComponentConvention {
    const NAMES: [&'static str; 5] = [
        "average-horizontal",
        "gmroti50",
        "median-horizontal",
        "random-horizontal",
        "greater-of-two-horizontal",
    ];

    /// Returns the canonical label used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentConvention::AverageHorizontal => Self::NAMES[0],
            ComponentConvention::GmRotI50 => Self::NAMES[1],
            ComponentConvention::MedianHorizontal => Self::NAMES[2],
            ComponentConvention::RandomHorizontal => Self::NAMES[3],
            ComponentConvention::GreaterOfTwoHorizontal => Self::NAMES[4],
        }
    }
}

impl Display for ComponentConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentConvention {
    type Err = GmcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "average-horizontal" | "geometric-mean" => Ok(ComponentConvention::AverageHorizontal),
            "gmroti50" => Ok(ComponentConvention::GmRotI50),
            "median-horizontal" | "median-of-two-horizontal" | "rotd50" => {
                Ok(ComponentConvention::MedianHorizontal)
            }
            "random-horizontal" => Ok(ComponentConvention::RandomHorizontal),
            "greater-of-two-horizontal" => Ok(ComponentConvention::GreaterOfTwoHorizontal),
            _ => Err(parse_error("component convention", value, &Self::NAMES)),
        }
    }
}

/// Flavour of standard deviation a model can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UncertaintyType {
    /// Total aleatory variability.
    Total,
    /// Between-event variability.
    InterEvent,
    /// Within-event variability.
    IntraEvent,
}

impl UncertaintyType {
    const NAMES: [&'static str; 3] = ["total", "inter-event", "intra-event"];

    /// Returns the canonical label.
    pub fn as_str(&self) -> &'static str {
        match self {
            UncertaintyType::Total => Self::NAMES[0],
            UncertaintyType::InterEvent => Self::NAMES[1],
            UncertaintyType::IntraEvent => Self::NAMES[2],
        }
    }
}

impl Display for UncertaintyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UncertaintyType {
    type Err = GmcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(UncertaintyType::Total),
            "inter-event" | "inter_event" => Ok(UncertaintyType::InterEvent),
            "intra-event" | "intra_event" => Ok(UncertaintyType::IntraEvent),
            _ => Err(parse_error("uncertainty type", value, &Self::NAMES)),
        }
    }
}

/// Variance clamping behaviour applied after the law-of-total-variance subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VariancePolicy {
    /// Negative variance is clamped to zero.
    #[default]
    Clamp,
    /// Round-off is clamped; anything below the tolerance fails loudly.
    Strict,
}
