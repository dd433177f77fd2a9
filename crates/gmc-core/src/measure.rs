use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, GmcError};

/// Period (seconds) used when converting spectral acceleration to peak velocity.
pub const PGV_PROXY_PERIOD: f64 = 1.0;

/// Family of an intensity measure, independent of spectral period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MeasureKind {
    /// Peak ground acceleration.
    Pga,
    /// Peak ground velocity.
    Pgv,
    /// Pseudo-spectral acceleration at some oscillator period.
    Sa,
}

/// A single requested intensity measure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IntensityMeasure {
    /// Peak ground acceleration (g).
    Pga,
    /// Peak ground velocity (cm/s).
    Pgv,
    /// Spectral acceleration (g) at the given period in seconds.
    Sa(f64),
}

impl IntensityMeasure {
    /// Spectral acceleration at the given period, validated to be positive and finite.
    pub fn sa(period: f64) -> Result<Self, GmcError> {
        if !period.is_finite() || period <= 0.0 {
            return Err(GmcError::UnsupportedMeasure(
                ErrorInfo::new("invalid_period", "spectral period must be positive")
                    .with_context("period", period.to_string()),
            ));
        }
        Ok(IntensityMeasure::Sa(period))
    }

    /// Returns the family of the measure.
    pub fn kind(&self) -> MeasureKind {
        match self {
            IntensityMeasure::Pga => MeasureKind::Pga,
            IntensityMeasure::Pgv => MeasureKind::Pgv,
            IntensityMeasure::Sa(_) => MeasureKind::Sa,
        }
    }

    /// Returns the spectral period for SA measures.
    pub fn period(&self) -> Option<f64> {
        match self {
            IntensityMeasure::Sa(period) => Some(*period),
            _ => None,
        }
    }
}

impl Display for IntensityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntensityMeasure::Pga => f.write_str("PGA"),
            IntensityMeasure::Pgv => f.write_str("PGV"),
            IntensityMeasure::Sa(period) => write!(f, "SA({period:?})"),
        }
    }
}

impl FromStr for IntensityMeasure {
    type Err = GmcError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().to_ascii_uppercase();
        match trimmed.as_str() {
            "PGA" => return Ok(IntensityMeasure::Pga),
            "PGV" => return Ok(IntensityMeasure::Pgv),
            _ => {}
        }
        let period = trimmed
            .strip_prefix("SA(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|inner| inner.trim().parse::<f64>().ok())
            .ok_or_else(|| {
                GmcError::UnsupportedMeasure(
                    ErrorInfo::new("unknown_measure", format!("cannot parse measure '{value}'"))
                        .with_context("measure", value)
                        .with_hint("expected PGA, PGV or SA(<period>)"),
                )
            })?;
        IntensityMeasure::sa(period)
    }
}

impl TryFrom<String> for IntensityMeasure {
    type Error = GmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IntensityMeasure> for String {
    fn from(value: IntensityMeasure) -> Self {
        value.to_string()
    }
}
