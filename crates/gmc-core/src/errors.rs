//! Structured error types shared across GMC crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`GmcError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (model names, measures, field names, shapes).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for composite model assembly and evaluation.
///
/// Every variant is raised synchronously at the point of detection. None of
/// them is transient, so callers should surface them rather than retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum GmcError {
    /// Weights are negative, non-finite, or do not sum to one.
    #[error("weight sum error: {0}")]
    WeightSum(ErrorInfo),
    /// Weight and model lists differ in length.
    #[error("weight count mismatch: {0}")]
    WeightCountMismatch(ErrorInfo),
    /// An entry is not a usable model (unknown name or empty capabilities).
    #[error("invalid model: {0}")]
    InvalidModel(ErrorInfo),
    /// Members span more than one tectonic region.
    #[error("tectonic region mismatch: {0}")]
    TectonicRegionMismatch(ErrorInfo),
    /// A member lacks a site term and no default site models were configured.
    #[error("missing default site model: {0}")]
    MissingDefaultSiteModel(ErrorInfo),
    /// Array valued fields disagree in shape.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(ErrorInfo),
    /// Requested uncertainty type outside the supported intersection.
    #[error("unsupported uncertainty type: {0}")]
    UnsupportedUncertaintyType(ErrorInfo),
    /// The period/measure filter removed every model.
    #[error("no applicable model: {0}")]
    NoApplicableModel(ErrorInfo),
    /// A parameter required by a model is absent from the bundles.
    #[error("missing parameter: {0}")]
    MissingParameter(ErrorInfo),
    /// A model or conversion cannot produce the requested measure.
    #[error("unsupported measure: {0}")]
    UnsupportedMeasure(ErrorInfo),
    /// Combined variance fell below zero under the strict variance policy.
    #[error("negative variance: {0}")]
    NegativeVariance(ErrorInfo),
    /// Configuration parsing, IO and serialization errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl GmcError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            GmcError::WeightSum(info)
            | GmcError::WeightCountMismatch(info)
            | GmcError::InvalidModel(info)
            | GmcError::TectonicRegionMismatch(info)
            | GmcError::MissingDefaultSiteModel(info)
            | GmcError::ShapeMismatch(info)
            | GmcError::UnsupportedUncertaintyType(info)
            | GmcError::NoApplicableModel(info)
            | GmcError::MissingParameter(info)
            | GmcError::UnsupportedMeasure(info)
            | GmcError::NegativeVariance(info)
            | GmcError::Config(info) => info,
        }
    }

    /// Adds a context entry to the payload unless the key is already present.
    ///
    /// Used to tag errors raised deep inside a member model with the identifiers
    /// of the enclosing set, without overwriting more specific context.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info_mut()
            .context
            .entry(key.into())
            .or_insert_with(|| value.into());
        self
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            GmcError::WeightSum(info)
            | GmcError::WeightCountMismatch(info)
            | GmcError::InvalidModel(info)
            | GmcError::TectonicRegionMismatch(info)
            | GmcError::MissingDefaultSiteModel(info)
            | GmcError::ShapeMismatch(info)
            | GmcError::UnsupportedUncertaintyType(info)
            | GmcError::NoApplicableModel(info)
            | GmcError::MissingParameter(info)
            | GmcError::UnsupportedMeasure(info)
            | GmcError::NegativeVariance(info)
            | GmcError::Config(info) => info,
        }
    }
}
