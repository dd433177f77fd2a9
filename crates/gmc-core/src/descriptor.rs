//! Static capability metadata declared once per model type.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorInfo, GmcError};
use crate::measure::{IntensityMeasure, MeasureKind};
use crate::params::{DistanceParam, RuptureParam, SiteParam};
use crate::types::{ComponentConvention, TectonicRegion, UncertaintyType};

/// Entries present in a model's coefficient table.
///
/// Declared explicitly at registration so that period coverage never has to be
/// discovered at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CoefficientTable {
    /// Non-period-indexed entries (PGA, PGV).
    #[serde(default)]
    pub non_sa: BTreeSet<MeasureKind>,
    /// Spectral periods (s), sorted ascending without duplicates.
    #[serde(default)]
    pub sa_periods: Vec<f64>,
}

impl CoefficientTable {
    /// Builds a table from its entries, normalising the period list.
    pub fn new(
        non_sa: impl IntoIterator<Item = MeasureKind>,
        periods: impl IntoIterator<Item = f64>,
    ) -> Self {
        let non_sa = non_sa
            .into_iter()
            .filter(|kind| *kind != MeasureKind::Sa)
            .collect();
        let mut sa_periods: Vec<f64> = periods.into_iter().filter(|p| p.is_finite()).collect();
        sa_periods.sort_by(f64::total_cmp);
        sa_periods.dedup();
        Self { non_sa, sa_periods }
    }

    /// Whether the table has a non-period entry for `kind`.
    pub fn has_entry(&self, kind: MeasureKind) -> bool {
        self.non_sa.contains(&kind)
    }

    /// Minimum and maximum spectral period.
    pub fn period_range(&self) -> Option<(f64, f64)> {
        match (self.sa_periods.first(), self.sa_periods.last()) {
            (Some(min), Some(max)) => Some((*min, *max)),
            _ => None,
        }
    }

    /// Whether `period` lies within the spectral period range.
    pub fn covers_period(&self, period: f64) -> bool {
        self.period_range()
            .map(|(min, max)| min <= period && period <= max)
            .unwrap_or(false)
    }

    /// Union of two tables.
    pub fn merged(&self, other: &CoefficientTable) -> CoefficientTable {
        CoefficientTable::new(
            self.non_sa.iter().chain(other.non_sa.iter()).copied(),
            self.sa_periods
                .iter()
                .chain(other.sa_periods.iter())
                .copied(),
        )
    }
}

/// Empirical relation used to derive a basin-depth parameter from vs30.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DepthRelation {
    /// Abrahamson et al. (2014) California z1.0.
    Ask14California,
    /// Chiou & Youngs (2014) California z1.0.
    Cy14California,
    /// Campbell & Bozorgnia (2014) California z2.5.
    Cb14California,
    /// Chiou & Youngs (2008) z1.0.
    Cy08,
    /// Campbell & Bozorgnia (2007) z2.5, derived from the Chiou & Youngs (2008) z1.0.
    Cb07,
}

impl DepthRelation {
    /// The site parameter the relation produces.
    pub fn target(&self) -> SiteParam {
        match self {
            DepthRelation::Ask14California | DepthRelation::Cy14California | DepthRelation::Cy08 => {
                SiteParam::Z1pt0
            }
            DepthRelation::Cb14California | DepthRelation::Cb07 => SiteParam::Z2pt5,
        }
    }
}

/// Immutable description of what a model can compute and what it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Tectonic setting of the model.
    pub tectonic_region: TectonicRegion,
    /// Measure families the model predicts natively.
    pub intensity_measures: BTreeSet<MeasureKind>,
    /// Horizontal component convention of the predictions.
    pub component: ComponentConvention,
    /// Standard deviation flavours the model reports.
    pub uncertainty_types: BTreeSet<UncertaintyType>,
    /// Site parameters consumed by the model.
    #[serde(default)]
    pub required_site: BTreeSet<SiteParam>,
    /// Rupture parameters consumed by the model.
    #[serde(default)]
    pub required_rupture: BTreeSet<RuptureParam>,
    /// Distance measures consumed by the model.
    #[serde(default)]
    pub required_distance: BTreeSet<DistanceParam>,
    /// Coefficient table entries.
    #[serde(default)]
    pub coefficients: CoefficientTable,
    /// Relation used to derive the model's basin-depth parameter, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_relation: Option<DepthRelation>,
}

impl CapabilityDescriptor {
    /// Starts a descriptor for the given region and component convention.
    pub fn new(tectonic_region: TectonicRegion, component: ComponentConvention) -> Self {
        Self {
            tectonic_region,
            intensity_measures: BTreeSet::new(),
            component,
            uncertainty_types: BTreeSet::new(),
            required_site: BTreeSet::new(),
            required_rupture: BTreeSet::new(),
            required_distance: BTreeSet::new(),
            coefficients: CoefficientTable::default(),
            depth_relation: None,
        }
    }

    /// Adds supported uncertainty types.
    pub fn with_uncertainties(mut self, types: impl IntoIterator<Item = UncertaintyType>) -> Self {
        self.uncertainty_types.extend(types);
        self
    }

    /// Adds required site parameters.
    pub fn requires_sites(mut self, params: impl IntoIterator<Item = SiteParam>) -> Self {
        self.required_site.extend(params);
        self
    }

    /// Adds required rupture parameters.
    pub fn requires_rupture(mut self, params: impl IntoIterator<Item = RuptureParam>) -> Self {
        self.required_rupture.extend(params);
        self
    }

    /// Adds required distance measures.
    pub fn requires_distances(mut self, params: impl IntoIterator<Item = DistanceParam>) -> Self {
        self.required_distance.extend(params);
        self
    }

    /// Sets the coefficient table; supported measure families follow from its entries.
    pub fn with_coefficients(mut self, table: CoefficientTable) -> Self {
        self.intensity_measures = table.non_sa.clone();
        if !table.sa_periods.is_empty() {
            self.intensity_measures.insert(MeasureKind::Sa);
        }
        self.coefficients = table;
        self
    }

    /// Declares the basin-depth relation; the derived parameter becomes required.
    pub fn with_depth_relation(mut self, relation: DepthRelation) -> Self {
        self.required_site.insert(relation.target());
        self.depth_relation = Some(relation);
        self
    }

    /// True iff the model consumes vs30, i.e. carries its own site term.
    pub fn has_site_term(&self) -> bool {
        self.required_site.contains(&SiteParam::Vs30)
    }

    /// Minimum and maximum supported spectral period.
    pub fn period_range(&self) -> Option<(f64, f64)> {
        self.coefficients.period_range()
    }

    /// Whether the model natively predicts the measure family of `measure`.
    pub fn supports(&self, measure: &IntensityMeasure) -> bool {
        self.intensity_measures.contains(&measure.kind())
    }

    /// Checks that the descriptor can describe a usable model.
    pub fn validate(&self, name: &str) -> Result<(), GmcError> {
        if self.intensity_measures.is_empty() {
            return Err(GmcError::InvalidModel(
                ErrorInfo::new("no_measures", "model declares no intensity measures")
                    .with_context("model", name),
            ));
        }
        if self.uncertainty_types.is_empty() {
            return Err(GmcError::InvalidModel(
                ErrorInfo::new("no_uncertainties", "model declares no uncertainty types")
                    .with_context("model", name),
            ));
        }
        Ok(())
    }
}
