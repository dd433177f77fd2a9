//! Coefficient-table reference model.
//!
//! `ln Y = c0 + c1 (M - 6) + c2 (M - 6)^2 + (c3 + c4 (M - 4.5)) ln sqrt(R^2 + h^2)
//!  + c5 R + c6 ln(vs30 / vref) + basin ln(1 + z)`
//!
//! The vs30 term is only present for models with a site term and the basin term
//! only for models declaring a depth relation. Spectral rows between table
//! periods are interpolated linearly in ln(period).

use std::collections::{BTreeMap, BTreeSet};

use gmc_core::{
    CapabilityDescriptor, CoefficientTable, ComponentConvention, DepthRelation, DistanceParam,
    ErrorInfo, EvalContext, GmcError, GroundMotionModel, IntensityMeasure, MeasureKind,
    Prediction, RuptureParam, SiteParam, TectonicRegion, UncertaintyType,
};
use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

/// One row of coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Constant term.
    #[serde(default)]
    pub c0: f64,
    /// Linear magnitude scaling.
    #[serde(default)]
    pub c1: f64,
    /// Quadratic magnitude scaling.
    #[serde(default)]
    pub c2: f64,
    /// Geometric spreading.
    #[serde(default)]
    pub c3: f64,
    /// Magnitude-dependent geometric spreading.
    #[serde(default)]
    pub c4: f64,
    /// Anelastic attenuation.
    #[serde(default)]
    pub c5: f64,
    /// Linear vs30 scaling.
    #[serde(default)]
    pub c6: f64,
    /// Finite-fault pseudo-depth (km).
    #[serde(default = "TableRow::default_h")]
    pub h: f64,
    /// Basin-depth scaling.
    #[serde(default)]
    pub basin: f64,
    /// Between-event standard deviation.
    pub tau: f64,
    /// Within-event standard deviation.
    pub phi: f64,
}

impl TableRow {
    fn default_h() -> f64 {
        6.0
    }

    fn lerp(&self, other: &TableRow, frac: f64) -> TableRow {
        let mix = |a: f64, b: f64| a + (b - a) * frac;
        TableRow {
            c0: mix(self.c0, other.c0),
            c1: mix(self.c1, other.c1),
            c2: mix(self.c2, other.c2),
            c3: mix(self.c3, other.c3),
            c4: mix(self.c4, other.c4),
            c5: mix(self.c5, other.c5),
            c6: mix(self.c6, other.c6),
            h: mix(self.h, other.h),
            basin: mix(self.basin, other.basin),
            tau: mix(self.tau, other.tau),
            phi: mix(self.phi, other.phi),
        }
    }

    fn ln_mean(&self, mag: f64, distance: f64, site: f64, basin: f64) -> f64 {
        let dm = mag - 6.0;
        let r = (distance * distance + self.h * self.h).sqrt();
        self.c0
            + self.c1 * dm
            + self.c2 * dm * dm
            + (self.c3 + self.c4 * (mag - 4.5)) * r.ln()
            + self.c5 * distance
            + self.c6 * site
            + self.basin * basin
    }

    fn sigma(&self, kind: UncertaintyType) -> f64 {
        match kind {
            UncertaintyType::Total => (self.tau * self.tau + self.phi * self.phi).sqrt(),
            UncertaintyType::InterEvent => self.tau,
            UncertaintyType::IntraEvent => self.phi,
        }
    }
}

/// Spectral row at a given period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralRow {
    /// Period in seconds.
    pub period: f64,
    /// Coefficients at `period`.
    #[serde(flatten)]
    pub row: TableRow,
}

/// Declarative definition of a [`TableModel`], as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableModelSpec {
    /// Registry name.
    pub name: String,
    /// Tectonic region.
    #[serde(default = "TableModelSpec::default_region")]
    pub region: TectonicRegion,
    /// Component convention of the predictions.
    #[serde(default = "TableModelSpec::default_component")]
    pub component: ComponentConvention,
    /// Uncertainty types reported.
    #[serde(default = "TableModelSpec::default_uncertainties")]
    pub uncertainty_types: BTreeSet<UncertaintyType>,
    /// Whether the model carries its own vs30 term.
    #[serde(default = "TableModelSpec::default_site_term")]
    pub site_term: bool,
    /// Reference vs30 of the site term (m/s).
    #[serde(default = "TableModelSpec::default_vref")]
    pub vref: f64,
    /// Distance measure used for attenuation.
    #[serde(default = "TableModelSpec::default_distance")]
    pub distance: DistanceParam,
    /// Basin-depth relation, if the model has a basin term.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_relation: Option<DepthRelation>,
    /// PGA coefficients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pga: Option<TableRow>,
    /// PGV coefficients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pgv: Option<TableRow>,
    /// Spectral coefficients.
    #[serde(default)]
    pub sa: Vec<SpectralRow>,
}

impl TableModelSpec {
    fn default_region() -> TectonicRegion {
        TectonicRegion::ActiveShallowCrust
    }

    fn default_component() -> ComponentConvention {
        ComponentConvention::AverageHorizontal
    }

    fn default_uncertainties() -> BTreeSet<UncertaintyType> {
        [
            UncertaintyType::Total,
            UncertaintyType::InterEvent,
            UncertaintyType::IntraEvent,
        ]
        .into_iter()
        .collect()
    }

    fn default_site_term() -> bool {
        true
    }

    fn default_vref() -> f64 {
        760.0
    }

    fn default_distance() -> DistanceParam {
        DistanceParam::Rjb
    }
}

/// Ground-motion model evaluated from a coefficient table.
#[derive(Debug, Clone)]
pub struct TableModel {
    spec: TableModelSpec,
    spectral: Vec<SpectralRow>,
    descriptor: CapabilityDescriptor,
}

impl TableModel {
    /// Validates `spec` and builds the model.
    pub fn new(spec: TableModelSpec) -> Result<Self, GmcError> {
        let invalid = |code: &str, message: &str| {
            GmcError::InvalidModel(
                ErrorInfo::new(code, message).with_context("model", spec.name.as_str()),
            )
        };
        if spec.pga.is_none() && spec.pgv.is_none() && spec.sa.is_empty() {
            return Err(invalid("empty_table", "coefficient table has no rows"));
        }
        if !(spec.vref.is_finite() && spec.vref > 0.0) {
            return Err(invalid("vref", "reference vs30 must be positive"));
        }
        let mut spectral = spec.sa.clone();
        if spectral.iter().any(|row| !(row.period.is_finite() && row.period > 0.0)) {
            return Err(invalid("period", "spectral periods must be positive"));
        }
        spectral.sort_by(|a, b| a.period.total_cmp(&b.period));
        if spectral.windows(2).any(|pair| pair[0].period == pair[1].period) {
            return Err(invalid("duplicate_period", "spectral periods must be unique"));
        }

        let mut non_sa = Vec::new();
        if spec.pga.is_some() {
            non_sa.push(MeasureKind::Pga);
        }
        if spec.pgv.is_some() {
            non_sa.push(MeasureKind::Pgv);
        }
        let table = CoefficientTable::new(non_sa, spectral.iter().map(|row| row.period));
        let mut descriptor = CapabilityDescriptor::new(spec.region, spec.component)
            .with_uncertainties(spec.uncertainty_types.iter().copied())
            .requires_rupture([RuptureParam::Mag])
            .requires_distances([spec.distance])
            .with_coefficients(table);
        if spec.site_term {
            descriptor = descriptor.requires_sites([SiteParam::Vs30]);
        }
        if let Some(relation) = spec.depth_relation {
            descriptor = descriptor.with_depth_relation(relation);
        }
        descriptor.validate(&spec.name)?;

        Ok(Self {
            spec,
            spectral,
            descriptor,
        })
    }

    /// Definition the model was built from.
    pub fn spec(&self) -> &TableModelSpec {
        &self.spec
    }

    /// Coefficients for `measure`, interpolating spectral rows in ln(period).
    pub fn row(&self, measure: &IntensityMeasure) -> Result<TableRow, GmcError> {
        let row = match measure {
            IntensityMeasure::Pga => self.spec.pga,
            IntensityMeasure::Pgv => self.spec.pgv,
            IntensityMeasure::Sa(period) => self.spectral_row(*period),
        };
        row.ok_or_else(|| {
            GmcError::UnsupportedMeasure(
                ErrorInfo::new("unsupported_measure", "no coefficients for the requested measure")
                    .with_context("model", self.spec.name.as_str())
                    .with_context("measure", measure.to_string()),
            )
        })
    }

    fn spectral_row(&self, period: f64) -> Option<TableRow> {
        let upper = self.spectral.iter().position(|row| row.period >= period)?;
        let hi = &self.spectral[upper];
        if hi.period == period {
            return Some(hi.row);
        }
        let lo = self.spectral.get(upper.checked_sub(1)?)?;
        let frac = (period / lo.period).ln() / (hi.period / lo.period).ln();
        Some(lo.row.lerp(&hi.row, frac))
    }
}

impl GroundMotionModel for TableModel {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    fn mean_and_stddevs(
        &self,
        ctx: &EvalContext<'_>,
        measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError> {
        let row = self.row(&measure)?;
        let len = ctx.len;
        let mag = ctx.rupture.values(RuptureParam::Mag, len)?;
        let distance = ctx.distances.values(self.spec.distance, len)?;
        let site = if self.spec.site_term {
            let vref = self.spec.vref;
            ctx.sites
                .values(SiteParam::Vs30, len)?
                .mapv(|vs30| (vs30 / vref).ln())
        } else {
            Array1::zeros(len)
        };
        let basin = match self.spec.depth_relation {
            Some(relation) => ctx
                .sites
                .values(relation.target(), len)?
                .mapv(|depth| (1.0 + depth.max(0.0)).ln()),
            None => Array1::zeros(len),
        };
        let mean = Array1::from_shape_fn(len, |i| row.ln_mean(mag[i], distance[i], site[i], basin[i]));

        let mut stddevs = BTreeMap::new();
        for kind in uncertainty_types {
            if !self.descriptor.uncertainty_types.contains(kind) {
                return Err(GmcError::UnsupportedUncertaintyType(
                    ErrorInfo::new("unsupported_uncertainty", "model does not report this uncertainty")
                        .with_context("model", self.spec.name.as_str())
                        .with_context("uncertainty", kind.as_str()),
                ));
            }
            stddevs.insert(*kind, ArrayD::from_elem(vec![len], row.sigma(*kind)));
        }
        Ok(Prediction {
            mean: mean.into_dyn(),
            stddevs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(c0: f64) -> TableRow {
        TableRow {
            c0,
            c1: 0.0,
            c2: 0.0,
            c3: 0.0,
            c4: 0.0,
            c5: 0.0,
            c6: 0.0,
            h: 6.0,
            basin: 0.0,
            tau: 0.3,
            phi: 0.4,
        }
    }

    fn spec() -> TableModelSpec {
        TableModelSpec {
            name: "table".to_string(),
            region: TectonicRegion::ActiveShallowCrust,
            component: ComponentConvention::AverageHorizontal,
            uncertainty_types: TableModelSpec::default_uncertainties(),
            site_term: true,
            vref: 760.0,
            distance: DistanceParam::Rjb,
            depth_relation: None,
            pga: Some(row(0.0)),
            pgv: None,
            sa: vec![
                SpectralRow { period: 1.0, row: row(-2.0) },
                SpectralRow { period: 0.1, row: row(0.0) },
            ],
        }
    }

    #[test]
    fn spectral_rows_interpolate_in_log_period() {
        let model = TableModel::new(spec()).unwrap();
        let mid = model.row(&IntensityMeasure::Sa(10f64.powf(-0.5))).unwrap();
        assert!((mid.c0 + 1.0).abs() < 1e-12);
        assert_eq!(model.row(&IntensityMeasure::Sa(1.0)).unwrap().c0, -2.0);
    }

    #[test]
    fn periods_outside_the_table_are_unsupported() {
        let model = TableModel::new(spec()).unwrap();
        assert!(matches!(
            model.row(&IntensityMeasure::Sa(0.05)),
            Err(GmcError::UnsupportedMeasure(_))
        ));
        assert!(matches!(
            model.row(&IntensityMeasure::Sa(2.0)),
            Err(GmcError::UnsupportedMeasure(_))
        ));
        assert!(matches!(
            model.row(&IntensityMeasure::Pgv),
            Err(GmcError::UnsupportedMeasure(_))
        ));
    }

    #[test]
    fn descriptor_follows_the_table() {
        let model = TableModel::new(spec()).unwrap();
        let descriptor = model.descriptor();
        assert_eq!(descriptor.period_range(), Some((0.1, 1.0)));
        assert!(descriptor.has_site_term());
        assert!(descriptor.coefficients.has_entry(MeasureKind::Pga));
        assert!(!descriptor.coefficients.has_entry(MeasureKind::Pgv));
    }

    #[test]
    fn duplicate_periods_are_rejected() {
        let mut spec = spec();
        spec.sa.push(SpectralRow { period: 0.1, row: row(1.0) });
        assert!(matches!(TableModel::new(spec), Err(GmcError::InvalidModel(_))));
    }
}
