#![allow(dead_code)]

use std::collections::BTreeMap;

use gmc_core::{
    CapabilityDescriptor, CoefficientTable, ComponentConvention, DepthRelation, DistanceParam,
    ErrorInfo, EvalContext, GmcError, GroundMotionModel, IntensityMeasure, MeasureKind,
    Prediction, SiteParam, TectonicRegion, UncertaintyType,
};
use gmc_engine::ModelRef;
use ndarray::{Array1, ArrayD};

/// Model with a closed-form prediction used to check the engine's arithmetic.
///
/// `ln y = base [+ 1 for PGV] [+ vs30_slope * ln(vs30 / 760)] [- distance_slope * ln(rjb + 10)]
///  [+ basin_scale * ln(1 + depth)]`
#[derive(Debug, Clone)]
pub struct StubModel {
    name: String,
    base: f64,
    tau: f64,
    phi: f64,
    vs30_slope: f64,
    distance_slope: f64,
    basin_scale: f64,
    region: TectonicRegion,
    component: ComponentConvention,
    site_term: bool,
    pgv: bool,
    periods: Vec<f64>,
    uncertainties: Vec<UncertaintyType>,
    depth_relation: Option<DepthRelation>,
    descriptor: CapabilityDescriptor,
}

impl StubModel {
    pub fn new(name: &str, base: f64) -> Self {
        let mut model = Self {
            name: name.to_string(),
            base,
            tau: 0.4,
            phi: 0.5,
            vs30_slope: 0.0,
            distance_slope: 0.0,
            basin_scale: 0.0,
            region: TectonicRegion::ActiveShallowCrust,
            component: ComponentConvention::AverageHorizontal,
            site_term: true,
            pgv: true,
            periods: vec![0.01, 0.1, 0.5, 1.0, 2.0],
            uncertainties: vec![
                UncertaintyType::Total,
                UncertaintyType::InterEvent,
                UncertaintyType::IntraEvent,
            ],
            depth_relation: None,
            descriptor: CapabilityDescriptor::new(
                TectonicRegion::ActiveShallowCrust,
                ComponentConvention::AverageHorizontal,
            ),
        };
        model.refresh();
        model
    }

    fn refresh(&mut self) {
        let mut non_sa = vec![MeasureKind::Pga];
        if self.pgv {
            non_sa.push(MeasureKind::Pgv);
        }
        let mut descriptor = CapabilityDescriptor::new(self.region, self.component)
            .with_uncertainties(self.uncertainties.iter().copied())
            .requires_distances([DistanceParam::Rjb])
            .with_coefficients(CoefficientTable::new(non_sa, self.periods.iter().copied()));
        if self.site_term {
            descriptor = descriptor.requires_sites([SiteParam::Vs30]);
        }
        if let Some(relation) = self.depth_relation {
            descriptor = descriptor.with_depth_relation(relation);
        }
        self.descriptor = descriptor;
    }

    fn updated(mut self, change: impl FnOnce(&mut Self)) -> Self {
        change(&mut self);
        self.refresh();
        self
    }

    pub fn without_site_term(self) -> Self {
        self.updated(|m| m.site_term = false)
    }

    pub fn without_pgv(self) -> Self {
        self.updated(|m| m.pgv = false)
    }

    pub fn region(self, region: TectonicRegion) -> Self {
        self.updated(|m| m.region = region)
    }

    pub fn component(self, component: ComponentConvention) -> Self {
        self.updated(|m| m.component = component)
    }

    pub fn periods(self, periods: &[f64]) -> Self {
        let periods = periods.to_vec();
        self.updated(|m| m.periods = periods)
    }

    pub fn sigmas(self, tau: f64, phi: f64) -> Self {
        self.updated(|m| {
            m.tau = tau;
            m.phi = phi;
        })
    }

    pub fn uncertainties(self, types: &[UncertaintyType]) -> Self {
        let types = types.to_vec();
        self.updated(|m| m.uncertainties = types)
    }

    pub fn vs30_slope(self, slope: f64) -> Self {
        self.updated(|m| m.vs30_slope = slope)
    }

    pub fn distance_slope(self, slope: f64) -> Self {
        self.updated(|m| m.distance_slope = slope)
    }

    pub fn basin(self, relation: DepthRelation, scale: f64) -> Self {
        self.updated(|m| {
            m.depth_relation = Some(relation);
            m.basin_scale = scale;
        })
    }

    pub fn into_ref(self) -> ModelRef {
        ModelRef::leaf(self)
    }

    pub fn total_sigma(&self) -> f64 {
        (self.tau * self.tau + self.phi * self.phi).sqrt()
    }

    fn sigma(&self, kind: UncertaintyType) -> f64 {
        match kind {
            UncertaintyType::Total => self.total_sigma(),
            UncertaintyType::InterEvent => self.tau,
            UncertaintyType::IntraEvent => self.phi,
        }
    }
}

impl GroundMotionModel for StubModel {
    fn name(&self) -> &str {
        &self.name
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
        let supported = match measure {
            IntensityMeasure::Pga => true,
            IntensityMeasure::Pgv => self.pgv,
            IntensityMeasure::Sa(period) => self.descriptor.coefficients.covers_period(period),
        };
        if !supported {
            return Err(GmcError::UnsupportedMeasure(
                ErrorInfo::new("unsupported_measure", "stub cannot evaluate measure")
                    .with_context("model", self.name.as_str())
                    .with_context("measure", measure.to_string()),
            ));
        }

        let mut mean = Array1::from_elem(ctx.len, self.base);
        if measure == IntensityMeasure::Pgv {
            mean += 1.0;
        }
        if self.site_term {
            let vs30 = ctx.sites.values(SiteParam::Vs30, ctx.len)?;
            mean = mean + vs30.mapv(|v| self.vs30_slope * (v / 760.0).ln());
        }
        if self.distance_slope != 0.0 {
            let rjb = ctx.distances.values(DistanceParam::Rjb, ctx.len)?;
            mean = mean - rjb.mapv(|r| self.distance_slope * (r + 10.0).ln());
        }
        if let Some(relation) = self.depth_relation {
            let depth = ctx.sites.values(relation.target(), ctx.len)?;
            mean = mean + depth.mapv(|z| self.basin_scale * (1.0 + z).ln());
        }

        let mut stddevs = BTreeMap::new();
        for kind in uncertainty_types {
            stddevs.insert(*kind, ArrayD::from_elem(vec![ctx.len], self.sigma(*kind)));
        }
        Ok(Prediction {
            mean: mean.into_dyn(),
            stddevs,
        })
    }
}

pub fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-9
}
