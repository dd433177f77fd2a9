use std::collections::BTreeMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gmc_core::{
    CapabilityDescriptor, CoefficientTable, ComponentConvention, DistanceParam, DistanceParams,
    EvalContext, GmcError, GroundMotionModel, IntensityMeasure, MeasureKind, Prediction,
    RuptureParams, SiteParam, SiteParams, TectonicRegion, UncertaintyType,
};
use gmc_engine::{ModelRef, WeightedModelSet};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
struct Attenuation {
    name: String,
    offset: f64,
    descriptor: CapabilityDescriptor,
}

impl Attenuation {
    fn new(index: usize, site_term: bool) -> Self {
        let mut descriptor = CapabilityDescriptor::new(
            TectonicRegion::ActiveShallowCrust,
            ComponentConvention::AverageHorizontal,
        )
        .with_uncertainties([UncertaintyType::Total, UncertaintyType::IntraEvent])
        .requires_distances([DistanceParam::Rjb])
        .with_coefficients(CoefficientTable::new([MeasureKind::Pga], [0.01, 0.3, 1.0, 3.0]));
        if site_term {
            descriptor = descriptor.requires_sites([SiteParam::Vs30]);
        }
        Self {
            name: format!("atten-{index}"),
            offset: 0.1 * index as f64,
            descriptor,
        }
    }
}

impl GroundMotionModel for Attenuation {
    fn name(&self) -> &str {
        &self.name
    }

    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    fn mean_and_stddevs(
        &self,
        ctx: &EvalContext<'_>,
        _measure: IntensityMeasure,
        uncertainty_types: &[UncertaintyType],
    ) -> Result<Prediction, GmcError> {
        let rjb = ctx.distances.values(DistanceParam::Rjb, ctx.len)?;
        let mut mean = rjb.mapv(|r| self.offset - 1.2 * (r * r + 36.0).sqrt().ln());
        if self.descriptor.has_site_term() {
            let vs30 = ctx.sites.values(SiteParam::Vs30, ctx.len)?;
            mean = mean + vs30.mapv(|v| -0.6 * (v / 760.0).ln());
        }
        let stddevs: BTreeMap<_, _> = uncertainty_types
            .iter()
            .map(|kind| (*kind, ndarray::ArrayD::from_elem(vec![ctx.len], 0.6)))
            .collect();
        Ok(Prediction {
            mean: mean.into_dyn(),
            stddevs,
        })
    }
}

fn combine_grid_bench(c: &mut Criterion) {
    let members: Vec<ModelRef> = (0..4)
        .map(|index| ModelRef::leaf(Attenuation::new(index, index % 2 == 0)))
        .collect();
    let set = WeightedModelSet::builder(members, vec![0.25; 4])
        .default_site_models(vec![ModelRef::leaf(Attenuation::new(9, true))], None)
        .build()
        .unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let vs30 = Array2::from_shape_fn((200, 200), |_| rng.gen_range(180.0..1500.0));
    let rjb = Array2::from_shape_fn((200, 200), |(i, j)| 1.0 + (i + j) as f64 * 0.75);
    let sites = SiteParams::new().with(SiteParam::Vs30, vs30);
    let distances = DistanceParams::new().with(DistanceParam::Rjb, rjb);
    let rupture = RuptureParams::new();

    c.bench_function("combine_grid_200x200", |b| {
        b.iter(|| {
            let out = set
                .evaluate(
                    &sites,
                    &rupture,
                    &distances,
                    IntensityMeasure::Sa(0.3),
                    &[UncertaintyType::Total, UncertaintyType::IntraEvent],
                )
                .unwrap();
            black_box(out);
        });
    });
}

criterion_group!(benches, combine_grid_bench);
criterion_main!(benches);
