use gmc_core::{
    ComponentConvention, DistanceParam, DistanceParams, GmcError, IntensityMeasure, RuptureParam,
    RuptureParams, SiteParam, SiteParams, TectonicRegion, UncertaintyType,
};
use gmc_engine::check_weights;
use gmc_sets::{
    assemble_definition, builtin_set, builtin_sets, AssemblyOptions, ModelRegistry, SetDefinition,
    SpectralRow, TableModelSpec, TableRow, BUILTIN_SETS,
};

fn row(c0: f64) -> TableRow {
    TableRow {
        c0,
        c1: 1.1,
        c2: -0.1,
        c3: -1.3,
        c4: 0.1,
        c5: -0.002,
        c6: -0.5,
        h: 6.0,
        basin: 0.0,
        tau: 0.4,
        phi: 0.6,
    }
}

fn table(name: &str, site_term: bool, max_period: f64) -> TableModelSpec {
    let periods = [0.02, 0.2, 1.0, 2.0, 5.0];
    TableModelSpec {
        name: name.to_string(),
        region: TectonicRegion::StableShallowCrust,
        component: ComponentConvention::AverageHorizontal,
        uncertainty_types: [UncertaintyType::Total, UncertaintyType::IntraEvent]
            .into_iter()
            .collect(),
        site_term,
        vref: 760.0,
        distance: DistanceParam::Rjb,
        depth_relation: None,
        pga: Some(row(0.5)),
        pgv: None,
        sa: periods
            .iter()
            .filter(|period| **period <= max_period)
            .map(|period| SpectralRow {
                period: *period,
                row: row(0.5 - period),
            })
            .collect(),
    }
}

fn scr_registry() -> ModelRegistry {
    let definition = builtin_set("nshmp14_scr_rlme").unwrap();
    let mut registry = ModelRegistry::new();
    for name in &definition.models {
        let capped = name == "SomervilleEtAl2001NSHMP2008" || name == "Atkinson2008prime";
        let spec = table(name, false, if capped { 2.0 } else { 5.0 });
        registry.register_table(spec).unwrap();
    }
    registry
        .register_table(table("AtkinsonBoore2006Modified2011", true, 5.0))
        .unwrap();
    registry
}

#[test]
fn builtin_weights_sum_to_one() {
    assert_eq!(builtin_sets().len(), BUILTIN_SETS.len());
    for definition in builtin_sets() {
        assert_eq!(definition.models.len(), definition.weights.len(), "{}", definition.name);
        check_weights(&definition.weights, &definition.name).unwrap();
        if let Some(far) = &definition.far_weights {
            assert_eq!(far.len(), definition.models.len());
            check_weights(far, &definition.name).unwrap();
            assert_eq!(definition.cutoff_km, Some(500.0));
        }
    }
}

#[test]
fn builtin_sets_match_the_published_lists() {
    let acr = builtin_set("nshmp14_acr").unwrap();
    assert_eq!(acr.models[0], "AbrahamsonEtAl2014");
    assert!(acr.site_models.is_empty());
    assert!(acr.far_weights.is_none());

    let rlme = builtin_set("nshmp14_scr_rlme").unwrap();
    let grd = builtin_set("nshmp14_scr_grd").unwrap();
    assert_eq!(rlme.models[6], "PezeshkEtAl2011NEHRPBC");
    assert_eq!(grd.models[6], "PezeshkEtAl2011");
    assert_eq!(grd.weights[8], 0.0);
    assert_eq!(rlme.site_models, vec!["AtkinsonBoore2006Modified2011".to_string()]);

    let sub_i = builtin_set("nshmp14_sub_i").unwrap();
    assert_eq!(sub_i.site_models.len(), 2);
    assert!(builtin_set("nshmp14_unknown").is_none());
}

#[test]
fn scr_definition_assembles_with_far_field() {
    let definition = builtin_set("nshmp14_scr_rlme").unwrap();
    let model = assemble_definition(&definition, &scr_registry(), None, &AssemblyOptions::default())
        .unwrap();
    assert_eq!(model.near().members().len(), 9);
    let far = model.far().unwrap();
    assert_eq!(far.cutoff, 500.0);
    assert_eq!(far.set.weights()[1], 0.0);
    assert!(model.near().site_term_set().is_some());

    let sites = SiteParams::new().with(SiteParam::Vs30, vec![360.0, 760.0]);
    let rupture = RuptureParams::new().with(RuptureParam::Mag, 7.0);
    let distances = DistanceParams::new().with(DistanceParam::Rjb, vec![100.0, 700.0]);
    let out = model
        .evaluate(&sites, &rupture, &distances, IntensityMeasure::Sa(1.0), &[UncertaintyType::Total])
        .unwrap();
    assert!(out.mean.iter().all(|v| v.is_finite()));
    assert!(out
        .stddev(UncertaintyType::Total)
        .unwrap()
        .iter()
        .all(|sd| *sd > 0.0));
}

#[test]
fn measure_filter_applies_to_near_and_far_weights() {
    let definition = builtin_set("nshmp14_scr_rlme").unwrap();
    let model = assemble_definition(
        &definition,
        &scr_registry(),
        Some(IntensityMeasure::Sa(3.0)),
        &AssemblyOptions::default(),
    )
    .unwrap();

    let near = model.near();
    assert_eq!(near.members().len(), 7);
    assert!(near.members().iter().all(|m| m.name() != "SomervilleEtAl2001NSHMP2008"));
    let near_sum: f64 = near.weights().iter().sum();
    assert!((near_sum - 1.0).abs() < 1e-12);
    assert!((near.weights()[0] - 0.06 / 0.82).abs() < 1e-12);

    let far = model.far().unwrap();
    assert_eq!(far.set.members().len(), 7);
    assert!((far.set.weights()[0] - 0.16).abs() < 1e-12);
}

#[test]
fn unknown_registry_names_are_invalid_models() {
    let definition = builtin_set("nshmp14_acr").unwrap();
    let err = assemble_definition(&definition, &ModelRegistry::new(), None, &AssemblyOptions::default())
        .unwrap_err();
    assert!(matches!(err, GmcError::InvalidModel(_)));
    assert_eq!(
        err.info().context.get("model").map(String::as_str),
        Some("AbrahamsonEtAl2014")
    );
}

#[test]
fn weights_are_checked_before_names() {
    let definition = SetDefinition {
        name: "broken".to_string(),
        models: vec!["nowhere".to_string()],
        weights: vec![0.97],
        far_weights: None,
        cutoff_km: None,
        site_models: Vec::new(),
        site_weights: None,
    };
    let err = assemble_definition(&definition, &ModelRegistry::new(), None, &AssemblyOptions::default())
        .unwrap_err();
    assert!(matches!(err, GmcError::WeightSum(_)));

    let definition = SetDefinition {
        weights: vec![0.5, 0.5],
        ..definition
    };
    let err = assemble_definition(&definition, &ModelRegistry::new(), None, &AssemblyOptions::default())
        .unwrap_err();
    assert!(matches!(err, GmcError::WeightCountMismatch(_)));
}

#[test]
fn far_weights_need_a_cutoff() {
    let mut registry = ModelRegistry::new();
    registry.register_table(table("only", true, 5.0)).unwrap();
    let definition = SetDefinition {
        name: "half".to_string(),
        models: vec!["only".to_string()],
        weights: vec![1.0],
        far_weights: Some(vec![1.0]),
        cutoff_km: None,
        site_models: Vec::new(),
        site_weights: None,
    };
    let err = assemble_definition(&definition, &registry, None, &AssemblyOptions::default())
        .unwrap_err();
    assert!(matches!(err, GmcError::Config(_)));
}
