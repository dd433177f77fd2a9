use std::fs;

use gmc_core::{
    ComponentConvention, DistanceParam, DistanceParams, FieldValue, GmcError, IntensityMeasure,
    RuptureParam, RuptureParams, SiteParam, SiteParams, TectonicRegion, UncertaintyType,
};
use gmc_engine::ModelRef;
use gmc_sets::{load_config, load_scenario, CompositeConfig};
use tempfile::tempdir;

const CONFIG: &str = r#"
output_convention: average-horizontal
reference_vs30: 760
models:
  - name: CrustA
    pga: {c0: 0.5, c1: 0.8, c3: -1.2, c6: -0.5, tau: 0.35, phi: 0.55}
    pgv: {c0: 3.5, c1: 0.9, c3: -1.0, c6: -0.6, tau: 0.3, phi: 0.5}
    sa:
      - {period: 0.1, c0: 0.9, c1: 0.8, c3: -1.2, c6: -0.4, tau: 0.35, phi: 0.55}
      - {period: 1.0, c0: -0.4, c1: 1.0, c3: -1.0, c6: -0.6, tau: 0.35, phi: 0.6}
      - {period: 3.0, c0: -1.6, c1: 1.2, c3: -0.9, c6: -0.7, tau: 0.35, phi: 0.6}
  - name: CrustB
    site_term: false
    pga: {c0: 0.2, c1: 0.7, c3: -1.1, tau: 0.4, phi: 0.5}
    sa:
      - {period: 0.1, c0: 0.6, c1: 0.7, c3: -1.1, tau: 0.4, phi: 0.5}
      - {period: 1.0, c0: -0.7, c1: 0.9, c3: -1.0, tau: 0.4, phi: 0.55}
  - name: CrustSite
    pga: {c6: -0.55, tau: 0.3, phi: 0.5}
    sa:
      - {period: 0.1, c6: -0.45, tau: 0.3, phi: 0.5}
      - {period: 3.0, c6: -0.75, tau: 0.3, phi: 0.5}
  - name: SlabA
    region: subduction-intraslab
    component: greater-of-two-horizontal
    distance: rrup
    pga: {c0: 1.5, c1: 0.6, c3: -1.4, c6: -0.4, tau: 0.3, phi: 0.6}
    sa:
      - {period: 0.1, c0: 1.8, c1: 0.6, c3: -1.4, c6: -0.4, tau: 0.3, phi: 0.6}
      - {period: 3.0, c0: -0.9, c1: 0.9, c3: -1.1, c6: -0.6, tau: 0.3, phi: 0.65}
model_sets:
  - name: crust
    models: [CrustA, CrustB]
    weights: [0.6, 0.4]
    far_weights: [0.2, 0.8]
    cutoff_km: 100
    site_models: [CrustSite]
  - name: slab
    models: [SlabA]
    weights: [1.0]
composites:
  - name: mixed
    members:
      - {set: crust, weight: 0.7}
      - {set: slab, weight: 0.3}
select: mixed
"#;

fn inputs() -> (SiteParams, RuptureParams, DistanceParams) {
    (
        SiteParams::new().with(SiteParam::Vs30, vec![300.0, 760.0]),
        RuptureParams::new().with(RuptureParam::Mag, 6.5),
        DistanceParams::new()
            .with(DistanceParam::Rjb, vec![10.0, 150.0])
            .with(DistanceParam::Rrup, vec![12.0, 151.0]),
    )
}

#[test]
fn composite_spans_regions() {
    let config = CompositeConfig::from_yaml_str(CONFIG).unwrap();
    assert_eq!(config.default_name().unwrap(), "mixed");
    let model = config.resolve("mixed", None).unwrap();
    let ModelRef::Set(set) = &model else {
        panic!("composite should resolve to a weighted set");
    };
    assert_eq!(set.tectonic_region(), TectonicRegion::Mixed);
    assert_eq!(set.weights(), &[0.7, 0.3]);

    let (sites, rupture, distances) = inputs();
    let out = model
        .evaluate(&sites, &rupture, &distances, IntensityMeasure::Pga, &[UncertaintyType::Total])
        .unwrap();
    assert_eq!(out.shape(), &[2]);
    assert!(out.mean.iter().all(|v| v.is_finite()));
    assert!(out.stddev(UncertaintyType::Total).unwrap().iter().all(|sd| *sd > 0.0));
}

#[test]
fn configured_set_switches_to_far_weights() {
    let config = CompositeConfig::from_yaml_str(CONFIG).unwrap();
    let model = config.resolve("crust", None).unwrap();
    let ModelRef::Blended(blended) = &model else {
        panic!("set definitions resolve to blended models");
    };
    let far = blended.far().unwrap();
    assert_eq!(far.cutoff, 100.0);

    let (sites, rupture, distances) = inputs();
    let types = [UncertaintyType::Total];
    let combined = model
        .evaluate(&sites, &rupture, &distances, IntensityMeasure::Sa(1.0), &types)
        .unwrap();
    let near = blended
        .near()
        .evaluate(&sites, &rupture, &distances, IntensityMeasure::Sa(1.0), &types)
        .unwrap();
    let far = far
        .set
        .evaluate(&sites, &rupture, &distances, IntensityMeasure::Sa(1.0), &types)
        .unwrap();
    assert_eq!(combined.mean[[0]], near.mean[[0]]);
    assert_eq!(combined.mean[[1]], far.mean[[1]]);
    assert_ne!(near.mean[[1]], far.mean[[1]]);
}

#[test]
fn measure_filter_drops_short_models() {
    let config = CompositeConfig::from_yaml_str(CONFIG).unwrap();
    let model = config.resolve("crust", Some(IntensityMeasure::Sa(2.0))).unwrap();
    let ModelRef::Blended(blended) = &model else {
        panic!("set definitions resolve to blended models");
    };
    let names: Vec<&str> = blended.near().members().iter().map(ModelRef::name).collect();
    assert_eq!(names, vec!["CrustA"]);
    assert_eq!(blended.near().weights(), &[1.0]);

    let err = config
        .resolve("crust", Some(IntensityMeasure::Sa(4.0)))
        .unwrap_err();
    assert!(matches!(err, GmcError::NoApplicableModel(_)));
}

#[test]
fn hash_is_stable_across_yaml_roundtrip() {
    let config = CompositeConfig::from_yaml_str(CONFIG).unwrap();
    let yaml = config.to_yaml_string().unwrap();
    let reparsed = CompositeConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(config, reparsed);
    assert_eq!(config.config_hash().unwrap(), reparsed.config_hash().unwrap());

    let mut changed = config.clone();
    changed.model_sets[0].weights = vec![0.5, 0.5];
    assert_ne!(config.config_hash().unwrap(), changed.config_hash().unwrap());
}

#[test]
fn cyclic_composites_are_rejected() {
    let mut config = CompositeConfig::from_yaml_str(CONFIG).unwrap();
    config.composites.push(gmc_sets::CompositeSpec {
        name: "loop".to_string(),
        members: vec![gmc_sets::CompositeMember {
            set: "loop".to_string(),
            weight: 1.0,
        }],
    });
    let err = config.resolve("loop", None).unwrap_err();
    assert!(matches!(err, GmcError::Config(_)));
    assert_eq!(err.info().code, "composite_cycle");
}

#[test]
fn unknown_names_list_the_known_sets() {
    let config = CompositeConfig::from_yaml_str(CONFIG).unwrap();
    let err = config.resolve("nope", None).unwrap_err();
    assert!(matches!(err, GmcError::InvalidModel(_)));
    let hint = err.info().hint.clone().unwrap();
    assert!(hint.contains("crust") && hint.contains("nshmp14_acr"));
}

#[test]
fn config_and_scenario_load_from_disk() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("composite.yaml");
    fs::write(&config_path, CONFIG).unwrap();
    let config = load_config(&config_path).unwrap();
    assert_eq!(config.models.len(), 4);

    let scenario_path = dir.path().join("scenario.yaml");
    fs::write(
        &scenario_path,
        "sites:\n  vs30: {shape: [2, 3], values: [200, 300, 400, 500, 600, 700]}\nrupture:\n  mag: 6\ndistances:\n  rjb: {shape: [2, 3], values: [5, 10, 20, 40, 80, 160]}\n  rrup: {shape: [2, 3], values: [6, 11, 21, 41, 81, 161]}\n",
    )
    .unwrap();
    let scenario = load_scenario(&scenario_path).unwrap();
    let (sites, rupture, distances) = scenario.bundles().unwrap();
    assert_eq!(rupture.get(RuptureParam::Mag), Some(&FieldValue::Scalar(6.0)));

    let out = config
        .resolve("mixed", None)
        .unwrap()
        .evaluate(&sites, &rupture, &distances, IntensityMeasure::Sa(1.0), &[UncertaintyType::Total])
        .unwrap();
    assert_eq!(out.shape(), &[2, 3]);
}

#[test]
fn malformed_inputs_are_config_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "model_sets: [{name: x}]\n").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, GmcError::Config(_)));
    assert!(err.info().context.contains_key("path"));

    let missing = load_config(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(missing, GmcError::Config(_)));

    let scenario_path = dir.path().join("grid.yaml");
    fs::write(&scenario_path, "sites:\n  vs30: {shape: [2, 2], values: [1, 2, 3]}\n").unwrap();
    let err = load_scenario(&scenario_path).unwrap().bundles().unwrap_err();
    assert!(matches!(err, GmcError::ShapeMismatch(_)));
}

#[test]
fn output_convention_accepts_median_of_two_label() {
    let text = CONFIG.replace(
        "output_convention: average-horizontal",
        "output_convention: median-of-two-horizontal",
    );
    let config = CompositeConfig::from_yaml_str(&text).unwrap();
    assert_eq!(config.output_convention, ComponentConvention::MedianHorizontal);
    let model = config.resolve("slab", None).unwrap();
    let ModelRef::Blended(blended) = &model else {
        panic!("set definitions resolve to blended models");
    };
    assert_eq!(blended.near().convention(), ComponentConvention::MedianHorizontal);
}
