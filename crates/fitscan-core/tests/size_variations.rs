use fitscan_core::config::SizingConfig;
use fitscan_core::scene::{self, SceneDocument};
use fitscan_core::{EvidenceSource, FeatureKind, FeatureSubtype, SizeVariationDetector};
use serde_json::{json, Value};

fn load(nodes: Value) -> SceneDocument {
    let doc = json!({ "nodes": nodes, "materials": [] });
    scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn explicit_labels_without_geometry_are_discounted() {
    let doc = load(json!([{ "name": "Shirt_XL" }, { "name": "Dress_Small" }]));
    let features = SizeVariationDetector::new().unwrap().detect(&doc);

    assert_eq!(features.len(), 2);
    for f in &features {
        assert_eq!(f.kind, FeatureKind::SizeVariation);
        assert_eq!(f.subtype, FeatureSubtype::SizeLabel);
        // 0.8 * 0.8
        assert!(close(f.confidence, 0.64));
        assert_eq!(f.evidence, vec![EvidenceSource::NamePattern]);
    }
    assert_eq!(features[0].matched, vec!["xl".to_string()]);
}

#[test]
fn numeric_and_scale_labels() {
    let doc = load(json!([
        { "name": "Pants_Size_38" },
        { "name": "Falda talla 40" },
        { "name": "Jacket_scale_1.05" }
    ]));
    let features = SizeVariationDetector::new().unwrap().detect(&doc);

    let found: Vec<_> = features
        .iter()
        .map(|f| (f.subtype, f.matched[0].clone()))
        .collect();
    assert_eq!(
        found,
        vec![
            (FeatureSubtype::NumericSize, "38".to_string()),
            (FeatureSubtype::NumericSize, "40".to_string()),
            (FeatureSubtype::ScaleVariant, "1.05".to_string()),
        ]
    );
    assert!(features.iter().all(|f| close(f.confidence, 0.48)));
}

#[test]
fn labelled_siblings_with_graded_scale_use_both_paths() {
    let doc = load(json!([
        { "name": "Shirts", "children": [1, 2, 3] },
        { "name": "Shirt_S", "scale": [0.95, 0.95, 0.95] },
        { "name": "Shirt_M", "scale": [1.0, 1.0, 1.0] },
        { "name": "Shirt_L", "scale": [1.05, 1.05, 1.05] }
    ]));
    let features = SizeVariationDetector::new().unwrap().detect(&doc);

    assert_eq!(features.len(), 3);
    for f in &features {
        assert_eq!(f.subtype, FeatureSubtype::SizeLabel);
        assert!(close(f.confidence, 0.8));
        assert_eq!(
            f.evidence,
            vec![EvidenceSource::NamePattern, EvidenceSource::ScaleGeometry]
        );
        assert!(f.corroborated());
    }
}

#[test]
fn unlabelled_graded_siblings_are_geometric_candidates() {
    let doc = load(json!([
        { "name": "Jacket", "children": [1, 2] },
        { "name": "Jacket_Body_01", "scale": [1.0, 1.0, 1.0] },
        { "name": "Jacket_Body_02", "scale": [1.1, 1.0, 1.0] }
    ]));
    let features = SizeVariationDetector::new().unwrap().detect(&doc);

    assert_eq!(features.len(), 2);
    assert!(features.iter().all(|f| f.subtype == FeatureSubtype::GradedScale));
    // 0.7 * 0.8
    assert!(features.iter().all(|f| close(f.confidence, 0.56)));
}

#[test]
fn small_scale_jitter_is_ignored() {
    let doc = load(json!([
        { "name": "Panel_01", "scale": [1.0, 1.0, 1.0] },
        { "name": "Panel_02", "scale": [1.01, 1.0, 1.0] }
    ]));
    assert!(SizeVariationDetector::new().unwrap().detect(&doc).is_empty());
}

#[test]
fn mirrored_siblings_are_not_graded() {
    let doc = load(json!([
        { "name": "Shirt", "children": [1, 2, 3, 4] },
        { "name": "pocket", "scale": [1.0, 1.0, 1.0] },
        { "name": "pocket", "scale": [-1.0, 1.0, 1.0] },
        { "name": "Sleeve_Panel", "scale": [1.0, 1.0, 1.0] },
        { "name": "Sleeve_Panel", "scale": [1.0, 1.0, -1.0] }
    ]));
    assert!(SizeVariationDetector::new().unwrap().detect(&doc).is_empty());
}

#[test]
fn mirrored_sibling_with_graded_magnitude_still_counts() {
    let doc = load(json!([
        { "name": "Panel_01", "scale": [1.0, 1.0, 1.0] },
        { "name": "Panel_02", "scale": [-1.1, 1.0, 1.0] }
    ]));
    let features = SizeVariationDetector::new().unwrap().detect(&doc);
    assert_eq!(features.len(), 2);
    assert!(features.iter().all(|f| f.subtype == FeatureSubtype::GradedScale));
}

#[test]
fn lone_side_suffix_is_not_a_size() {
    let doc = load(json!([
        { "name": "Sleeve_L" },
        { "name": "Sleeve_R" },
        { "name": "Pocket_S" }
    ]));
    assert!(SizeVariationDetector::new().unwrap().detect(&doc).is_empty());
}

#[test]
fn excluded_names_are_not_sizes() {
    let doc = load(json!([
        { "name": "size_chart_reference_XL" },
        { "name": "Large_Light" }
    ]));
    assert!(SizeVariationDetector::new().unwrap().detect(&doc).is_empty());
}

#[test]
fn threshold_and_discount_come_from_config() {
    let doc = load(json!([
        { "name": "Panel_01", "scale": [1.0, 1.0, 1.0] },
        { "name": "Panel_02", "scale": [1.01, 1.0, 1.0] }
    ]));
    let detector = SizeVariationDetector::with_config(SizingConfig {
        scale_delta_threshold: 0.005,
        single_path_discount: 1.0,
        ..SizingConfig::default()
    })
    .unwrap();

    let features = detector.detect(&doc);
    assert_eq!(features.len(), 2);
    assert!(features.iter().all(|f| close(f.confidence, 0.7)));
}
