use fitscan_core::config::MatchingConfig;
use fitscan_core::features::{EntityKind, NameTokens};
use fitscan_core::scene::{self, SceneDocument};
use fitscan_core::{EvidenceSource, FeatureKind, FeatureSubtype, GarmentType, PatternMatcher};
use serde_json::json;

fn doc_with_nodes(names: &[&str]) -> SceneDocument {
    let nodes: Vec<_> = names.iter().map(|n| json!({ "name": n })).collect();
    let doc = json!({ "nodes": nodes, "materials": [] });
    scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap()
}

fn subtypes(doc: &SceneDocument) -> Vec<FeatureSubtype> {
    PatternMatcher::new()
        .match_document(doc)
        .into_iter()
        .map(|f| f.subtype)
        .collect()
}

#[test]
fn tokenizer_splits_case_digits_and_separators() {
    let tokens = NameTokens::new("FrontZipper01_left-side");
    assert_eq!(tokens.words(), ["front", "zipper", "01", "left", "side"]);
    assert!(tokens.contains("zipper"));
    assert!(tokens.contains("left side"));
    assert!(!tokens.contains("side left"));
}

#[test]
fn only_regular_inflections_extend_a_keyword() {
    let tokens = NameTokens::new("zippers pleated hemmed tied snapping");
    for keyword in ["zipper", "pleat", "hem", "tie", "snap"] {
        assert!(tokens.contains(keyword), "{keyword}");
    }

    let fabric = NameTokens::new("hemp_refined_panel");
    assert!(!fabric.contains("hem"));
    assert!(!fabric.contains("ref"));
}

#[test]
fn unrelated_words_sharing_a_prefix_do_not_match() {
    let doc = doc_with_nodes(&["Hemp_Panel", "refine_seam"]);
    let features = PatternMatcher::new().match_document(&doc);

    // "hemp" is a fabric; "refine" must not trigger the "ref" exclusion.
    assert_eq!(features.len(), 1);
    assert_eq!(features[0].source.index, 1);
    assert_eq!(features[0].subtype, FeatureSubtype::Seam);
}

#[test]
fn closure_names_get_their_base_confidence() {
    let doc = doc_with_nodes(&["velcro_strap", "magnet_tab", "snap_01", "zipper", "button_3"]);
    let features = PatternMatcher::new().match_document(&doc);

    let found: Vec<_> = features.iter().map(|f| (f.subtype, f.confidence)).collect();
    assert_eq!(
        found,
        vec![
            (FeatureSubtype::Velcro, 0.9),
            (FeatureSubtype::Magnetic, 0.9),
            (FeatureSubtype::Snap, 0.7),
            (FeatureSubtype::Zipper, 0.6),
            (FeatureSubtype::Button, 0.4),
        ]
    );
    assert!(features.iter().all(|f| f.kind == FeatureKind::Closure));
    assert!(features.iter().all(|f| f.source.kind == EntityKind::Node));
}

#[test]
fn spanish_aliases_are_recognized() {
    let doc = doc_with_nodes(&["Cremallera_Frontal", "Boton_Delantero", "Puño_Izquierdo", "Costura_Lateral"]);
    let features = PatternMatcher::new().match_document(&doc);

    let pairs: Vec<_> = features.iter().map(|f| (f.source.index, f.subtype)).collect();
    assert_eq!(
        pairs,
        vec![
            (0, FeatureSubtype::Zipper),
            (1, FeatureSubtype::Button),
            (2, FeatureSubtype::Cuff),
            (3, FeatureSubtype::Seam),
        ]
    );
}

#[test]
fn exclusion_suppresses_match() {
    let doc = doc_with_nodes(&["zipper_texture", "Button_Decoration", "snap_reference", "camera"]);
    assert!(subtypes(&doc).is_empty());
}

#[test]
fn highest_confidence_subtype_wins_per_family() {
    // "hook and loop" names velcro; the bare hook pattern must not also fire.
    let doc = doc_with_nodes(&["hook_and_loop_closure", "button_snap_combo"]);
    assert_eq!(
        subtypes(&doc),
        vec![FeatureSubtype::Velcro, FeatureSubtype::Snap]
    );
}

#[test]
fn one_entity_yields_a_single_feature() {
    // Zipper (0.6), ZipperPull (0.8) and Sleeve (0.7) all match; the pull wins.
    let doc = doc_with_nodes(&["sleeve_zip_puller", "zipper_pull"]);
    let kinds: Vec<_> = PatternMatcher::new()
        .match_document(&doc)
        .into_iter()
        .map(|f| (f.source.index, f.kind, f.subtype))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, FeatureKind::AccessibilityElement, FeatureSubtype::ZipperPull),
            (1, FeatureKind::AccessibilityElement, FeatureSubtype::ZipperPull),
        ]
    );
}

#[test]
fn context_tokens_add_evidence_but_not_confidence() {
    let doc = doc_with_nodes(&["front_placket_zipper", "zipper"]);
    let features = PatternMatcher::new().match_document(&doc);

    assert_eq!(features[0].confidence, features[1].confidence);
    assert!(features[0].evidence.contains(&EvidenceSource::NamingContext));
    assert!(features[0].corroborated());
    assert!(!features[1].corroborated());
    assert!(features[0].matched.contains(&"placket".to_string()));
}

#[test]
fn mesh_and_material_names_corroborate_instead_of_duplicating() {
    let doc = json!({
        "nodes": [{ "name": "Front_Zipper", "mesh": 0 }],
        "meshes": [{ "name": "zipper_geo", "primitives": [{ "material": 0 }] }],
        "materials": [{ "name": "zipper_metal" }]
    });
    let doc = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap();
    let features = PatternMatcher::new().match_document(&doc);

    assert_eq!(features.len(), 1);
    let zipper = &features[0];
    assert_eq!(zipper.source.kind, EntityKind::Node);
    assert!(zipper.evidence.contains(&EvidenceSource::MeshName));
    assert!(zipper.evidence.contains(&EvidenceSource::MaterialName));
    assert_eq!(zipper.confidence, 0.6);
}

#[test]
fn unreferenced_mesh_names_produce_their_own_features() {
    let doc = json!({
        "nodes": [{ "name": "Body", "mesh": 0 }],
        "meshes": [{ "name": "body" }, { "name": "snap_fastener" }],
        "materials": []
    });
    let doc = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap();
    let features = PatternMatcher::new().match_document(&doc);

    assert_eq!(features.len(), 1);
    assert_eq!(features[0].source.kind, EntityKind::Mesh);
    assert_eq!(features[0].source.index, 1);
    assert_eq!(features[0].subtype, FeatureSubtype::Snap);
}

#[test]
fn mesh_scanning_can_be_disabled() {
    let doc = json!({
        "nodes": [],
        "meshes": [{ "name": "snap_fastener" }],
        "materials": [{ "name": "velcro_tape" }]
    });
    let doc = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap();
    let matcher = PatternMatcher::with_config(MatchingConfig {
        scan_meshes: false,
        scan_materials: false,
        ..MatchingConfig::default()
    });
    assert!(matcher.match_document(&doc).is_empty());
}

#[test]
fn unnamed_nodes_are_skipped() {
    let doc = json!({
        "nodes": [{ "mesh": 0 }, { "name": "" }, { "name": "z" }],
        "meshes": [{}],
        "materials": []
    });
    let doc = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap();
    assert!(PatternMatcher::new().match_document(&doc).is_empty());
}

#[test]
fn matching_is_deterministic() {
    let doc = doc_with_nodes(&["zip", "collar", "hem_left", "toggle", "drawstring"]);
    let matcher = PatternMatcher::new();
    assert_eq!(matcher.match_document(&doc), matcher.match_document(&doc));
}

#[test]
fn garment_type_is_inferred_from_names() {
    assert_eq!(
        GarmentType::infer(&doc_with_nodes(&["Denim_Jacket", "Sleeve"])),
        GarmentType::Jacket
    );
    assert_eq!(
        GarmentType::infer(&doc_with_nodes(&["T-Shirt_Body"])),
        GarmentType::KnitTop
    );
    assert_eq!(
        GarmentType::infer(&doc_with_nodes(&["Pantalon_Front"])),
        GarmentType::Trousers
    );
    assert_eq!(GarmentType::infer(&doc_with_nodes(&["Mesh01"])), GarmentType::Unknown);
    assert!(!GarmentType::KnitTop.expects_closures());
    assert!(GarmentType::Unknown.expects_closures());
}
