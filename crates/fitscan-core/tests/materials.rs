use fitscan_core::materials::{FabricType, SurfaceFinish};
use fitscan_core::scene::{self, SceneDocument};
use fitscan_core::{EvidenceSource, MaterialClass, MaterialClassification, MaterialClassifier};
use serde_json::{json, Value};

fn classify(materials: Value, textures: Value, images: Value) -> Vec<MaterialClassification> {
    let doc = json!({
        "nodes": [],
        "materials": materials,
        "textures": textures,
        "images": images
    });
    let doc: SceneDocument = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap();
    MaterialClassifier::new().classify(doc.materials(), doc.textures(), doc.images())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn high_metallic_is_hardware() {
    let result = classify(
        json!([{ "pbrMetallicRoughness": { "metallicFactor": 0.95, "roughnessFactor": 0.2 } }]),
        json!([]),
        json!([]),
    );
    assert_eq!(result[0].class, MaterialClass::Hardware);
    assert!(close(result[0].confidence, 0.9));
    assert_eq!(result[0].evidence, vec![EvidenceSource::MaterialPbr]);
    assert_eq!(result[0].surface, None);
}

#[test]
fn rough_non_metal_is_textile() {
    let result = classify(
        json!([{ "pbrMetallicRoughness": { "metallicFactor": 0.0, "roughnessFactor": 0.9 } }]),
        json!([]),
        json!([]),
    );
    assert_eq!(result[0].class, MaterialClass::Textile);
    assert!(close(result[0].confidence, 0.7));
    assert_eq!(result[0].surface, Some(SurfaceFinish::Rough));
}

#[test]
fn diffuse_fabric_texture_corroborates_textile() {
    let result = classify(
        json!([{
            "pbrMetallicRoughness": {
                "metallicFactor": 0.0,
                "roughnessFactor": 0.9,
                "baseColorTexture": { "index": 0 }
            }
        }]),
        json!([{ "source": 0 }]),
        json!([{ "uri": "textures/wool_knit_diffuse.png" }]),
    );
    let m = &result[0];
    assert_eq!(m.class, MaterialClass::Textile);
    // 0.7 + 0.25 * 0.7
    assert!(close(m.confidence, 0.875));
    assert_eq!(m.fabric_type, Some(FabricType::Wool));
    assert_eq!(
        m.evidence,
        vec![EvidenceSource::MaterialPbr, EvidenceSource::TextureHint]
    );
    assert!(!m.conflicting);
}

#[test]
fn combined_confidence_is_capped() {
    let result = classify(
        json!([{
            "pbrMetallicRoughness": {
                "metallicFactor": 0.0,
                "roughnessFactor": 0.95,
                "baseColorTexture": { "index": 0 }
            },
            "extensions": { "KHR_materials_sheen": { "sheenRoughnessFactor": 0.5 } }
        }]),
        json!([{ "source": 0 }]),
        json!([{ "name": "cotton_base" }]),
    );
    assert!(close(result[0].confidence, 1.0));
}

#[test]
fn ambiguous_unnamed_material_defaults_to_low_confidence_textile() {
    let result = classify(
        json!([
            { "pbrMetallicRoughness": { "metallicFactor": 0.4, "roughnessFactor": 0.5 } },
            {}
        ]),
        json!([]),
        json!([]),
    );
    for m in &result {
        assert_eq!(m.class, MaterialClass::Textile);
        assert!(m.confidence <= 0.5);
        assert!(close(m.confidence, 0.4));
        assert!(m.evidence.is_empty());
    }
}

#[test]
fn names_label_fabric_without_changing_confidence() {
    let named = classify(
        json!([{ "name": "Silk_Charmeuse", "pbrMetallicRoughness": { "metallicFactor": 0.0, "roughnessFactor": 0.5 } }]),
        json!([]),
        json!([]),
    );
    let unnamed = classify(
        json!([{ "pbrMetallicRoughness": { "metallicFactor": 0.0, "roughnessFactor": 0.5 } }]),
        json!([]),
        json!([]),
    );
    assert_eq!(named[0].fabric_type, Some(FabricType::Silk));
    assert_eq!(unnamed[0].fabric_type, None);
    assert_eq!(named[0].confidence, unnamed[0].confidence);
    assert_eq!(named[0].class, unnamed[0].class);
}

#[test]
fn metal_named_texture_pushes_toward_hardware() {
    let result = classify(
        json!([{
            "pbrMetallicRoughness": {
                "metallicFactor": 0.9,
                "roughnessFactor": 0.1,
                "baseColorTexture": { "index": 0 }
            }
        }]),
        json!([{ "source": 0 }]),
        json!([{ "uri": "brass_zipper_teeth.png" }]),
    );
    assert_eq!(result[0].class, MaterialClass::Hardware);
    // 0.9 + 0.25 * 0.7, capped
    assert!(close(result[0].confidence, 1.0));
}

#[test]
fn conflicting_signals_are_penalized() {
    // Metallic PBR, but the base color texture is a fabric scan.
    let result = classify(
        json!([{
            "pbrMetallicRoughness": {
                "metallicFactor": 1.0,
                "roughnessFactor": 0.2,
                "baseColorTexture": { "index": 0 }
            }
        }]),
        json!([{ "source": 0 }]),
        json!([{ "uri": "denim_diffuse.jpg" }]),
    );
    let m = &result[0];
    assert!(m.conflicting);
    assert_eq!(m.class, MaterialClass::Hardware);
    // 0.9 - 0.5 * 0.7
    assert!(close(m.confidence, 0.55));
}

#[test]
fn clo_extension_is_strong_textile_evidence() {
    let result = classify(
        json!([{
            "name": "Jersey",
            "extensions": {
                "CLO_material_properties": {
                    "Stretch-Warp": 250000.0,
                    "Stretch-Weft": 80000.0,
                    "Weight": 180.0,
                    "Thickness": 0.6
                }
            }
        }]),
        json!([]),
        json!([]),
    );
    let m = &result[0];
    assert_eq!(m.class, MaterialClass::Textile);
    assert!(close(m.confidence, 0.95));
    assert_eq!(m.evidence, vec![EvidenceSource::ToolExtension]);

    let stretch = m.stretch.expect("stretch properties");
    assert!(stretch.has_stretch);
    assert_eq!(stretch.weight, 180.0);
}

#[test]
fn normal_map_alone_is_weak_textile_evidence() {
    let result = classify(
        json!([{ "normalTexture": { "index": 0 } }]),
        json!([{ "source": 0 }]),
        json!([{ "uri": "n.png" }]),
    );
    // 0.3 is below the textile fallback
    assert!(close(result[0].confidence, 0.4));
    assert_eq!(result[0].evidence, vec![EvidenceSource::TextureHint]);
}

#[test]
fn classification_is_indexed_like_materials() {
    let result = classify(
        json!([{ "name": "a" }, { "name": "b" }, { "name": "c" }]),
        json!([]),
        json!([]),
    );
    let indices: Vec<_> = result.iter().map(|m| m.material).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn single_decisive_pbr_signal_survives() {
    let result = classify(
        json!([
            { "pbrMetallicRoughness": { "metallicFactor": 0.0, "roughnessFactor": 0.9 } },
            { "pbrMetallicRoughness": { "metallicFactor": 0.0, "roughnessFactor": 0.1 } },
            { "pbrMetallicRoughness": { "metallicFactor": 0.1, "roughnessFactor": 0.5 } }
        ]),
        json!([]),
        json!([]),
    );
    let confidences: Vec<_> = result.iter().map(|m| m.confidence).collect();
    assert!(close(confidences[0], 0.7));
    assert!(close(confidences[1], 0.6));
    assert!(close(confidences[2], 0.5));
    assert!(result.iter().all(|m| m.class == MaterialClass::Textile));
}
