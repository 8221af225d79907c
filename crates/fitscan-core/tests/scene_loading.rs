use fitscan_core::scene::{self, LoadOutcome, TextureChannel, UnsupportedReason};
use fitscan_core::ParseError;
use serde_json::json;

fn glb(json: &str) -> Vec<u8> {
    let mut chunk = json.as_bytes().to_vec();
    while chunk.len() % 4 != 0 {
        chunk.push(b' ');
    }
    let total = 12 + 8 + chunk.len();

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&chunk);
    out
}

fn jacket() -> serde_json::Value {
    json!({
        "asset": { "version": "2.0", "generator": "CLO3D 7.2" },
        "scene": 0,
        "scenes": [{ "name": "Jacket", "nodes": [0] }],
        "nodes": [
            { "name": "Jacket", "children": [1, 2] },
            { "name": "Front_Zipper", "mesh": 0, "scale": [1.0, 1.0, 1.0] },
            { "name": "Sleeve_L", "mesh": 1 }
        ],
        "meshes": [
            { "name": "zipper_mesh", "primitives": [{ "material": 1 }, { "material": 1 }] },
            { "name": "sleeve", "primitives": [{ "material": 0 }] }
        ],
        "materials": [
            {
                "name": "Cotton_Twill",
                "pbrMetallicRoughness": {
                    "metallicFactor": 0.0,
                    "roughnessFactor": 0.9,
                    "baseColorTexture": { "index": 0 }
                },
                "normalTexture": { "index": 0 }
            },
            {
                "name": "Metal",
                "pbrMetallicRoughness": { "metallicFactor": 1.4, "roughnessFactor": -0.2 }
            }
        ],
        "textures": [{ "source": 0 }],
        "images": [{ "uri": "cotton_diffuse.png", "mimeType": "image/png" }]
    })
}

#[test]
fn loads_hierarchy_meshes_and_materials() {
    let bytes = serde_json::to_vec(&jacket()).unwrap();
    let doc = scene::load(&bytes).expect("load");

    assert_eq!(doc.generator(), Some("CLO3D 7.2"));
    assert_eq!(doc.version(), Some("2.0"));
    assert_eq!(doc.nodes().len(), 3);
    assert_eq!(doc.roots(), vec![0]);
    assert_eq!(doc.parent(1), Some(0));
    assert_eq!(doc.parent(0), None);
    assert_eq!(doc.depth_first(), vec![0, 1, 2]);
    assert_eq!(doc.default_scene().map(|s| s.name.as_str()), Some("Jacket"));

    // Primitive materials are deduplicated.
    assert_eq!(doc.mesh(0).unwrap().materials, vec![1]);
    assert_eq!(doc.node_materials(1), &[1]);
    assert!(doc.node_materials(0).is_empty());
}

#[test]
fn texture_channels_and_images_are_resolved() {
    let bytes = serde_json::to_vec(&jacket()).unwrap();
    let doc = scene::load(&bytes).unwrap();

    let cotton = doc.material(0).unwrap();
    let channels: Vec<_> = cotton.textures.iter().map(|t| t.channel).collect();
    assert_eq!(channels, vec![TextureChannel::BaseColor, TextureChannel::Normal]);
    assert_eq!(doc.texture_image(0).unwrap().label(), "cotton_diffuse.png");
}

#[test]
fn pbr_factors_are_clamped() {
    let bytes = serde_json::to_vec(&jacket()).unwrap();
    let doc = scene::load(&bytes).unwrap();

    let pbr = doc.material(1).unwrap().pbr.unwrap();
    assert_eq!(pbr.metallic, Some(1.0));
    assert_eq!(pbr.roughness, Some(0.0));
}

#[test]
fn matrix_transforms_are_decomposed() {
    let doc = json!({
        "nodes": [{
            "name": "Shirt_XL",
            "matrix": [
                1.1, 0.0, 0.0, 0.0,
                0.0, 1.2, 0.0, 0.0,
                0.0, 0.0, 1.3, 0.0,
                5.0, 6.0, 7.0, 1.0
            ]
        }],
        "materials": []
    });
    let doc = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap();
    let t = doc.node(0).unwrap().transform;

    assert_eq!(t.translation, [5.0, 6.0, 7.0]);
    assert!((t.scale[0] - 1.1).abs() < 1e-12);
    assert!((t.scale[1] - 1.2).abs() < 1e-12);
    assert!((t.scale[2] - 1.3).abs() < 1e-12);
}

#[test]
fn cyclic_hierarchy_is_rejected() {
    let doc = json!({
        "nodes": [
            { "name": "a", "children": [1] },
            { "name": "b", "children": [2] },
            { "name": "c", "children": [0] }
        ],
        "materials": []
    });
    let err = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, ParseError::CyclicGraph { .. }), "got {err:?}");
}

#[test]
fn self_parented_node_is_rejected() {
    let doc = json!({
        "nodes": [{ "name": "loop", "children": [0] }],
        "materials": []
    });
    let err = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, ParseError::CyclicGraph { node: 0 }));
}

#[test]
fn dangling_indices_are_malformed() {
    let bad_mesh = json!({
        "nodes": [{ "name": "a", "mesh": 3 }],
        "meshes": [],
        "materials": []
    });
    let bad_material = json!({
        "nodes": [],
        "meshes": [{ "primitives": [{ "material": 9 }] }],
        "materials": []
    });
    let bad_child = json!({
        "nodes": [{ "children": [4] }],
        "materials": []
    });

    for doc in [bad_mesh, bad_material, bad_child] {
        let err = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedStructure { .. }), "got {err:?}");
    }
}

#[test]
fn shared_child_is_malformed() {
    let doc = json!({
        "nodes": [
            { "name": "a", "children": [2] },
            { "name": "b", "children": [2] },
            { "name": "c" }
        ],
        "materials": []
    });
    let err = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedStructure { .. }));
}

#[test]
fn missing_required_section_is_malformed() {
    let doc = json!({ "nodes": [{ "name": "a" }], "meshes": [] });
    let err = scene::load(&serde_json::to_vec(&doc).unwrap()).unwrap_err();
    assert!(matches!(err, ParseError::MalformedStructure { .. }));
}

#[test]
fn truncated_json_is_invalid() {
    let err = scene::load(br#"{"nodes": [{"name": "a"}"#).unwrap_err();
    assert!(matches!(err, ParseError::InvalidJson(_)));
}

#[test]
fn glb_container_is_unpacked() {
    let json = serde_json::to_string(&jacket()).unwrap();
    let doc = scene::load(&glb(&json)).expect("load glb");
    assert_eq!(doc.nodes().len(), 3);
    assert_eq!(doc.materials().len(), 2);
}

#[test]
fn corrupt_glb_header_is_an_error() {
    let mut bytes = glb("{}");
    bytes[8] = 0xFF;
    let err = scene::load(&bytes).unwrap_err();
    assert!(matches!(err, ParseError::Container(_)), "got {err:?}");
}

#[test]
fn non_scene_inputs_route_to_unsupported() {
    let cases: [(&[u8], UnsupportedReason); 3] = [
        (b"PK\x03\x04 zprj archive", UnsupportedReason::NotSceneFormat),
        (
            br#"{"asset": {"generator": "exporter"}}"#,
            UnsupportedReason::NoSceneSections,
        ),
        (br#"{"nodes": [], "materials": []}"#, UnsupportedReason::EmptyScene),
    ];

    for (bytes, expected) in cases {
        match scene::inspect(bytes).expect("inspect") {
            LoadOutcome::Unsupported(doc) => {
                assert_eq!(doc.reason, expected);
                assert_eq!(doc.byte_len, bytes.len());
            }
            LoadOutcome::Scene(_) => panic!("expected unsupported for {expected:?}"),
        }
    }
}

#[test]
fn inspect_keeps_generator_of_unsupported_json() {
    let outcome = scene::inspect(br#"{"asset": {"generator": "Blender"}}"#).unwrap();
    let LoadOutcome::Unsupported(doc) = outcome else {
        panic!("expected unsupported");
    };
    assert_eq!(doc.generator.as_deref(), Some("Blender"));
}

#[test]
fn inspect_still_fails_on_malformed_scene() {
    let err = scene::inspect(br#"{"nodes": [{"mesh": 0}], "materials": []}"#).unwrap_err();
    assert!(matches!(err, ParseError::MalformedStructure { .. }));
}
