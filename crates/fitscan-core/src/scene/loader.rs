//! Loading raw bytes (glTF JSON or binary GLB) into a [`SceneDocument`].

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::document::{
    AssetInfo, Image, Material, Mesh, Node, PbrProperties, Scene, SceneDocument, Texture,
    TextureChannel, TextureRef, Transform,
};
use crate::error::ParseError;

const GLB_MAGIC: &[u8; 4] = b"glTF";

/// Top-level sections that mark a JSON object as a scene description.
const SCENE_SECTIONS: [&str; 3] = ["nodes", "meshes", "materials"];

/// Why a well-formed input carries no structure the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedReason {
    /// Neither JSON nor a GLB container (e.g. a proprietary project archive)
    NotSceneFormat,
    /// JSON without any of the `nodes`, `meshes` or `materials` sections
    NoSceneSections,
    /// Scene sections present but no nodes and no materials
    EmptyScene,
}

impl UnsupportedReason {
    pub fn describe(self) -> &'static str {
        match self {
            UnsupportedReason::NotSceneFormat => "input is not a JSON scene description",
            UnsupportedReason::NoSceneSections => "input has no node, mesh or material sections",
            UnsupportedReason::EmptyScene => "scene declares no nodes and no materials",
        }
    }
}

/// A well-formed input that routes to the fixed-baseline scoring path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedDocument {
    pub reason: UnsupportedReason,
    pub byte_len: usize,
    /// Declared exporter, when the input was JSON with an `asset` block
    pub generator: Option<String>,
}

/// Result of inspecting input bytes ahead of analysis.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Scene(SceneDocument),
    Unsupported(UnsupportedDocument),
}

/// Parse a scene strictly.
///
/// Fails with [`ParseError::MalformedStructure`] when `nodes` or `materials`
/// is absent or any index is out of range, and with
/// [`ParseError::CyclicGraph`] when the node hierarchy loops.
pub fn load(bytes: &[u8]) -> Result<SceneDocument, ParseError> {
    let json = unpack(bytes)?;
    let raw: RawDocument = serde_json::from_slice(&json)?;
    build(raw)
}

/// Parse a scene, routing inputs without structural signal to
/// [`LoadOutcome::Unsupported`] instead of failing.
pub fn inspect(bytes: &[u8]) -> Result<LoadOutcome, ParseError> {
    if !is_glb(bytes) && !looks_like_json(bytes) {
        return Ok(LoadOutcome::Unsupported(UnsupportedDocument {
            reason: UnsupportedReason::NotSceneFormat,
            byte_len: bytes.len(),
            generator: None,
        }));
    }

    let json = unpack(bytes)?;
    let value: serde_json::Value = serde_json::from_slice(&json)?;

    let has_sections = value
        .as_object()
        .map(|obj| SCENE_SECTIONS.iter().any(|key| obj.contains_key(*key)))
        .unwrap_or(false);
    if !has_sections {
        let generator = value
            .pointer("/asset/generator")
            .and_then(|g| g.as_str())
            .map(String::from);
        return Ok(LoadOutcome::Unsupported(UnsupportedDocument {
            reason: UnsupportedReason::NoSceneSections,
            byte_len: bytes.len(),
            generator,
        }));
    }

    let raw: RawDocument = serde_json::from_value(value)?;
    let document = build(raw)?;

    if !document.has_structure() {
        return Ok(LoadOutcome::Unsupported(UnsupportedDocument {
            reason: UnsupportedReason::EmptyScene,
            byte_len: bytes.len(),
            generator: document.asset.generator.clone(),
        }));
    }

    Ok(LoadOutcome::Scene(document))
}

fn is_glb(bytes: &[u8]) -> bool {
    bytes.starts_with(GLB_MAGIC)
}

fn looks_like_json(bytes: &[u8]) -> bool {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    matches!(
        body.iter().find(|b| !b.is_ascii_whitespace()),
        Some(b'{') | Some(b'[')
    )
}

/// Return the JSON text, extracting it from a GLB container when needed.
fn unpack(bytes: &[u8]) -> Result<Cow<'_, [u8]>, ParseError> {
    if is_glb(bytes) {
        let glb = gltf::Glb::from_slice(bytes)?;
        Ok(glb.json)
    } else {
        Ok(Cow::Borrowed(bytes))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    asset: RawAsset,
    nodes: Option<Vec<RawNode>>,
    #[serde(default)]
    meshes: Vec<RawMesh>,
    materials: Option<Vec<RawMaterial>>,
    #[serde(default)]
    textures: Vec<RawTexture>,
    #[serde(default)]
    images: Vec<RawImage>,
    #[serde(default)]
    scenes: Vec<RawScene>,
    scene: Option<usize>,
    #[serde(default)]
    extensions_used: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAsset {
    version: Option<String>,
    generator: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    name: Option<String>,
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
    translation: Option<[f64; 3]>,
    rotation: Option<[f64; 4]>,
    scale: Option<[f64; 3]>,
    matrix: Option<[f64; 16]>,
}

#[derive(Debug, Deserialize)]
struct RawMesh {
    name: Option<String>,
    #[serde(default)]
    primitives: Vec<RawPrimitive>,
}

#[derive(Debug, Deserialize)]
struct RawPrimitive {
    material: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMaterial {
    name: Option<String>,
    pbr_metallic_roughness: Option<RawPbr>,
    normal_texture: Option<RawTextureInfo>,
    occlusion_texture: Option<RawTextureInfo>,
    emissive_texture: Option<RawTextureInfo>,
    #[serde(default)]
    extensions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPbr {
    base_color_factor: Option<[f64; 4]>,
    metallic_factor: Option<f64>,
    roughness_factor: Option<f64>,
    base_color_texture: Option<RawTextureInfo>,
    metallic_roughness_texture: Option<RawTextureInfo>,
}

#[derive(Debug, Deserialize)]
struct RawTextureInfo {
    index: usize,
}

#[derive(Debug, Deserialize)]
struct RawTexture {
    name: Option<String>,
    source: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawImage {
    name: Option<String>,
    uri: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawScene {
    name: Option<String>,
    #[serde(default)]
    nodes: Vec<usize>,
}

fn check_index(index: usize, len: usize, what: &str, owner: &str) -> Result<(), ParseError> {
    if index < len {
        Ok(())
    } else {
        Err(ParseError::malformed(format!(
            "{owner} references {what} {index}, but only {len} exist"
        )))
    }
}

fn build(raw: RawDocument) -> Result<SceneDocument, ParseError> {
    let raw_nodes = raw
        .nodes
        .ok_or_else(|| ParseError::malformed("missing required section `nodes`"))?;
    let raw_materials = raw
        .materials
        .ok_or_else(|| ParseError::malformed("missing required section `materials`"))?;

    let node_count = raw_nodes.len();
    let mesh_count = raw.meshes.len();
    let material_count = raw_materials.len();
    let texture_count = raw.textures.len();
    let image_count = raw.images.len();

    let images: Vec<Image> = raw
        .images
        .into_iter()
        .map(|img| Image {
            name: img.name.unwrap_or_default(),
            uri: img.uri,
            mime_type: img.mime_type,
        })
        .collect();

    let mut textures = Vec::with_capacity(texture_count);
    for (i, tex) in raw.textures.into_iter().enumerate() {
        if let Some(source) = tex.source {
            check_index(source, image_count, "image", &format!("texture {i}"))?;
        }
        textures.push(Texture {
            name: tex.name.unwrap_or_default(),
            source: tex.source,
        });
    }

    let mut materials = Vec::with_capacity(material_count);
    for (i, mat) in raw_materials.into_iter().enumerate() {
        materials.push(build_material(i, mat, texture_count)?);
    }

    let mut meshes = Vec::with_capacity(mesh_count);
    for (i, mesh) in raw.meshes.into_iter().enumerate() {
        let mut used = Vec::new();
        for prim in &mesh.primitives {
            if let Some(material) = prim.material {
                check_index(material, material_count, "material", &format!("mesh {i}"))?;
                if !used.contains(&material) {
                    used.push(material);
                }
            }
        }
        meshes.push(Mesh {
            name: mesh.name.unwrap_or_default(),
            materials: used,
        });
    }

    let mut nodes = Vec::with_capacity(node_count);
    for (i, node) in raw_nodes.into_iter().enumerate() {
        if let Some(mesh) = node.mesh {
            check_index(mesh, mesh_count, "mesh", &format!("node {i}"))?;
        }
        for &child in &node.children {
            check_index(child, node_count, "child node", &format!("node {i}"))?;
        }
        let transform = match node.matrix {
            Some(m) => transform_from_matrix(&m),
            None => {
                let defaults = Transform::default();
                Transform {
                    translation: node.translation.unwrap_or(defaults.translation),
                    rotation: node.rotation.unwrap_or(defaults.rotation),
                    scale: node.scale.unwrap_or(defaults.scale),
                }
            }
        };
        nodes.push(Node {
            name: node.name.unwrap_or_default(),
            mesh: node.mesh,
            children: node.children,
            transform,
        });
    }

    detect_cycles(&nodes)?;
    let parents = assign_parents(&nodes)?;

    let mut scenes = Vec::with_capacity(raw.scenes.len());
    for (i, scene) in raw.scenes.into_iter().enumerate() {
        for &n in &scene.nodes {
            check_index(n, node_count, "node", &format!("scene {i}"))?;
        }
        scenes.push(Scene {
            name: scene.name.unwrap_or_default(),
            nodes: scene.nodes,
        });
    }
    if let Some(default_scene) = raw.scene {
        check_index(default_scene, scenes.len(), "scene", "document")?;
    }

    Ok(SceneDocument {
        asset: AssetInfo {
            version: raw.asset.version,
            generator: raw.asset.generator,
        },
        nodes,
        meshes,
        materials,
        textures,
        images,
        scenes,
        default_scene: raw.scene,
        extensions_used: raw.extensions_used,
        parents,
    })
}

fn build_material(
    index: usize,
    raw: RawMaterial,
    texture_count: usize,
) -> Result<Material, ParseError> {
    let owner = format!("material {index}");
    let mut textures = Vec::new();
    let mut push_texture =
        |channel: TextureChannel, info: Option<RawTextureInfo>| -> Result<(), ParseError> {
            if let Some(info) = info {
                check_index(info.index, texture_count, "texture", &owner)?;
                textures.push(TextureRef {
                    channel,
                    texture: info.index,
                });
            }
            Ok(())
        };

    let pbr = match raw.pbr_metallic_roughness {
        Some(pbr) => {
            push_texture(TextureChannel::BaseColor, pbr.base_color_texture)?;
            push_texture(TextureChannel::MetallicRoughness, pbr.metallic_roughness_texture)?;
            Some(PbrProperties {
                roughness: pbr.roughness_factor.map(|v| clamp_factor(index, "roughness", v)),
                metallic: pbr.metallic_factor.map(|v| clamp_factor(index, "metallic", v)),
                base_color: pbr.base_color_factor,
            })
        }
        None => None,
    };
    push_texture(TextureChannel::Normal, raw.normal_texture)?;
    push_texture(TextureChannel::Occlusion, raw.occlusion_texture)?;
    push_texture(TextureChannel::Emissive, raw.emissive_texture)?;

    Ok(Material {
        name: raw.name.unwrap_or_default(),
        pbr,
        textures,
        extensions: raw.extensions,
    })
}

fn clamp_factor(material: usize, factor: &str, value: f64) -> f64 {
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        tracing::debug!(material, factor, value, "Clamped out-of-range PBR factor");
    }
    clamped
}

/// Recover translation and per-axis scale from a column-major 4x4 matrix.
fn transform_from_matrix(m: &[f64; 16]) -> Transform {
    let column_len = |c: usize| (m[c] * m[c] + m[c + 1] * m[c + 1] + m[c + 2] * m[c + 2]).sqrt();
    Transform {
        translation: [m[12], m[13], m[14]],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [column_len(0), column_len(4), column_len(8)],
    }
}

/// Iterative three-colour DFS over child links.
fn detect_cycles(nodes: &[Node]) -> Result<(), ParseError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        InProgress,
        Done,
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }
        // (node, next child position)
        let mut stack = vec![(start, 0usize)];
        marks[start] = Mark::InProgress;

        while let Some(top) = stack.last_mut() {
            let (node, pos) = *top;
            if let Some(&child) = nodes[node].children.get(pos) {
                top.1 += 1;
                match marks[child] {
                    Mark::InProgress => return Err(ParseError::CyclicGraph { node: child }),
                    Mark::Unvisited => {
                        marks[child] = Mark::InProgress;
                        stack.push((child, 0));
                    }
                    Mark::Done => {}
                }
            } else {
                marks[node] = Mark::Done;
                stack.pop();
            }
        }
    }
    Ok(())
}

fn assign_parents(nodes: &[Node]) -> Result<Vec<Option<usize>>, ParseError> {
    let mut parents = vec![None; nodes.len()];
    for (parent, node) in nodes.iter().enumerate() {
        for &child in &node.children {
            if let Some(existing) = parents[child] {
                return Err(ParseError::malformed(format!(
                    "node {child} has two parents ({existing} and {parent})"
                )));
            }
            parents[child] = Some(parent);
        }
    }
    Ok(parents)
}
