//! Typed, read-only representation of a parsed garment scene.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// `asset` block of the scene file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetInfo {
    pub version: Option<String>,
    /// Declared exporter, kept verbatim for trust scoring
    pub generator: Option<String>,
}

/// Local transform of a node. Matrices are decomposed at load time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f64; 3],
    pub rotation: [f64; 4],
    pub scale: [f64; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    /// Mean of the three scale axes.
    pub fn mean_scale(&self) -> f64 {
        self.scale.iter().sum::<f64>() / 3.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// May be empty
    pub name: String,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
    pub transform: Transform,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub name: String,
    /// Materials referenced by the mesh primitives, first-use order, no repeats
    pub materials: Vec<usize>,
}

/// Semantic role of a texture slot on a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureChannel {
    BaseColor,
    MetallicRoughness,
    Normal,
    Occlusion,
    Emissive,
}

impl TextureChannel {
    /// Diffuse/base-color textures carry the fabric artwork.
    pub fn is_diffuse(self) -> bool {
        matches!(self, TextureChannel::BaseColor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    pub channel: TextureChannel,
    pub texture: usize,
}

/// Metallic-roughness block. Factors are clamped to [0, 1] at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PbrProperties {
    pub roughness: Option<f64>,
    pub metallic: Option<f64>,
    pub base_color: Option<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub pbr: Option<PbrProperties>,
    pub textures: Vec<TextureRef>,
    /// Vendor extensions keyed by extension name
    pub extensions: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub name: String,
    pub source: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub name: String,
    pub uri: Option<String>,
    pub mime_type: Option<String>,
}

impl Image {
    /// Name if present, otherwise the URI. Used for filename hints.
    pub fn label(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else {
            self.uri.as_deref().unwrap_or("")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub name: String,
    pub nodes: Vec<usize>,
}

/// Root value object. Immutable after [`load`](crate::scene::load).
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDocument {
    pub(crate) asset: AssetInfo,
    pub(crate) nodes: Vec<Node>,
    pub(crate) meshes: Vec<Mesh>,
    pub(crate) materials: Vec<Material>,
    pub(crate) textures: Vec<Texture>,
    pub(crate) images: Vec<Image>,
    pub(crate) scenes: Vec<Scene>,
    pub(crate) default_scene: Option<usize>,
    pub(crate) extensions_used: Vec<String>,
    pub(crate) parents: Vec<Option<usize>>,
}

impl SceneDocument {
    pub fn asset(&self) -> &AssetInfo {
        &self.asset
    }

    pub fn generator(&self) -> Option<&str> {
        self.asset.generator.as_deref()
    }

    pub fn version(&self) -> Option<&str> {
        self.asset.version.as_deref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn mesh(&self, index: usize) -> Option<&Mesh> {
        self.meshes.get(index)
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, index: usize) -> Option<&Material> {
        self.materials.get(index)
    }

    pub fn textures(&self) -> &[Texture] {
        &self.textures
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn default_scene(&self) -> Option<&Scene> {
        self.default_scene.and_then(|i| self.scenes.get(i))
    }

    pub fn extensions_used(&self) -> &[String] {
        &self.extensions_used
    }

    /// Parent of a node, `None` for roots.
    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents.get(node).copied().flatten()
    }

    /// Nodes without a parent, in index order.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.parents[i].is_none())
            .collect()
    }

    /// Pre-order walk of every node, roots in index order.
    pub fn depth_first(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.roots().into_iter().rev().collect();
        while let Some(index) = stack.pop() {
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev().copied());
        }
        order
    }

    /// Materials used by the node's mesh, if any.
    pub fn node_materials(&self, node: usize) -> &[usize] {
        self.nodes
            .get(node)
            .and_then(|n| n.mesh)
            .and_then(|m| self.meshes.get(m))
            .map(|m| m.materials.as_slice())
            .unwrap_or(&[])
    }

    /// Image behind a texture slot, following `texture.source`.
    pub fn texture_image(&self, texture: usize) -> Option<&Image> {
        self.textures
            .get(texture)
            .and_then(|t| t.source)
            .and_then(|s| self.images.get(s))
    }

    /// Whether the document carries anything the engine can reason about.
    pub fn has_structure(&self) -> bool {
        !self.nodes.is_empty() || !self.materials.is_empty()
    }
}
