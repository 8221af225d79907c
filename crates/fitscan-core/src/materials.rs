//! Textile versus hardware classification of scene materials.
//!
//! Three independent signals feed the decision: metallic/roughness factors,
//! texture channel and filename hints, and authoring-tool extensions. Material
//! names never change the class or confidence; they only label the fabric.

use serde::{Deserialize, Serialize};

use crate::config::MaterialConfig;
use crate::features::{EvidenceSource, NameTokens};
use crate::scene::document::{Image, Material, PbrProperties, Texture, TextureChannel};

const CLO_EXTENSION: &str = "CLO_material_properties";
const SHEEN_EXTENSION: &str = "KHR_materials_sheen";

/// Stretch values above this indicate an elastic fabric.
const STRETCH_THRESHOLD: f64 = 100_000.0;

const HARDWARE_HINTS: &[&str] = &[
    "metal", "metallic", "chrome", "brass", "steel", "gold", "silver", "nickel", "zipper", "zip",
    "buckle", "rivet", "grommet", "eyelet",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialClass {
    Textile,
    Hardware,
}

/// Fabric label taken from material or texture names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricType {
    Cotton,
    Wool,
    Silk,
    Linen,
    Denim,
    Leather,
    Polyester,
    Nylon,
    Acrylic,
    Elastane,
    Elastic,
}

const FABRIC_TOKENS: &[(FabricType, &[&str])] = &[
    (FabricType::Cotton, &["cotton", "algodon", "algodón", "coton"]),
    (FabricType::Wool, &["wool", "lana", "laine", "merino", "cashmere"]),
    (FabricType::Silk, &["silk", "seda", "soie", "satin"]),
    (FabricType::Linen, &["linen", "lino"]),
    (FabricType::Denim, &["denim", "jean"]),
    (FabricType::Leather, &["leather", "cuero", "suede"]),
    (FabricType::Polyester, &["polyester", "poliester", "poliéster"]),
    (FabricType::Nylon, &["nylon", "nilon"]),
    (FabricType::Acrylic, &["acrylic", "acrilico"]),
    (FabricType::Elastane, &["elastane", "elastano", "spandex", "lycra"]),
    (FabricType::Elastic, &["elastic", "elastico", "stretch"]),
];

impl FabricType {
    fn from_tokens(tokens: &NameTokens) -> Option<Self> {
        FABRIC_TOKENS
            .iter()
            .find(|(_, words)| words.iter().any(|w| tokens.contains(w)))
            .map(|(fabric, _)| *fabric)
    }
}

/// Surface character read from the roughness factor of textile materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFinish {
    /// Matte, woven or knitted
    Rough,
    /// Satin-like or coated
    Smooth,
    Standard,
}

/// Physical properties exported by CLO in `CLO_material_properties`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StretchProperties {
    pub warp: f64,
    pub weft: f64,
    pub weight: f64,
    pub thickness: f64,
    pub has_stretch: bool,
}

/// One signal's vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassSignal {
    pub class: MaterialClass,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialClassification {
    pub material: usize,
    pub name: String,
    pub class: MaterialClass,
    pub confidence: f64,
    pub fabric_type: Option<FabricType>,
    pub surface: Option<SurfaceFinish>,
    pub stretch: Option<StretchProperties>,
    pub signals: Vec<ClassSignal>,
    /// Signals disagreed on the class
    pub conflicting: bool,
    pub evidence: Vec<EvidenceSource>,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialClassifier {
    config: MaterialConfig,
}

/// Per-source accumulator of the strongest vote for each class.
#[derive(Debug, Default, Clone, Copy)]
struct Votes {
    textile: f64,
    hardware: f64,
}

impl Votes {
    fn cast(&mut self, class: MaterialClass, strength: f64) {
        let slot = match class {
            MaterialClass::Textile => &mut self.textile,
            MaterialClass::Hardware => &mut self.hardware,
        };
        *slot = slot.max(strength);
    }

    fn any(&self) -> bool {
        self.textile > 0.0 || self.hardware > 0.0
    }

    fn signals(&self) -> impl Iterator<Item = ClassSignal> + '_ {
        [
            (MaterialClass::Textile, self.textile),
            (MaterialClass::Hardware, self.hardware),
        ]
        .into_iter()
        .filter(|(_, s)| *s > 0.0)
        .map(|(class, strength)| ClassSignal { class, strength })
    }
}

impl MaterialClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MaterialConfig) -> Self {
        Self { config }
    }

    /// Classify every material. The result is indexed like `materials`.
    pub fn classify(
        &self,
        materials: &[Material],
        textures: &[Texture],
        images: &[Image],
    ) -> Vec<MaterialClassification> {
        materials
            .iter()
            .enumerate()
            .map(|(index, material)| self.classify_one(index, material, textures, images))
            .collect()
    }

    fn classify_one(
        &self,
        index: usize,
        material: &Material,
        textures: &[Texture],
        images: &[Image],
    ) -> MaterialClassification {
        let cfg = &self.config;
        let mut evidence = Vec::new();
        let mut signals = Vec::new();

        let mut pbr_votes = Votes::default();
        let mut surface = None;
        if let Some(pbr) = &material.pbr {
            if let Some((class, strength, finish)) = self.pbr_signal(pbr) {
                pbr_votes.cast(class, strength);
                surface = finish;
            }
        }
        if pbr_votes.any() {
            evidence.push(EvidenceSource::MaterialPbr);
        }

        let (tex_votes, texture_fabric) = self.texture_signal(material, textures, images);
        if tex_votes.any() {
            evidence.push(EvidenceSource::TextureHint);
        }

        let mut ext_votes = Votes::default();
        let mut stretch = None;
        if let Some(props) = material.extensions.get(CLO_EXTENSION) {
            ext_votes.cast(MaterialClass::Textile, cfg.clo_extension_confidence);
            stretch = Some(stretch_properties(props));
        }
        if material.extensions.contains_key(SHEEN_EXTENSION) {
            ext_votes.cast(MaterialClass::Textile, cfg.sheen_extension_confidence);
        }
        if ext_votes.any() {
            evidence.push(EvidenceSource::ToolExtension);
        }

        signals.extend(pbr_votes.signals());
        signals.extend(tex_votes.signals());
        signals.extend(ext_votes.signals());

        let textile = combine(
            [pbr_votes.textile, tex_votes.textile, ext_votes.textile],
            cfg.corroboration_weight,
        );
        let hardware = combine(
            [pbr_votes.hardware, tex_votes.hardware, ext_votes.hardware],
            cfg.corroboration_weight,
        );

        let conflicting = textile > 0.0 && hardware > 0.0;
        let (class, confidence) = if hardware > textile {
            let score = hardware - cfg.conflict_penalty * textile;
            (MaterialClass::Hardware, score.clamp(0.0, 1.0))
        } else {
            let score = textile - cfg.conflict_penalty * hardware;
            (
                MaterialClass::Textile,
                score.max(cfg.default_textile_confidence).clamp(0.0, 1.0),
            )
        };

        let fabric_type = FabricType::from_tokens(&NameTokens::new(&material.name)).or(texture_fabric);
        if class == MaterialClass::Hardware {
            surface = None;
        }

        tracing::trace!(
            material = index,
            ?class,
            confidence,
            conflicting,
            "Classified material"
        );

        MaterialClassification {
            material: index,
            name: material.name.clone(),
            class,
            confidence,
            fabric_type,
            surface,
            stretch,
            signals,
            conflicting,
            evidence,
        }
    }

    fn pbr_signal(&self, pbr: &PbrProperties) -> Option<(MaterialClass, f64, Option<SurfaceFinish>)> {
        let cfg = &self.config;
        let roughness = pbr.roughness.unwrap_or(cfg.default_roughness);
        let metallic = pbr.metallic.unwrap_or(cfg.default_metallic);

        if metallic > cfg.hardware_metallic {
            return Some((MaterialClass::Hardware, cfg.hardware_confidence, None));
        }
        if metallic >= cfg.polished_metallic && roughness <= cfg.polished_roughness {
            return Some((MaterialClass::Hardware, cfg.polished_confidence, None));
        }
        if metallic < cfg.textile_max_metallic {
            let (strength, finish) = if roughness > cfg.rough_roughness {
                (cfg.rough_confidence, SurfaceFinish::Rough)
            } else if roughness < cfg.smooth_roughness {
                (cfg.smooth_confidence, SurfaceFinish::Smooth)
            } else {
                (cfg.standard_confidence, SurfaceFinish::Standard)
            };
            return Some((MaterialClass::Textile, strength, Some(finish)));
        }
        None
    }

    fn texture_signal(
        &self,
        material: &Material,
        textures: &[Texture],
        images: &[Image],
    ) -> (Votes, Option<FabricType>) {
        let cfg = &self.config;
        let mut votes = Votes::default();
        let mut fabric = None;

        for slot in &material.textures {
            let hint_strength = if slot.channel.is_diffuse() {
                cfg.diffuse_hint_confidence
            } else {
                cfg.channel_hint_confidence
            };

            let texture = textures.get(slot.texture);
            let image = texture
                .and_then(|t| t.source)
                .and_then(|s| images.get(s));
            let label = format!(
                "{} {}",
                texture.map(|t| t.name.as_str()).unwrap_or(""),
                image.map(Image::label).unwrap_or("")
            );
            let tokens = NameTokens::new(&label);

            if let Some(found) = FabricType::from_tokens(&tokens) {
                votes.cast(MaterialClass::Textile, hint_strength);
                fabric = fabric.or(Some(found));
            } else if HARDWARE_HINTS.iter().any(|h| tokens.contains(h)) {
                votes.cast(MaterialClass::Hardware, hint_strength);
            } else {
                match slot.channel {
                    TextureChannel::BaseColor => {
                        votes.cast(MaterialClass::Textile, cfg.base_color_presence_confidence)
                    }
                    TextureChannel::Normal => {
                        votes.cast(MaterialClass::Textile, cfg.normal_presence_confidence)
                    }
                    _ => {}
                }
            }
        }

        (votes, fabric)
    }
}

/// Strongest source counts fully; each further source of the same class adds
/// `weight` times its strength. Capped at 1.
fn combine(mut strengths: [f64; 3], weight: f64) -> f64 {
    strengths.sort_by(|a, b| b.total_cmp(a));
    let [strongest, rest @ ..] = strengths;
    let corroboration: f64 = rest.iter().sum();
    (strongest + weight * corroboration).min(1.0)
}

fn stretch_properties(props: &serde_json::Value) -> StretchProperties {
    let read = |key: &str| props.get(key).and_then(serde_json::Value::as_f64).unwrap_or(0.0);
    let warp = read("Stretch-Warp");
    let weft = read("Stretch-Weft");
    StretchProperties {
        warp,
        weft,
        weight: read("Weight"),
        thickness: read("Thickness"),
        has_stretch: warp > STRETCH_THRESHOLD || weft > STRETCH_THRESHOLD,
    }
}
