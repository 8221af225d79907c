//! Name-based detection of closures, accessibility elements and construction
//! details across nodes, meshes and materials.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MatchingConfig;
use crate::features::{
    EntityKind, EntityRef, EvidenceSource, FeatureKind, FeatureSubtype, NameMatch, NameTokens,
    SemanticFeature,
};
use crate::scene::SceneDocument;

/// Finds feature candidates from entity names.
///
/// Each entity yields at most one feature: the highest-confidence subtype
/// across all name-matched families. Nodes are scanned first. A mesh or material whose name repeats a feature
/// already found on a node that references it adds corroborating evidence to
/// that feature instead of producing a second candidate.
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    config: MatchingConfig,
}

type FeatureKey = (usize, FeatureKind, FeatureSubtype);

impl PatternMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn match_document(&self, doc: &SceneDocument) -> Vec<SemanticFeature> {
        let mut features: Vec<SemanticFeature> = Vec::new();
        let mut by_node: BTreeMap<FeatureKey, usize> = BTreeMap::new();
        let mut by_mesh: BTreeMap<FeatureKey, usize> = BTreeMap::new();

        for (index, node) in doc.nodes().iter().enumerate() {
            let Some(tokens) = self.tokens(&node.name) else {
                continue;
            };
            if let Some((kind, found)) = best_match(&tokens) {
                by_node.insert((index, kind, found.subtype), features.len());
                features.push(feature_from_match(
                    EntityKind::Node,
                    index,
                    &node.name,
                    &found,
                ));
            }
        }

        if self.config.scan_meshes {
            for (index, mesh) in doc.meshes().iter().enumerate() {
                let Some(tokens) = self.tokens(&mesh.name) else {
                    continue;
                };
                let users: Vec<usize> = doc
                    .nodes()
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| n.mesh == Some(index))
                    .map(|(i, _)| i)
                    .collect();

                if let Some((kind, found)) = best_match(&tokens) {
                    let mut merged = false;
                    for &node in &users {
                        if let Some(&at) = by_node.get(&(node, kind, found.subtype)) {
                            features[at].add_evidence(EvidenceSource::MeshName);
                            merged = true;
                        }
                    }
                    if !merged {
                        by_mesh.insert((index, kind, found.subtype), features.len());
                        features.push(feature_from_match(
                            EntityKind::Mesh,
                            index,
                            &mesh.name,
                            &found,
                        ));
                    }
                }
            }
        }

        if self.config.scan_materials {
            for (index, material) in doc.materials().iter().enumerate() {
                let Some(tokens) = self.tokens(&material.name) else {
                    continue;
                };
                if let Some((kind, found)) = best_match(&tokens) {
                    let mut merged = false;
                    for (&(node, k, subtype), &at) in &by_node {
                        if k == kind
                            && subtype == found.subtype
                            && doc.node_materials(node).contains(&index)
                        {
                            features[at].add_evidence(EvidenceSource::MaterialName);
                            merged = true;
                        }
                    }
                    for (&(mesh, k, subtype), &at) in &by_mesh {
                        let uses = doc
                            .mesh(mesh)
                            .is_some_and(|m| m.materials.contains(&index));
                        if k == kind && subtype == found.subtype && uses {
                            features[at].add_evidence(EvidenceSource::MaterialName);
                            merged = true;
                        }
                    }
                    if !merged {
                        features.push(feature_from_match(
                            EntityKind::Material,
                            index,
                            &material.name,
                            &found,
                        ));
                    }
                }
            }
        }

        tracing::debug!(count = features.len(), "Pattern matching complete");
        features
    }

    fn tokens(&self, name: &str) -> Option<NameTokens> {
        let trimmed = name.trim();
        if trimmed.chars().count() < self.config.min_name_len {
            return None;
        }
        let tokens = NameTokens::new(trimmed);
        (!tokens.is_empty()).then_some(tokens)
    }
}

/// Strongest match across families; ties keep the earlier family.
fn best_match(tokens: &NameTokens) -> Option<(FeatureKind, NameMatch)> {
    FeatureKind::NAME_MATCHED
        .iter()
        .filter_map(|&kind| kind.family().evaluate(tokens).map(|m| (kind, m)))
        .fold(None, |best, (kind, found)| {
            let keep = best
                .as_ref()
                .is_some_and(|(_, current): &(FeatureKind, NameMatch)| {
                    current.base_confidence >= found.base_confidence
                });
            if keep {
                best
            } else {
                Some((kind, found))
            }
        })
}

fn feature_from_match(
    kind: EntityKind,
    index: usize,
    name: &str,
    found: &NameMatch,
) -> SemanticFeature {
    let mut evidence = vec![EvidenceSource::NamePattern];
    if !found.context.is_empty() {
        evidence.push(EvidenceSource::NamingContext);
    }
    let mut feature = SemanticFeature::new(
        found.subtype,
        EntityRef {
            kind,
            index,
            name: name.to_string(),
        },
        found.base_confidence,
        &evidence,
    );
    feature.matched.push(found.token.to_string());
    feature
        .matched
        .extend(found.context.iter().map(|c| c.to_string()));
    feature
}

/// Broad garment category inferred from node, mesh and scene names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GarmentType {
    Jacket,
    Shirt,
    Trousers,
    Dress,
    Skirt,
    KnitTop,
    Unknown,
}

const GARMENT_TOKENS: &[(GarmentType, &[&str])] = &[
    (
        GarmentType::Jacket,
        &["jacket", "coat", "blazer", "parka", "anorak", "chaqueta", "abrigo"],
    ),
    (GarmentType::Shirt, &["shirt", "blouse", "camisa", "blusa"]),
    (
        GarmentType::Trousers,
        &["trousers", "pants", "jeans", "shorts", "pantalon", "pantalón"],
    ),
    (GarmentType::Dress, &["dress", "gown", "vestido"]),
    (GarmentType::Skirt, &["skirt", "falda"]),
    (
        GarmentType::KnitTop,
        &["tshirt", "tee", "sweater", "jumper", "hoodie", "pullover", "sweatshirt", "camiseta"],
    ),
];

impl GarmentType {
    /// Whether a garment of this type normally carries a closure.
    pub fn expects_closures(self) -> bool {
        !matches!(self, GarmentType::KnitTop)
    }

    /// Most frequently named garment category. Ties keep the earlier type.
    pub fn infer(doc: &SceneDocument) -> Self {
        let mut votes: BTreeMap<GarmentType, usize> = BTreeMap::new();
        let names = doc
            .scenes()
            .iter()
            .map(|s| s.name.as_str())
            .chain(doc.nodes().iter().map(|n| n.name.as_str()))
            .chain(doc.meshes().iter().map(|m| m.name.as_str()));

        for name in names {
            let tokens = NameTokens::new(name);
            for (garment, words) in GARMENT_TOKENS {
                // "t shirt" tokenizes as two words; count it once as a knit top
                let hit = if *garment == GarmentType::Shirt && tokens.contains("t shirt") {
                    false
                } else {
                    words.iter().any(|w| tokens.contains(w))
                };
                if hit {
                    *votes.entry(*garment).or_default() += 1;
                }
            }
            if tokens.contains("t shirt") {
                *votes.entry(GarmentType::KnitTop).or_default() += 1;
            }
        }

        let mut best = GarmentType::Unknown;
        let mut best_votes = 0;
        for (garment, count) in votes {
            if count > best_votes {
                best = garment;
                best_votes = count;
            }
        }
        best
    }
}
