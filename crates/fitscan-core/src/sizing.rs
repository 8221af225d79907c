//! Size variation detection from node names and sibling scale differences.
//!
//! Two independent paths feed each candidate. The name path looks for explicit
//! labels (`XL`, `talla 40`, `scale 1.05`); the geometric path groups sibling
//! nodes sharing a base name and looks for deliberate scale differences.
//! Candidates supported by both paths keep the stronger confidence; single-path
//! candidates are discounted.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::config::SizingConfig;
use crate::features::{
    EntityKind, EntityRef, EvidenceSource, FeatureKind, FeatureSubtype, NameTokens,
    SemanticFeature,
};
use crate::scene::SceneDocument;

const EXPLICIT_PATTERN: &str = r"\b(xxs|xs|s|m|l|xl|xxl|xxxl|[2-5]xl|small|medium|large|petite|chico|mediano|grande)\b";
const NUMERIC_PATTERN: &str = r"\b(?:size|talla)[\s-]*(\d{1,3})\b|\b(\d{1,3})[\s-]*size\b";
const SCALE_PATTERN: &str = r"\b(?:scale|variant|escala)[\s-]*(\d+(?:\.\d+)?)\b";

/// Single letters also used for left/right/mirror suffixes.
const AMBIGUOUS_LABELS: &[&str] = &["s", "m", "l"];

#[derive(Debug, Clone)]
struct NameLabel {
    subtype: FeatureSubtype,
    label: String,
    confidence: f64,
}

#[derive(Debug, Clone)]
pub struct SizeVariationDetector {
    config: SizingConfig,
    explicit: Regex,
    numeric: Regex,
    scale: Regex,
}

impl SizeVariationDetector {
    pub fn new() -> Result<Self, regex::Error> {
        Self::with_config(SizingConfig::default())
    }

    pub fn with_config(config: SizingConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            config,
            explicit: Regex::new(EXPLICIT_PATTERN)?,
            numeric: Regex::new(NUMERIC_PATTERN)?,
            scale: Regex::new(SCALE_PATTERN)?,
        })
    }

    pub fn detect(&self, doc: &SceneDocument) -> Vec<SemanticFeature> {
        let nodes = doc.nodes();
        let mut labels: Vec<Option<NameLabel>> =
            nodes.iter().map(|n| self.name_label(&n.name)).collect();

        // Sibling groups: same parent and same base name.
        let mut groups: BTreeMap<(Option<usize>, String), Vec<usize>> = BTreeMap::new();
        for (index, node) in nodes.iter().enumerate() {
            let base = self.base_name(&node.name);
            if base.is_empty() {
                continue;
            }
            groups.entry((doc.parent(index), base)).or_default().push(index);
        }

        // A lone "l" is more often "left" than "large": keep single-letter
        // labels only when a sibling carries a different size label.
        for (index, slot) in labels.iter_mut().enumerate() {
            let ambiguous = slot
                .as_ref()
                .is_some_and(|l| AMBIGUOUS_LABELS.contains(&l.label.as_str()));
            if !ambiguous {
                continue;
            }
            let base = self.base_name(&nodes[index].name);
            let distinct = groups
                .get(&(doc.parent(index), base))
                .map(|members| {
                    members
                        .iter()
                        .filter_map(|&m| self.name_label(&nodes[m].name))
                        .map(|l| l.label)
                        .collect::<BTreeSet<_>>()
                        .len()
                })
                .unwrap_or(0);
            if distinct < 2 {
                *slot = None;
            }
        }

        let mut geometric = vec![false; nodes.len()];
        for members in groups.values().filter(|m| m.len() >= 2) {
            for &i in members {
                let delta = members
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| relative_delta(nodes[i].transform.scale, nodes[j].transform.scale))
                    .fold(0.0_f64, f64::max);
                if delta > self.config.scale_delta_threshold {
                    geometric[i] = true;
                }
            }
        }

        let mut features = Vec::new();
        for (index, node) in nodes.iter().enumerate() {
            let label = labels[index].take();
            let geo = geometric[index];

            let (subtype, confidence, evidence) = match (&label, geo) {
                (Some(l), true) => (
                    l.subtype,
                    l.confidence.max(self.config.geometric_confidence),
                    vec![EvidenceSource::NamePattern, EvidenceSource::ScaleGeometry],
                ),
                (Some(l), false) => (
                    l.subtype,
                    l.confidence * self.config.single_path_discount,
                    vec![EvidenceSource::NamePattern],
                ),
                (None, true) => (
                    FeatureSubtype::GradedScale,
                    self.config.geometric_confidence * self.config.single_path_discount,
                    vec![EvidenceSource::ScaleGeometry],
                ),
                (None, false) => continue,
            };

            let mut feature = SemanticFeature::new(
                subtype,
                EntityRef {
                    kind: EntityKind::Node,
                    index,
                    name: node.name.clone(),
                },
                confidence,
                &evidence,
            );
            if let Some(l) = label {
                feature.matched.push(l.label);
            }
            features.push(feature);
        }

        tracing::debug!(count = features.len(), "Size variation detection complete");
        features
    }

    fn name_label(&self, name: &str) -> Option<NameLabel> {
        if name.trim().is_empty() {
            return None;
        }
        let family = FeatureKind::SizeVariation.family();
        if family.excluded_by(&NameTokens::new(name)).is_some() {
            return None;
        }
        let text = normalize(name);

        if let Some(caps) = self.explicit.captures(&text) {
            return Some(NameLabel {
                subtype: FeatureSubtype::SizeLabel,
                label: caps[1].to_string(),
                confidence: self.config.explicit_label_confidence,
            });
        }
        if let Some(caps) = self.numeric.captures(&text) {
            let value = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str())?;
            return Some(NameLabel {
                subtype: FeatureSubtype::NumericSize,
                label: value.to_string(),
                confidence: self.config.numeric_label_confidence,
            });
        }
        if let Some(caps) = self.scale.captures(&text) {
            return Some(NameLabel {
                subtype: FeatureSubtype::ScaleVariant,
                label: caps[1].to_string(),
                confidence: self.config.scale_label_confidence,
            });
        }
        None
    }

    /// Name with size tokens, trailing numbering and separators removed.
    fn base_name(&self, name: &str) -> String {
        let text = normalize(name);
        let text = self.numeric.replace_all(&text, " ");
        let text = self.scale.replace_all(&text, " ");
        let text = self.explicit.replace_all(&text, " ");
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lowercase with underscores as word breaks so `\b` sees `shirt_xl`.
fn normalize(name: &str) -> String {
    name.to_lowercase().replace('_', " ")
}

/// Largest per-axis relative difference of scale magnitudes. Sign is
/// ignored so mirrored copies compare equal.
fn relative_delta(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let (x, y) = (x.abs(), y.abs());
            let denom = x.max(y);
            if denom <= f64::EPSILON {
                0.0
            } else {
                (x - y).abs() / denom
            }
        })
        .fold(0.0, f64::max)
}
