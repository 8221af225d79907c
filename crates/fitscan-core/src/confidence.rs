//! Category and document-level confidence, plus anomaly flags.

use serde::{Deserialize, Serialize};

use crate::config::{AggregationConfig, AnomalyConfig};
use crate::features::{FeatureKind, NameTokens, SemanticFeature};
use crate::materials::MaterialClassification;

/// The four confidence categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GarmentElements,
    Materials,
    SizeVariations,
    AccessibilityElements,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::GarmentElements,
        Category::Materials,
        Category::SizeVariations,
        Category::AccessibilityElements,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::GarmentElements => "garment elements",
            Category::Materials => "materials",
            Category::SizeVariations => "size variations",
            Category::AccessibilityElements => "accessibility elements",
        }
    }

    /// Whether a feature of this kind counts toward the category.
    /// Closures count both as garment elements and as accessibility elements.
    pub fn includes(self, kind: FeatureKind) -> bool {
        match self {
            Category::GarmentElements => {
                matches!(kind, FeatureKind::Closure | FeatureKind::Construction)
            }
            Category::AccessibilityElements => {
                matches!(kind, FeatureKind::Closure | FeatureKind::AccessibilityElement)
            }
            Category::SizeVariations => kind == FeatureKind::SizeVariation,
            Category::Materials => false,
        }
    }
}

/// Everything the three detectors produced for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSets {
    /// Pattern matcher output
    pub elements: Vec<SemanticFeature>,
    /// Size detector output
    pub sizes: Vec<SemanticFeature>,
    pub materials: Vec<MaterialClassification>,
}

impl CandidateSets {
    pub fn features(&self) -> impl Iterator<Item = &SemanticFeature> {
        self.elements.iter().chain(self.sizes.iter())
    }
}

/// Document facts the anomaly checks compare against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub generator: Option<String>,
    pub node_count: usize,
    pub material_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfidence {
    pub category: Category,
    /// Mean of surviving candidates, 0 when none survive
    pub confidence: f64,
    pub detected: usize,
    pub surviving: usize,
    pub weight: f64,
    /// `weight * confidence`
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceProfile {
    pub garment_elements: CategoryConfidence,
    pub materials: CategoryConfidence,
    pub size_variations: CategoryConfidence,
    pub accessibility_elements: CategoryConfidence,
    /// Sum of the category contributions
    pub weighted: f64,
    /// Sum of anomaly penalties
    pub anomaly_penalty: f64,
    /// `weighted - anomaly_penalty`, clamped to [0, 1]
    pub overall: f64,
}

impl ConfidenceProfile {
    /// Profile of a document with no evidence at all.
    pub fn empty(config: &AggregationConfig) -> Self {
        let zero = |category| category_confidence(category, &[], config);
        Self {
            garment_elements: zero(Category::GarmentElements),
            materials: zero(Category::Materials),
            size_variations: zero(Category::SizeVariations),
            accessibility_elements: zero(Category::AccessibilityElements),
            weighted: 0.0,
            anomaly_penalty: 0.0,
            overall: 0.0,
        }
    }

    pub fn category(&self, category: Category) -> &CategoryConfidence {
        match category {
            Category::GarmentElements => &self.garment_elements,
            Category::Materials => &self.materials,
            Category::SizeVariations => &self.size_variations,
            Category::AccessibilityElements => &self.accessibility_elements,
        }
    }

    pub fn categories(&self) -> [&CategoryConfidence; 4] {
        Category::ALL.map(|c| self.category(c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Exporter is missing or not a known fashion tool
    NonFashionGenerator { generator: Option<String> },
    /// Implausibly many elements of one kind for the node count
    ElementFlood {
        kind: FeatureKind,
        count: usize,
        node_count: usize,
    },
    /// Material count outside the range seen in garment files
    MaterialCountOutlier { count: usize, min: usize, max: usize },
}

/// Non-fatal signal that lowers confidence and requests review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyFlag {
    #[serde(flatten)]
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub penalty: f64,
    pub message: String,
}

/// Merges detector output into a [`ConfidenceProfile`].
///
/// The merge is commutative: candidates are sorted before summation, so the
/// order in which detectors report has no effect on the result.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceAggregator {
    aggregation: AggregationConfig,
    anomalies: AnomalyConfig,
}

impl ConfidenceAggregator {
    pub fn new(aggregation: AggregationConfig, anomalies: AnomalyConfig) -> Self {
        Self {
            aggregation,
            anomalies,
        }
    }

    pub fn aggregate(
        &self,
        candidates: &CandidateSets,
        stats: &DocumentStats,
    ) -> (ConfidenceProfile, Vec<AnomalyFlag>) {
        let confidences = |category: Category| -> Vec<f64> {
            if category == Category::Materials {
                candidates.materials.iter().map(|m| m.confidence).collect()
            } else {
                candidates
                    .features()
                    .filter(|f| category.includes(f.kind))
                    .map(|f| f.confidence)
                    .collect()
            }
        };
        let build = |category| category_confidence(category, &confidences(category), &self.aggregation);

        let garment_elements = build(Category::GarmentElements);
        let materials = build(Category::Materials);
        let size_variations = build(Category::SizeVariations);
        let accessibility_elements = build(Category::AccessibilityElements);

        let mut contributions = [
            garment_elements.contribution,
            materials.contribution,
            size_variations.contribution,
            accessibility_elements.contribution,
        ];
        let weighted = sorted_sum(&mut contributions);

        let flags = self.detect_anomalies(candidates, stats);
        let anomaly_penalty: f64 = flags.iter().map(|f| f.penalty).sum();
        let overall = (weighted - anomaly_penalty).clamp(0.0, 1.0);

        tracing::debug!(
            weighted,
            anomaly_penalty,
            overall,
            flags = flags.len(),
            "Aggregated confidence"
        );

        (
            ConfidenceProfile {
                garment_elements,
                materials,
                size_variations,
                accessibility_elements,
                weighted,
                anomaly_penalty,
                overall,
            },
            flags,
        )
    }

    fn detect_anomalies(&self, candidates: &CandidateSets, stats: &DocumentStats) -> Vec<AnomalyFlag> {
        let cfg = &self.anomalies;
        let mut flags = Vec::new();

        if !self.is_fashion_generator(stats.generator.as_deref()) {
            let shown = stats.generator.as_deref().unwrap_or("<none>");
            flags.push(AnomalyFlag {
                kind: AnomalyKind::NonFashionGenerator {
                    generator: stats.generator.clone(),
                },
                severity: Severity::Medium,
                penalty: cfg.generator_penalty,
                message: format!("generator '{shown}' is not a known fashion-authoring tool"),
            });
        }

        let ceiling = cfg.flood_ratio * stats.node_count as f64;
        for kind in [
            FeatureKind::Closure,
            FeatureKind::AccessibilityElement,
            FeatureKind::Construction,
            FeatureKind::SizeVariation,
        ] {
            let count = candidates.features().filter(|f| f.kind == kind).count();
            if count >= cfg.flood_min_elements && count as f64 > ceiling {
                flags.push(AnomalyFlag {
                    kind: AnomalyKind::ElementFlood {
                        kind,
                        count,
                        node_count: stats.node_count,
                    },
                    severity: Severity::High,
                    penalty: cfg.flood_penalty,
                    message: format!(
                        "{count} {} candidates for {} nodes suggests false positives",
                        kind.label(),
                        stats.node_count
                    ),
                });
            }
        }

        let count = stats.material_count;
        if count < cfg.min_materials || count > cfg.max_materials {
            flags.push(AnomalyFlag {
                kind: AnomalyKind::MaterialCountOutlier {
                    count,
                    min: cfg.min_materials,
                    max: cfg.max_materials,
                },
                severity: Severity::Medium,
                penalty: cfg.material_outlier_penalty,
                message: format!(
                    "{count} materials is outside the typical range {}..={}",
                    cfg.min_materials, cfg.max_materials
                ),
            });
        }

        for flag in &flags {
            tracing::warn!(severity = ?flag.severity, "{}", flag.message);
        }
        flags
    }

    /// Exact word match for short signatures (`clo`), substring for longer ones.
    fn is_fashion_generator(&self, generator: Option<&str>) -> bool {
        let Some(generator) = generator else {
            return false;
        };
        let lowered = generator.to_lowercase();
        let tokens = NameTokens::new(generator);
        self.anomalies.fashion_generators.iter().any(|sig| {
            let sig = sig.to_lowercase();
            if sig.chars().count() >= 5 {
                lowered.contains(&sig)
            } else {
                tokens.words().iter().any(|w| *w == sig)
            }
        })
    }
}

fn category_confidence(
    category: Category,
    confidences: &[f64],
    config: &AggregationConfig,
) -> CategoryConfidence {
    let mut surviving: Vec<f64> = confidences
        .iter()
        .copied()
        .filter(|c| *c >= config.survivor_threshold)
        .collect();
    let confidence = if surviving.is_empty() {
        0.0
    } else {
        let count = surviving.len() as f64;
        sorted_sum(&mut surviving) / count
    };
    let weight = match category {
        Category::GarmentElements => config.weights.garment_elements,
        Category::Materials => config.weights.materials,
        Category::SizeVariations => config.weights.size_variations,
        Category::AccessibilityElements => config.weights.accessibility_elements,
    };
    CategoryConfidence {
        category,
        confidence,
        detected: confidences.len(),
        surviving: surviving.len(),
        weight,
        contribution: weight * confidence,
    }
}

/// Order-independent floating point sum.
fn sorted_sum(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values.iter().sum()
}
