//! Analyzer that runs every detector over a document and folds the results
//! into scores and a checklist.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::checklist::{self, ChecklistGenerator, ValidationChecklistItem};
use crate::confidence::{
    AnomalyFlag, CandidateSets, ConfidenceAggregator, ConfidenceProfile, DocumentStats,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, ParseError};
use crate::features::{EntityKind, EvidenceSource, FeatureKind, SemanticFeature};
use crate::matcher::{GarmentType, PatternMatcher};
use crate::materials::{MaterialClass, MaterialClassification, MaterialClassifier};
use crate::scene::{self, LoadOutcome, SceneDocument, UnsupportedDocument, UnsupportedReason};
use crate::scoring::{ScoreBreakdown, ScoreCalculator, ScoreInputs};
use crate::sizing::SizeVariationDetector;

/// Counts and metadata of the analyzed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub version: Option<String>,
    pub generator: Option<String>,
    pub node_count: usize,
    pub mesh_count: usize,
    pub material_count: usize,
    pub texture_count: usize,
    pub image_count: usize,
    pub extensions_used: Vec<String>,
    pub garment_type: GarmentType,
    /// Set when the document was scored on the baseline path
    pub unsupported: Option<UnsupportedReason>,
}

/// Complete result of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: DocumentSummary,
    pub features: Vec<SemanticFeature>,
    pub materials: Vec<MaterialClassification>,
    pub confidence: ConfidenceProfile,
    pub anomalies: Vec<AnomalyFlag>,
    pub scores: ScoreBreakdown,
    pub checklist: Vec<ValidationChecklistItem>,
    pub checklist_minutes: u32,
    pub recommendations: Vec<String>,
    /// Every evidence source that contributed anywhere in the result
    pub evidence_sources: Vec<EvidenceSource>,
}

/// Runs the detectors, the aggregator, the calculator and the checklist
/// generator. Holds no per-document state, so one analyzer can serve any
/// number of documents.
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: EngineConfig,
    matcher: PatternMatcher,
    classifier: MaterialClassifier,
    sizer: SizeVariationDetector,
    aggregator: ConfidenceAggregator,
    calculator: ScoreCalculator,
    checklist: ChecklistGenerator,
}

impl Analyzer {
    /// Create an analyzer with the default configuration.
    pub fn new() -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::default())
    }

    /// Create an analyzer with a validated custom configuration.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            matcher: PatternMatcher::with_config(config.matching.clone()),
            classifier: MaterialClassifier::with_config(config.materials.clone()),
            sizer: SizeVariationDetector::with_config(config.sizing.clone())?,
            aggregator: ConfidenceAggregator::new(
                config.aggregation.clone(),
                config.anomalies.clone(),
            ),
            calculator: ScoreCalculator::new(config.scoring.clone()),
            checklist: ChecklistGenerator::new(config.checklist.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse raw bytes and analyze them. Malformed input is an error;
    /// well-formed input without scene structure gets baseline scores.
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult, ParseError> {
        match scene::inspect(bytes)? {
            LoadOutcome::Scene(doc) => Ok(self.analyze(&doc)),
            LoadOutcome::Unsupported(doc) => Ok(self.analyze_unsupported(&doc)),
        }
    }

    pub fn analyze(&self, doc: &SceneDocument) -> AnalysisResult {
        if !doc.has_structure() {
            let unsupported = UnsupportedDocument {
                reason: UnsupportedReason::EmptyScene,
                byte_len: 0,
                generator: doc.generator().map(str::to_string),
            };
            return self.analyze_unsupported(&unsupported);
        }

        tracing::info!(
            nodes = doc.nodes().len(),
            meshes = doc.meshes().len(),
            materials = doc.materials().len(),
            "Analyzing scene"
        );

        let elements = self.matcher.match_document(doc);
        let sizes = self.sizer.detect(doc);
        let materials = self
            .classifier
            .classify(doc.materials(), doc.textures(), doc.images());

        let mut candidates = CandidateSets {
            elements,
            sizes,
            materials,
        };
        corroborate_hardware(&mut candidates.elements, doc, &candidates.materials);

        let stats = DocumentStats {
            generator: doc.generator().map(str::to_string),
            node_count: doc.nodes().len(),
            material_count: doc.materials().len(),
        };
        let (confidence, anomalies) = self.aggregator.aggregate(&candidates, &stats);

        let scores = self.calculator.calculate(ScoreInputs {
            overall_confidence: confidence.overall,
            size_variation_count: confidence.size_variations.surviving,
            accessibility_feature_count: confidence.accessibility_elements.surviving,
            material_count: candidates.materials.len(),
        });

        let CandidateSets {
            elements,
            sizes,
            materials,
        } = candidates;
        let mut features = elements;
        features.extend(sizes);

        let garment_type = GarmentType::infer(doc);
        let checklist =
            self.checklist
                .generate(&scores, &confidence, &anomalies, &features, garment_type);
        let recommendations =
            checklist::recommendations(&scores, &confidence, &anomalies, &features);
        let evidence_sources = collect_evidence(&features, &materials);

        tracing::info!(
            overall = confidence.overall,
            inclusivity = scores.inclusivity.score,
            accessibility = scores.accessibility.score,
            sustainability = scores.sustainability.score,
            checklist = checklist.len(),
            "Analysis complete"
        );

        AnalysisResult {
            summary: DocumentSummary {
                version: doc.version().map(str::to_string),
                generator: doc.generator().map(str::to_string),
                node_count: doc.nodes().len(),
                mesh_count: doc.meshes().len(),
                material_count: doc.materials().len(),
                texture_count: doc.textures().len(),
                image_count: doc.images().len(),
                extensions_used: doc.extensions_used().to_vec(),
                garment_type,
                unsupported: None,
            },
            checklist_minutes: checklist::total_minutes(&checklist),
            features,
            materials,
            confidence,
            anomalies,
            scores,
            checklist,
            recommendations,
            evidence_sources,
        }
    }

    /// Baseline result for input without derivable structure.
    pub fn analyze_unsupported(&self, doc: &UnsupportedDocument) -> AnalysisResult {
        tracing::warn!(
            reason = doc.reason.describe(),
            bytes = doc.byte_len,
            "No scene structure, using baseline scores"
        );

        let scores = self.calculator.baseline(doc.reason);
        let confidence = ConfidenceProfile::empty(&self.config.aggregation);
        let checklist = self.checklist.baseline(doc.reason);
        let recommendations = checklist::recommendations(&scores, &confidence, &[], &[]);

        AnalysisResult {
            summary: DocumentSummary {
                version: None,
                generator: doc.generator.clone(),
                node_count: 0,
                mesh_count: 0,
                material_count: 0,
                texture_count: 0,
                image_count: 0,
                extensions_used: Vec::new(),
                garment_type: GarmentType::Unknown,
                unsupported: Some(doc.reason),
            },
            features: Vec::new(),
            materials: Vec::new(),
            confidence,
            anomalies: Vec::new(),
            scores,
            checklist_minutes: checklist::total_minutes(&checklist),
            checklist,
            recommendations,
            evidence_sources: Vec::new(),
        }
    }
}

/// A closure on a node whose material classifies as hardware gains PBR evidence.
fn corroborate_hardware(
    features: &mut [SemanticFeature],
    doc: &SceneDocument,
    materials: &[MaterialClassification],
) {
    let is_hardware = |index: usize| {
        materials
            .get(index)
            .is_some_and(|m| m.class == MaterialClass::Hardware)
    };

    for feature in features.iter_mut().filter(|f| f.kind == FeatureKind::Closure) {
        let hardware = match feature.source.kind {
            EntityKind::Node => doc
                .node_materials(feature.source.index)
                .iter()
                .any(|&m| is_hardware(m)),
            EntityKind::Mesh => doc
                .mesh(feature.source.index)
                .is_some_and(|mesh| mesh.materials.iter().any(|&m| is_hardware(m))),
            EntityKind::Material => is_hardware(feature.source.index),
        };
        if hardware {
            feature.add_evidence(EvidenceSource::MaterialPbr);
        }
    }
}

fn collect_evidence(
    features: &[SemanticFeature],
    materials: &[MaterialClassification],
) -> Vec<EvidenceSource> {
    features
        .iter()
        .flat_map(|f| f.evidence.iter().copied())
        .chain(materials.iter().flat_map(|m| m.evidence.iter().copied()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
