//! fitscan-core - contextual inference and confidence scoring for garment scenes.
//!
//! This crate turns a glTF garment scene into calibrated confidence values and
//! three 0-100 scores:
//! - **PatternMatcher**: closures, accessibility elements and construction
//!   details from node, mesh and material names
//! - **MaterialClassifier**: textile vs hardware from PBR factors, texture
//!   hints and authoring-tool extensions
//! - **SizeVariationDetector**: size labels and graded sibling scales
//! - **ConfidenceAggregator**: category and overall confidence, anomaly flags
//! - **ScoreCalculator**: inclusivity, accessibility and sustainability
//! - **ChecklistGenerator**: prioritized manual-validation items
//!
//! # Example
//!
//! ```no_run
//! use fitscan_core::Analyzer;
//!
//! let bytes = std::fs::read("jacket.gltf").unwrap();
//! let analyzer = Analyzer::new().unwrap();
//! let result = analyzer.analyze_bytes(&bytes).unwrap();
//! println!(
//!     "Confidence {:.2}, inclusivity {}",
//!     result.confidence.overall, result.scores.inclusivity.score
//! );
//! ```

pub mod analysis;
pub mod checklist;
pub mod confidence;
pub mod config;
pub mod error;
pub mod features;
pub mod matcher;
pub mod materials;
pub mod scene;
pub mod scoring;
pub mod sizing;

// Re-export commonly used types
pub use analysis::{AnalysisResult, Analyzer, DocumentSummary};
pub use checklist::{ChecklistGenerator, Priority, ReviewerRole, ValidationChecklistItem};
pub use confidence::{
    AnomalyFlag, AnomalyKind, CandidateSets, Category, ConfidenceAggregator, ConfidenceProfile,
    DocumentStats,
};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, ParseError};
pub use features::{EvidenceSource, FeatureKind, FeatureSubtype, SemanticFeature};
pub use matcher::{GarmentType, PatternMatcher};
pub use materials::{MaterialClass, MaterialClassification, MaterialClassifier};
pub use scene::{LoadOutcome, SceneDocument, UnsupportedDocument, UnsupportedReason};
pub use scoring::{ScoreBreakdown, ScoreCalculator, ScoreInputs};
pub use sizing::SizeVariationDetector;
