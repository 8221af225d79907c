//! Prioritized manual-validation checklist and improvement recommendations.

use serde::{Deserialize, Serialize};

use crate::confidence::{AnomalyFlag, AnomalyKind, Category, ConfidenceProfile};
use crate::config::ChecklistConfig;
use crate::features::{FeatureKind, FeatureSubtype, SemanticFeature};
use crate::matcher::GarmentType;
use crate::scene::UnsupportedReason;
use crate::scoring::{ScoreBasis, ScoreBreakdown};

const MAX_RECOMMENDATIONS: usize = 6;

/// Ordered so that sorting puts `High` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistCategory {
    GarmentElements,
    Materials,
    SizeVariations,
    AccessibilityElements,
    Anomaly,
    Scoring,
    FullReview,
}

impl From<Category> for ChecklistCategory {
    fn from(category: Category) -> Self {
        match category {
            Category::GarmentElements => ChecklistCategory::GarmentElements,
            Category::Materials => ChecklistCategory::Materials,
            Category::SizeVariations => ChecklistCategory::SizeVariations,
            Category::AccessibilityElements => ChecklistCategory::AccessibilityElements,
        }
    }
}

/// Who should perform a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewerRole {
    GarmentTechnologist,
    MaterialsSpecialist,
    AccessibilitySpecialist,
    SizingSpecialist,
}

impl ReviewerRole {
    fn for_category(category: Category) -> Self {
        match category {
            Category::GarmentElements => ReviewerRole::GarmentTechnologist,
            Category::Materials => ReviewerRole::MaterialsSpecialist,
            Category::SizeVariations => ReviewerRole::SizingSpecialist,
            Category::AccessibilityElements => ReviewerRole::AccessibilitySpecialist,
        }
    }

    fn for_feature(kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Closure | FeatureKind::AccessibilityElement => {
                ReviewerRole::AccessibilitySpecialist
            }
            FeatureKind::Construction => ReviewerRole::GarmentTechnologist,
            FeatureKind::SizeVariation => ReviewerRole::SizingSpecialist,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationChecklistItem {
    pub category: ChecklistCategory,
    pub priority: Priority,
    pub description: String,
    pub effort_minutes: u32,
    pub reviewer: ReviewerRole,
}

/// Total estimated review effort.
pub fn total_minutes(items: &[ValidationChecklistItem]) -> u32 {
    items.iter().map(|i| i.effort_minutes).sum()
}

/// Feature family whose absence is worth a reviewer's attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Closures,
    SizeVariations,
    Construction,
    Materials,
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistGenerator {
    config: ChecklistConfig,
}

impl ChecklistGenerator {
    pub fn new(config: ChecklistConfig) -> Self {
        Self { config }
    }

    /// Build the checklist. The same inputs always yield the same items in
    /// the same order: high before medium before low, generation order within
    /// a priority.
    pub fn generate(
        &self,
        scores: &ScoreBreakdown,
        profile: &ConfidenceProfile,
        flags: &[AnomalyFlag],
        features: &[SemanticFeature],
        garment: GarmentType,
    ) -> Vec<ValidationChecklistItem> {
        if let ScoreBasis::Baseline { reason } = scores.basis {
            return self.baseline(reason);
        }

        let cfg = &self.config;
        let mut items = Vec::new();

        for category in profile.categories() {
            if category.confidence < cfg.low_confidence_threshold {
                items.push(ValidationChecklistItem {
                    category: category.category.into(),
                    priority: Priority::High,
                    description: format!(
                        "Verify {}: confidence {:.2} from {} of {} candidates",
                        category.category.label(),
                        category.confidence,
                        category.surviving,
                        category.detected
                    ),
                    effort_minutes: cfg.low_confidence_minutes,
                    reviewer: ReviewerRole::for_category(category.category),
                });
            }
        }

        for flag in flags {
            let reviewer = match flag.kind {
                AnomalyKind::MaterialCountOutlier { .. } => ReviewerRole::MaterialsSpecialist,
                _ => ReviewerRole::GarmentTechnologist,
            };
            items.push(ValidationChecklistItem {
                category: ChecklistCategory::Anomaly,
                priority: Priority::High,
                description: format!("Investigate anomaly: {}", flag.message),
                effort_minutes: cfg.anomaly_minutes,
                reviewer,
            });
        }

        for family in expected_families(garment) {
            let detected = match family {
                Family::Closures => count_kind(features, FeatureKind::Closure),
                Family::SizeVariations => count_kind(features, FeatureKind::SizeVariation),
                Family::Construction => count_kind(features, FeatureKind::Construction),
                Family::Materials => profile.materials.detected,
            };
            if detected > 0 {
                continue;
            }
            let (category, reviewer, what) = match family {
                Family::Closures => (
                    ChecklistCategory::GarmentElements,
                    ReviewerRole::AccessibilitySpecialist,
                    "closures",
                ),
                Family::SizeVariations => (
                    ChecklistCategory::SizeVariations,
                    ReviewerRole::SizingSpecialist,
                    "size variations",
                ),
                Family::Construction => (
                    ChecklistCategory::GarmentElements,
                    ReviewerRole::GarmentTechnologist,
                    "construction details",
                ),
                Family::Materials => (
                    ChecklistCategory::Materials,
                    ReviewerRole::MaterialsSpecialist,
                    "materials",
                ),
            };
            items.push(ValidationChecklistItem {
                category,
                priority: Priority::Medium,
                description: format!("No {what} detected; confirm whether the garment has any"),
                effort_minutes: cfg.missing_family_minutes,
                reviewer,
            });
        }

        if let Some(term) = scores.sustainability.terms.iter().find(|t| t.label == "materials") {
            if term.value >= cfg.material_dominance_points {
                items.push(ValidationChecklistItem {
                    category: ChecklistCategory::Scoring,
                    priority: Priority::Medium,
                    description: format!(
                        "Sustainability gains {:.0} points from {} materials alone; verify the material count reflects real fabric choices",
                        term.value, term.input
                    ),
                    effort_minutes: cfg.coupling_minutes,
                    reviewer: ReviewerRole::MaterialsSpecialist,
                });
            }
        }

        for feature in features {
            items.push(ValidationChecklistItem {
                category: feature_category(feature.kind),
                priority: Priority::Low,
                description: format!(
                    "Confirm {} '{}' ({:?}, confidence {:.2})",
                    feature.kind.label(),
                    feature.source.name,
                    feature.subtype,
                    feature.confidence
                ),
                effort_minutes: cfg.confirm_minutes,
                reviewer: ReviewerRole::for_feature(feature.kind),
            });
        }

        items.sort_by_key(|i| i.priority);
        items
    }

    /// Single full-review item for documents scored on the baseline path.
    pub fn baseline(&self, reason: UnsupportedReason) -> Vec<ValidationChecklistItem> {
        vec![ValidationChecklistItem {
            category: ChecklistCategory::FullReview,
            priority: Priority::High,
            description: format!(
                "Insufficient structural evidence ({}); full manual validation required",
                reason.describe()
            ),
            effort_minutes: self.config.baseline_minutes,
            reviewer: ReviewerRole::GarmentTechnologist,
        }]
    }
}

fn expected_families(garment: GarmentType) -> Vec<Family> {
    let mut families = Vec::with_capacity(4);
    if garment.expects_closures() {
        families.push(Family::Closures);
    }
    families.extend([Family::SizeVariations, Family::Construction, Family::Materials]);
    families
}

fn count_kind(features: &[SemanticFeature], kind: FeatureKind) -> usize {
    features.iter().filter(|f| f.kind == kind).count()
}

fn feature_category(kind: FeatureKind) -> ChecklistCategory {
    match kind {
        FeatureKind::Closure | FeatureKind::Construction => ChecklistCategory::GarmentElements,
        FeatureKind::AccessibilityElement => ChecklistCategory::AccessibilityElements,
        FeatureKind::SizeVariation => ChecklistCategory::SizeVariations,
    }
}

/// Short improvement suggestions, most important first, at most six.
pub fn recommendations(
    scores: &ScoreBreakdown,
    profile: &ConfidenceProfile,
    flags: &[AnomalyFlag],
    features: &[SemanticFeature],
) -> Vec<String> {
    if let ScoreBasis::Baseline { reason } = scores.basis {
        return vec![format!(
            "Provide a glTF scene export with named nodes and materials ({})",
            reason.describe()
        )];
    }

    let mut out = Vec::new();

    if profile.overall < 0.5 {
        out.push(format!(
            "Overall confidence is {:.2}; validate the detected elements manually before publishing these scores",
            profile.overall
        ));
    }
    if profile.size_variations.surviving == 0 {
        out.push(
            "No size variants detected; grading additional sizes would improve inclusivity"
                .to_string(),
        );
    }
    if profile.accessibility_elements.surviving < 3 {
        out.push(
            "Fewer than three accessibility features detected; consider magnetic or hook-and-loop closures"
                .to_string(),
        );
    }
    let closures: Vec<&SemanticFeature> = features
        .iter()
        .filter(|f| f.kind == FeatureKind::Closure)
        .collect();
    if !closures.is_empty() && closures.iter().all(|f| f.subtype == FeatureSubtype::Button) {
        out.push(
            "Only button closures detected; buttons are the hardest closure to operate with limited dexterity"
                .to_string(),
        );
    }
    if !flags.is_empty() {
        out.push(format!(
            "Resolve the {} anomaly flag(s) raised for this file",
            flags.len()
        ));
    }
    for flag in flags {
        if let AnomalyKind::MaterialCountOutlier { count, max, .. } = flag.kind {
            if count > max {
                out.push(format!(
                    "Consolidate the {count} materials; a high material count inflates the sustainability score"
                ));
            }
        }
    }

    out.truncate(MAX_RECOMMENDATIONS);
    out
}
