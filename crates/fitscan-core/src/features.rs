//! Closed taxonomy of semantic garment features and their name-pattern tables.
//!
//! Every feature family carries its own positive tokens (per subtype, each
//! with a base confidence), context tokens that corroborate a match, and
//! exclusion tokens that suppress it. Lookup always goes through
//! [`FeatureKind::family`], never through ad hoc string checks elsewhere.

use serde::{Deserialize, Serialize};

/// Feature family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Closure,
    AccessibilityElement,
    Construction,
    SizeVariation,
}

impl FeatureKind {
    /// Families detected purely from entity names by the pattern matcher.
    pub const NAME_MATCHED: [FeatureKind; 3] = [
        FeatureKind::Closure,
        FeatureKind::AccessibilityElement,
        FeatureKind::Construction,
    ];

    pub fn family(self) -> &'static PatternFamily {
        match self {
            FeatureKind::Closure => &CLOSURES,
            FeatureKind::AccessibilityElement => &ACCESSIBILITY_ELEMENTS,
            FeatureKind::Construction => &CONSTRUCTION,
            FeatureKind::SizeVariation => &SIZE_VARIATIONS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureKind::Closure => "closure",
            FeatureKind::AccessibilityElement => "accessibility element",
            FeatureKind::Construction => "construction element",
            FeatureKind::SizeVariation => "size variation",
        }
    }
}

/// Concrete feature subtype. Each belongs to exactly one [`FeatureKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSubtype {
    Zipper,
    Velcro,
    Magnetic,
    Snap,
    Button,
    Toggle,
    Hook,
    Tie,

    ZipperPull,
    PullLoop,
    AdaptiveOpening,
    ElasticWaist,

    Seam,
    Stitch,
    Binding,
    Trim,
    Lining,
    Dart,
    Pleat,
    Hem,
    Sleeve,
    Collar,
    Cuff,
    Waistband,

    /// Explicit size token (XS, M, XL, small, ...)
    SizeLabel,
    /// Numeric size token (size 38, talla 40)
    NumericSize,
    /// Named scale/variant token (scale 1.05, variant 2)
    ScaleVariant,
    /// Unlabelled sibling whose scale differs from its siblings
    GradedScale,
}

impl FeatureSubtype {
    pub fn kind(self) -> FeatureKind {
        use FeatureSubtype::*;
        match self {
            Zipper | Velcro | Magnetic | Snap | Button | Toggle | Hook | Tie => FeatureKind::Closure,
            ZipperPull | PullLoop | AdaptiveOpening | ElasticWaist => {
                FeatureKind::AccessibilityElement
            }
            Seam | Stitch | Binding | Trim | Lining | Dart | Pleat | Hem | Sleeve | Collar
            | Cuff | Waistband => FeatureKind::Construction,
            SizeLabel | NumericSize | ScaleVariant | GradedScale => FeatureKind::SizeVariation,
        }
    }

    /// Declared base confidence from the subtype's pattern table, if it has one.
    pub fn base_confidence(self) -> Option<f64> {
        self.kind()
            .family()
            .subtypes
            .iter()
            .find(|p| p.subtype == self)
            .map(|p| p.base_confidence)
    }
}

/// Positive tokens for one subtype. Multi-word tokens match consecutive words.
#[derive(Debug)]
pub struct SubtypePattern {
    pub subtype: FeatureSubtype,
    pub tokens: &'static [&'static str],
    pub base_confidence: f64,
}

#[derive(Debug)]
pub struct PatternFamily {
    pub kind: FeatureKind,
    pub subtypes: &'static [SubtypePattern],
    pub context: &'static [&'static str],
    pub exclusions: &'static [&'static str],
}

const COMMON_EXCLUSIONS: &[&str] = &[
    "texture",
    "decoration",
    "decorative",
    "decor",
    "reference",
    "ref",
    "pattern",
    "logo",
    "print",
    "shadow",
    "light",
    "camera",
    "avatar",
    "textura",
    "patron",
    "patrón",
    "decoracion",
    "decoración",
    "estampado",
    "sombra",
    "luz",
];

static CLOSURES: PatternFamily = PatternFamily {
    kind: FeatureKind::Closure,
    subtypes: &[
        SubtypePattern {
            subtype: FeatureSubtype::Velcro,
            tokens: &["velcro", "hook and loop", "hookloop"],
            base_confidence: 0.9,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Magnetic,
            tokens: &["magnetic", "magnet", "iman", "imán"],
            base_confidence: 0.9,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Snap,
            tokens: &["snap", "popper", "press stud", "broche"],
            base_confidence: 0.7,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Zipper,
            tokens: &["zip", "zipper", "cremallera"],
            base_confidence: 0.6,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Toggle,
            tokens: &["toggle"],
            base_confidence: 0.5,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Hook,
            tokens: &["hook", "hook and eye"],
            base_confidence: 0.5,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Button,
            tokens: &["button", "buttonhole", "boton", "botón"],
            base_confidence: 0.4,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Tie,
            tokens: &["tie", "drawstring", "drawcord"],
            base_confidence: 0.3,
        },
    ],
    context: &[
        "front", "back", "side", "pocket", "cuff", "collar", "placket", "fly", "center", "neck",
        "closure", "fastener", "frontal", "lateral", "bolsillo",
    ],
    exclusions: COMMON_EXCLUSIONS,
};

static ACCESSIBILITY_ELEMENTS: PatternFamily = PatternFamily {
    kind: FeatureKind::AccessibilityElement,
    subtypes: &[
        SubtypePattern {
            subtype: FeatureSubtype::AdaptiveOpening,
            tokens: &["adaptive", "easy on", "easyon", "one hand", "onehand"],
            base_confidence: 0.85,
        },
        SubtypePattern {
            subtype: FeatureSubtype::ZipperPull,
            tokens: &["puller", "zip pull", "zipper pull", "pull tab", "pulltab"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::ElasticWaist,
            tokens: &["elastic waist", "elasticated", "elastic band"],
            base_confidence: 0.75,
        },
        SubtypePattern {
            subtype: FeatureSubtype::PullLoop,
            tokens: &["pull loop", "finger loop", "dressing loop"],
            base_confidence: 0.7,
        },
    ],
    context: &[
        "front", "back", "side", "large", "grip", "easy", "accessible", "sensory", "seated",
    ],
    exclusions: COMMON_EXCLUSIONS,
};

static CONSTRUCTION: PatternFamily = PatternFamily {
    kind: FeatureKind::Construction,
    subtypes: &[
        SubtypePattern {
            subtype: FeatureSubtype::Seam,
            tokens: &["seam", "seamline", "costura"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Stitch,
            tokens: &["stitch", "topstitch", "puntada"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Binding,
            tokens: &["binding"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Trim,
            tokens: &["trim", "piping"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Lining,
            tokens: &["lining", "forro"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Dart,
            tokens: &["dart", "pinza"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Pleat,
            tokens: &["pleat"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Hem,
            tokens: &["hem", "hemline", "dobladillo"],
            base_confidence: 0.8,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Waistband,
            tokens: &["waistband", "waist", "cintura"],
            base_confidence: 0.7,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Sleeve,
            tokens: &["sleeve", "manga"],
            base_confidence: 0.7,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Collar,
            tokens: &["collar", "cuello"],
            base_confidence: 0.7,
        },
        SubtypePattern {
            subtype: FeatureSubtype::Cuff,
            tokens: &["cuff", "puño"],
            base_confidence: 0.7,
        },
    ],
    context: &[
        "left", "right", "upper", "lower", "main", "body", "inner", "outer", "panel", "front",
        "back", "izquierda", "derecha",
    ],
    exclusions: COMMON_EXCLUSIONS,
};

/// Size labels are regex-driven (see [`crate::sizing`]); only the exclusions
/// are shared through this table.
static SIZE_VARIATIONS: PatternFamily = PatternFamily {
    kind: FeatureKind::SizeVariation,
    subtypes: &[],
    context: &[],
    exclusions: COMMON_EXCLUSIONS,
};

/// Lowercase words of an entity name.
///
/// Splits on any non-alphanumeric character, on lower-to-upper case changes
/// (`frontZipper`) and on letter/digit changes (`button01`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTokens(Vec<String>);

impl NameTokens {
    pub fn new(name: &str) -> Self {
        let mut words = Vec::new();
        let mut current = String::new();
        let mut prev: Option<char> = None;

        for ch in name.chars() {
            if !ch.is_alphanumeric() {
                flush(&mut words, &mut current);
                prev = None;
                continue;
            }
            if let Some(p) = prev {
                let case_break = p.is_lowercase() && ch.is_uppercase();
                let digit_break = p.is_ascii_digit() != ch.is_ascii_digit();
                if case_break || digit_break {
                    flush(&mut words, &mut current);
                }
            }
            current.extend(ch.to_lowercase());
            prev = Some(ch);
        }
        flush(&mut words, &mut current);
        NameTokens(words)
    }

    pub fn words(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `phrase` (one or more space-separated words) occurs as a run
    /// of consecutive words.
    pub fn contains(&self, phrase: &str) -> bool {
        let parts: Vec<&str> = phrase.split(' ').collect();
        if parts.is_empty() || parts.len() > self.0.len() {
            return false;
        }
        self.0
            .windows(parts.len())
            .any(|run| run.iter().zip(&parts).all(|(word, part)| word_matches(word, part)))
    }
}

fn flush(words: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        words.push(std::mem::take(current));
    }
}

const INFLECTIONS: &[&str] = &["s", "es", "ed", "ing"];

/// A word matches a keyword exactly or as a regular inflection (`zippers`,
/// `pleated`, `hemmed`, `tied`). Other suffixes never match, so `hemp` is not
/// a hem.
fn word_matches(word: &str, keyword: &str) -> bool {
    if word == keyword {
        return true;
    }
    let Some(suffix) = word.strip_prefix(keyword) else {
        return false;
    };
    if INFLECTIONS.contains(&suffix) {
        return true;
    }
    if keyword.ends_with('e') && suffix == "d" {
        return true;
    }
    // Doubled final consonant before -ed/-ing
    let mut chars = suffix.chars();
    match (keyword.chars().last(), chars.next()) {
        (Some(last), Some(first)) if last == first && !"aeiou".contains(last) => {
            matches!(chars.as_str(), "ed" | "ing")
        }
        _ => false,
    }
}

/// Outcome of testing one name against one family.
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub subtype: FeatureSubtype,
    pub base_confidence: f64,
    pub token: &'static str,
    pub context: Vec<&'static str>,
}

impl PatternFamily {
    /// Exclusion tokens present in the name.
    pub fn excluded_by(&self, tokens: &NameTokens) -> Option<&'static str> {
        self.exclusions.iter().copied().find(|ex| tokens.contains(ex))
    }

    /// Best subtype match, or `None` when nothing matches or an exclusion hits.
    ///
    /// Ties on base confidence keep the earlier subtype in table order.
    pub fn evaluate(&self, tokens: &NameTokens) -> Option<NameMatch> {
        if self.excluded_by(tokens).is_some() {
            return None;
        }

        let mut best: Option<NameMatch> = None;
        for pattern in self.subtypes {
            let Some(token) = pattern.tokens.iter().copied().find(|t| tokens.contains(t)) else {
                continue;
            };
            let better = best
                .as_ref()
                .map_or(true, |b| pattern.base_confidence > b.base_confidence);
            if better {
                best = Some(NameMatch {
                    subtype: pattern.subtype,
                    base_confidence: pattern.base_confidence,
                    token,
                    context: Vec::new(),
                });
            }
        }

        best.map(|mut m| {
            m.context = self
                .context
                .iter()
                .copied()
                .filter(|c| *c != m.token && tokens.contains(c))
                .collect();
            m
        })
    }
}

/// Independent evidence that contributed to a feature or classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    /// Positive token in the entity's own name
    NamePattern,
    /// Context token next to the positive token
    NamingContext,
    /// Same feature named on the referenced mesh
    MeshName,
    /// Same feature named on a referenced material
    MaterialName,
    /// Metallic/roughness factors
    MaterialPbr,
    /// Texture channel or texture filename
    TextureHint,
    /// Authoring-tool material extension
    ToolExtension,
    /// Scale difference between sibling nodes
    ScaleGeometry,
}

/// Kind of scene entity a feature was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Node,
    Mesh,
    Material,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub index: usize,
    pub name: String,
}

/// A derived feature. Never present in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticFeature {
    pub kind: FeatureKind,
    pub subtype: FeatureSubtype,
    pub source: EntityRef,
    /// Local confidence in [0, 1]
    pub confidence: f64,
    /// Sorted, without repeats
    pub evidence: Vec<EvidenceSource>,
    /// Tokens or labels that triggered the match
    pub matched: Vec<String>,
}

impl SemanticFeature {
    pub fn new(
        subtype: FeatureSubtype,
        source: EntityRef,
        confidence: f64,
        evidence: &[EvidenceSource],
    ) -> Self {
        let mut feature = Self {
            kind: subtype.kind(),
            subtype,
            source,
            confidence: confidence.clamp(0.0, 1.0),
            evidence: Vec::new(),
            matched: Vec::new(),
        };
        for &e in evidence {
            feature.add_evidence(e);
        }
        feature
    }

    pub fn add_evidence(&mut self, source: EvidenceSource) {
        if let Err(pos) = self.evidence.binary_search(&source) {
            self.evidence.insert(pos, source);
        }
    }

    /// Supported by more than one independent source.
    pub fn corroborated(&self) -> bool {
        self.evidence.len() > 1
    }
}
