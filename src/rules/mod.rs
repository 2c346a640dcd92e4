//! Rule tables and the components compiled from them.
//!
//! [`RuleTables`] is plain data: every synonym map, term set and label the
//! cleaning passes consult. The defaults are the Vietnamese tables of the
//! scene-graph dataset sgclean was written for; a YAML (or JSON) file can
//! override any subset of fields. Tables are compiled once into a
//! [`Ruleset`] and handed to the passes explicitly.

mod context;
mod normalize;

pub use context::{ContextClassifier, SportContext};
pub use normalize::{ImplausibleRule, LabelNormalizer};

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SgcleanError;
use crate::graph::normalize_text;

/// All configurable rule data.
///
/// Missing fields in a rules file fall back to [`RuleTables::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTables {
    /// Raw object label -> canonical object label.
    pub object_synonyms: BTreeMap<String, String>,

    /// Object labels that are garments ("wear" becomes "put on clothing").
    pub clothing_terms: Vec<String>,

    /// Object labels that are footwear ("wear" becomes "put on footwear").
    pub footwear_terms: Vec<String>,

    /// Object labels that are places (fields, goals, nets).
    pub place_terms: Vec<String>,

    /// The goal label; "in" a goal becomes "resting in".
    pub goal_label: String,

    /// Prefix of glove-like labels; "catch" a glove becomes "wear".
    pub glove_prefix: String,

    /// Regex searched in a subject label to decide it is a ball.
    pub ball_subject_pattern: String,

    /// Known bad predicate -> corrected predicate.
    pub predicate_replacements: BTreeMap<String, String>,

    /// Predicate words the contextual rewrite rules produce or react to.
    pub predicates: PredicateVocabulary,

    /// Triplets that are semantically impossible and must be dropped.
    pub implausible_patterns: Vec<ImplausiblePattern>,

    /// Field and equipment labels the context rules key on.
    pub sport_labels: SportLabels,

    /// Labels signalling a soccer scene (balls, goals).
    pub soccer_signals: Vec<String>,

    /// Labels signalling a baseball scene.
    pub baseball_signals: Vec<String>,

    /// Labels signalling a tennis scene.
    pub tennis_signals: Vec<String>,

    /// Baseball and tennis equipment used for the broader
    /// "non-soccer sporting context" test.
    pub sport_items: Vec<String>,

    /// Labels of soccer balls.
    pub soccer_balls: Vec<String>,

    /// Labels of baseball balls.
    pub baseball_balls: Vec<String>,

    /// Baseball item -> replacement label, used by the `relabel` strategy.
    pub relabel_map: BTreeMap<String, String>,

    /// Labels collapsed to a single instance per image by default.
    pub field_labels: Vec<String>,
}

/// Predicate words used by the contextual rewrite rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredicateVocabulary {
    pub wear: String,
    pub put_on_clothing: String,
    pub put_on_footwear: String,
    pub catch: String,
    pub on: String,
    pub on_field: String,
    pub resting_on: String,
    #[serde(rename = "in")]
    pub in_: String,
    pub resting_in: String,
    pub inside: String,
}

impl Default for PredicateVocabulary {
    fn default() -> Self {
        Self {
            wear: "đeo".into(),
            put_on_clothing: "mặc".into(),
            put_on_footwear: "mang".into(),
            catch: "bắt".into(),
            on: "trên".into(),
            on_field: "trên sân".into(),
            resting_on: "nằm trên".into(),
            in_: "trong".into(),
            resting_in: "nằm trong".into(),
            inside: "ở trong".into(),
        }
    }
}

/// A `(subject regex, exact predicate, object regex)` triple.
///
/// Both regexes must match the whole label.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplausiblePattern {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl ImplausiblePattern {
    fn new(subject: &str, predicate: &str, object: &str) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Labels of the three kinds of field plus the baseball bat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SportLabels {
    pub soccer_field: String,
    pub baseball_field: String,
    pub tennis_field: String,
    pub baseball_bat: String,
}

impl Default for SportLabels {
    fn default() -> Self {
        Self {
            soccer_field: "sân bóng đá".into(),
            baseball_field: "sân bóng chày".into(),
            tennis_field: "sân tennis".into(),
            baseball_bat: "gậy bóng chày".into(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for RuleTables {
    fn default() -> Self {
        Self {
            object_synonyms: string_map(&[
                ("giày thể thao", "giày"),
                ("giày sneaker", "giày"),
                ("giày tennis", "giày"),
                ("đồ thể thao", "trang phục thể thao"),
                ("đồng phục thể thao", "trang phục thể thao"),
                ("sân bóng", "sân bóng đá"),
            ]),
            clothing_terms: strings(&[
                "áo",
                "áo đấu",
                "áo thi đấu",
                "đồng phục",
                "trang phục",
                "trang phục thể thao",
                "quần áo",
            ]),
            footwear_terms: strings(&["giày", "giày thể thao", "giày bóng đá", "giày tennis"]),
            place_terms: strings(&[
                "sân bóng đá",
                "sân tennis",
                "sân bóng chày",
                "khung thành",
                "lưới",
                "sân",
            ]),
            goal_label: "khung thành".into(),
            glove_prefix: "găng".into(),
            ball_subject_pattern: "bóng( đá| rổ| tennis)?".into(),
            predicate_replacements: string_map(&[("đánh vung", "vung"), ("vung vợt vào", "vung")]),
            predicates: PredicateVocabulary::default(),
            implausible_patterns: vec![
                ImplausiblePattern::new(".*", "gần", "áo( đấu)?|đồng phục|trang phục( thể thao)?"),
                ImplausiblePattern::new("bóng tennis", "trên", "cầu thủ"),
                ImplausiblePattern::new("găng bóng chày", "trên", "sân bóng đá"),
                ImplausiblePattern::new("sân bóng chày", "trên", "sân bóng đá"),
            ],
            sport_labels: SportLabels::default(),
            soccer_signals: strings(&["bóng đá", "khung thành"]),
            baseball_signals: strings(&["bóng chày", "gậy bóng chày", "găng bóng chày"]),
            tennis_signals: strings(&["bóng tennis", "quả bóng tennis", "vợt tennis", "sân tennis"]),
            sport_items: strings(&[
                "bóng chày",
                "quả bóng chày",
                "gậy bóng chày",
                "găng bóng chày",
                "vợt tennis",
                "quả bóng tennis",
            ]),
            soccer_balls: strings(&["bóng đá", "quả bóng đá"]),
            baseball_balls: strings(&["bóng chày", "quả bóng chày"]),
            relabel_map: BTreeMap::new(),
            field_labels: strings(&["sân bóng đá", "sân bóng chày", "sân tennis"]),
        }
    }
}

impl RuleTables {
    /// Loads tables from a YAML or JSON file, filling gaps with defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, SgcleanError> {
        let text = fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|source| SgcleanError::RulesParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses tables from a YAML (or JSON) string.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Compiled, immutable rules shared by every pass.
#[derive(Clone, Debug)]
pub struct Ruleset {
    pub normalizer: LabelNormalizer,
    pub classifier: ContextClassifier,
    /// Field labels, folded.
    pub sport_labels: SportLabels,
    /// Relabel table for the `relabel` strategy, keys folded.
    pub relabel_map: HashMap<String, String>,
    /// Default field labels, folded.
    pub field_labels: Vec<String>,
}

impl Ruleset {
    /// Compiles rule tables: folds every label and compiles every pattern.
    ///
    /// # Errors
    /// Returns [`SgcleanError::InvalidRulePattern`] for a bad regex.
    pub fn compile(tables: &RuleTables) -> Result<Self, SgcleanError> {
        let sport_labels = SportLabels {
            soccer_field: normalize_text(&tables.sport_labels.soccer_field),
            baseball_field: normalize_text(&tables.sport_labels.baseball_field),
            tennis_field: normalize_text(&tables.sport_labels.tennis_field),
            baseball_bat: normalize_text(&tables.sport_labels.baseball_bat),
        };

        Ok(Self {
            normalizer: LabelNormalizer::new(tables)?,
            classifier: ContextClassifier::new(tables),
            sport_labels,
            relabel_map: tables
                .relabel_map
                .iter()
                .map(|(k, v)| (normalize_text(k), v.trim().to_string()))
                .collect(),
            field_labels: fold_all(&tables.field_labels),
        })
    }

    /// Loads a rules file if given, otherwise uses the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, SgcleanError> {
        let tables = match path {
            Some(p) => RuleTables::from_file(p)?,
            None => RuleTables::default(),
        };
        Self::compile(&tables)
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        // The built-in patterns are covered by `default_tables_compile`.
        Self::compile(&RuleTables::default()).expect("default rule tables compile")
    }
}

/// Folds every label and drops empty ones.
pub(crate) fn fold_all(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .map(|l| normalize_text(l))
        .filter(|l| !l.is_empty())
        .collect()
}
