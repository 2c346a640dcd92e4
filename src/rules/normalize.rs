//! Label and predicate normalization.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use super::{fold_all, PredicateVocabulary, RuleTables};
use crate::error::SgcleanError;
use crate::graph::normalize_text;

/// A compiled implausible-triplet pattern.
#[derive(Clone, Debug)]
pub struct ImplausibleRule {
    subject: Regex,
    predicate: String,
    object: Regex,
}

impl ImplausibleRule {
    fn matches(&self, subject: &str, predicate: &str, object: &str) -> bool {
        predicate == self.predicate && self.subject.is_match(subject) && self.object.is_match(object)
    }
}

/// Canonicalizes object labels and predicates.
#[derive(Clone, Debug)]
pub struct LabelNormalizer {
    synonyms: HashMap<String, String>,
    clothing: HashSet<String>,
    footwear: HashSet<String>,
    places: HashSet<String>,
    goal: String,
    glove_prefix: String,
    ball_subject: Regex,
    replacements: HashMap<String, String>,
    verbs: PredicateVocabulary,
    implausible: Vec<ImplausibleRule>,
}

fn compile(pattern: &str) -> Result<Regex, SgcleanError> {
    Regex::new(pattern).map_err(|source| SgcleanError::InvalidRulePattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compiles a pattern that must match the entire input.
fn compile_full(pattern: &str) -> Result<Regex, SgcleanError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
        SgcleanError::InvalidRulePattern {
            pattern: pattern.to_string(),
            source,
        }
    })
}

fn fold_vocabulary(v: &PredicateVocabulary) -> PredicateVocabulary {
    PredicateVocabulary {
        wear: normalize_text(&v.wear),
        put_on_clothing: normalize_text(&v.put_on_clothing),
        put_on_footwear: normalize_text(&v.put_on_footwear),
        catch: normalize_text(&v.catch),
        on: normalize_text(&v.on),
        on_field: normalize_text(&v.on_field),
        resting_on: normalize_text(&v.resting_on),
        in_: normalize_text(&v.in_),
        resting_in: normalize_text(&v.resting_in),
        inside: normalize_text(&v.inside),
    }
}

impl LabelNormalizer {
    /// Builds a normalizer from rule tables.
    pub fn new(tables: &RuleTables) -> Result<Self, SgcleanError> {
        let implausible = tables
            .implausible_patterns
            .iter()
            .map(|p| {
                Ok(ImplausibleRule {
                    subject: compile_full(&p.subject)?,
                    predicate: normalize_text(&p.predicate),
                    object: compile_full(&p.object)?,
                })
            })
            .collect::<Result<Vec<_>, SgcleanError>>()?;

        Ok(Self {
            synonyms: tables
                .object_synonyms
                .iter()
                .map(|(k, v)| (normalize_text(k), normalize_text(v)))
                .collect(),
            clothing: fold_all(&tables.clothing_terms).into_iter().collect(),
            footwear: fold_all(&tables.footwear_terms).into_iter().collect(),
            places: fold_all(&tables.place_terms).into_iter().collect(),
            goal: normalize_text(&tables.goal_label),
            glove_prefix: normalize_text(&tables.glove_prefix),
            ball_subject: compile(&tables.ball_subject_pattern)?,
            replacements: tables
                .predicate_replacements
                .iter()
                .map(|(k, v)| (normalize_text(k), normalize_text(v)))
                .collect(),
            verbs: fold_vocabulary(&tables.predicates),
            implausible,
        })
    }

    /// Lowercases and trims a label, then maps known synonyms to their
    /// canonical form. Unknown labels pass through.
    pub fn normalize_object_label(&self, raw: &str) -> String {
        let label = normalize_text(raw);
        match self.synonyms.get(&label) {
            Some(canonical) => canonical.clone(),
            None => label,
        }
    }

    /// Rewrites a predicate using the subject/object context.
    ///
    /// Rules are tried in order and the first match wins:
    /// 1. replacement table;
    /// 2. "wear" on clothing / footwear;
    /// 3. "catch" on a glove becomes "wear";
    /// 4. "on" / "on-field" from a ball onto a place becomes "resting on";
    /// 5. "in" a goal becomes "resting in", "in" another place "inside".
    ///
    /// Otherwise the folded predicate is returned unchanged.
    pub fn normalize_predicate(&self, predicate: &str, subject: &str, object: &str) -> String {
        let p = normalize_text(predicate);
        let s = normalize_text(subject);
        let o = self.normalize_object_label(object);
        let v = &self.verbs;

        if let Some(replacement) = self.replacements.get(&p) {
            return replacement.clone();
        }

        if p == v.wear {
            if self.clothing.contains(&o) {
                return v.put_on_clothing.clone();
            }
            if self.footwear.contains(&o) {
                return v.put_on_footwear.clone();
            }
        }

        if p == v.catch && !self.glove_prefix.is_empty() && o.starts_with(&self.glove_prefix) {
            return v.wear.clone();
        }

        if (p == v.on || p == v.on_field) && self.ball_subject.is_match(&s) && self.places.contains(&o)
        {
            return v.resting_on.clone();
        }

        if p == v.in_ {
            if o == self.goal {
                return v.resting_in.clone();
            }
            if self.places.contains(&o) {
                return v.inside.clone();
            }
        }

        p
    }

    /// Returns true if the triplet matches an implausible pattern.
    pub fn is_implausible(&self, subject: &str, predicate: &str, object: &str) -> bool {
        let s = normalize_text(subject);
        let p = normalize_text(predicate);
        let o = normalize_text(object);
        self.implausible.iter().any(|rule| rule.matches(&s, &p, &o))
    }

    /// Normalizes a whole triplet, or returns `None` if it is implausible.
    pub fn standardize_triplet(
        &self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> Option<(String, String, String)> {
        let s = normalize_text(subject);
        let o = self.normalize_object_label(object);
        let mut p = self.normalize_predicate(predicate, &s, &o);

        if self.is_implausible(&s, &p, &o) {
            return None;
        }

        if p == self.verbs.on_field {
            p = self.verbs.resting_on.clone();
        }

        Some((s, p, o))
    }
}
