//! Sport-scene context detection from the labels present in one image.

use std::collections::HashSet;

use super::{fold_all, RuleTables};
use crate::graph::normalize_text;

/// Context flags of one image. Every flag is a pure function of the label
/// set it was computed from; recompute after any relabel or removal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SportContext {
    pub has_soccer_field: bool,
    pub has_soccer_signal: bool,
    pub has_baseball_signal: bool,
    pub has_tennis_signal: bool,
    /// Broader non-soccer test: a baseball/tennis field or any
    /// baseball/tennis item.
    pub is_baseball_or_tennis_context: bool,
    /// Soccer field, a soccer signal and no baseball signal.
    pub is_soccer_dominant: bool,
    /// Soccer field together with a baseball bat.
    pub must_force_baseball_field: bool,
    /// Soccer field, no bat, and a tennis signal.
    pub must_force_tennis_field: bool,
    /// Soccer field, a baseball signal and no soccer signal.
    pub fallback_force_baseball_field: bool,
}

/// Computes [`SportContext`] flags from label sets.
#[derive(Clone, Debug)]
pub struct ContextClassifier {
    soccer_field: String,
    baseball_field: String,
    tennis_field: String,
    baseball_bat: String,
    soccer_signals: HashSet<String>,
    baseball_signals: HashSet<String>,
    tennis_signals: HashSet<String>,
    sport_items: HashSet<String>,
    soccer_balls: HashSet<String>,
    baseball_balls: HashSet<String>,
}

fn set(labels: &[String]) -> HashSet<String> {
    fold_all(labels).into_iter().collect()
}

fn any_in(labels: &HashSet<String>, signals: &HashSet<String>) -> bool {
    // Signal sets are small; iterate those.
    signals.iter().any(|s| labels.contains(s))
}

impl ContextClassifier {
    /// Builds a classifier from rule tables.
    pub fn new(tables: &RuleTables) -> Self {
        let l = &tables.sport_labels;
        Self {
            soccer_field: normalize_text(&l.soccer_field),
            baseball_field: normalize_text(&l.baseball_field),
            tennis_field: normalize_text(&l.tennis_field),
            baseball_bat: normalize_text(&l.baseball_bat),
            soccer_signals: set(&tables.soccer_signals),
            baseball_signals: set(&tables.baseball_signals),
            tennis_signals: set(&tables.tennis_signals),
            sport_items: set(&tables.sport_items),
            soccer_balls: set(&tables.soccer_balls),
            baseball_balls: set(&tables.baseball_balls),
        }
    }

    /// Classifies an image from its set of canonical labels.
    pub fn classify(&self, labels: &HashSet<String>) -> SportContext {
        let has_soccer_field = labels.contains(&self.soccer_field);
        let has_soccer_signal = any_in(labels, &self.soccer_signals);
        let has_baseball_signal = any_in(labels, &self.baseball_signals);
        let has_tennis_signal = any_in(labels, &self.tennis_signals);
        let has_bat = labels.contains(&self.baseball_bat);

        let is_baseball_or_tennis_context = labels.contains(&self.baseball_field)
            || labels.contains(&self.tennis_field)
            || any_in(labels, &self.sport_items);

        let must_force_baseball_field = has_soccer_field && has_bat;

        SportContext {
            has_soccer_field,
            has_soccer_signal,
            has_baseball_signal,
            has_tennis_signal,
            is_baseball_or_tennis_context,
            is_soccer_dominant: has_soccer_field && has_soccer_signal && !has_baseball_signal,
            must_force_baseball_field,
            must_force_tennis_field: has_soccer_field && !has_bat && has_tennis_signal,
            fallback_force_baseball_field: has_soccer_field
                && has_baseball_signal
                && !has_soccer_signal,
        }
    }

    /// Returns true for baseball items (the soccer-dominant cleanup target).
    pub fn is_baseball_item(&self, label: &str) -> bool {
        self.baseball_signals.contains(label)
    }

    /// Returns true for soccer-ball labels.
    pub fn is_soccer_ball(&self, label: &str) -> bool {
        self.soccer_balls.contains(label)
    }

    /// Returns true for baseball-ball labels.
    pub fn is_baseball_ball(&self, label: &str) -> bool {
        self.baseball_balls.contains(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn classify(items: &[&str]) -> SportContext {
        ContextClassifier::new(&RuleTables::default()).classify(&labels(items))
    }

    #[test]
    fn bat_forces_baseball_field_over_tennis() {
        let ctx = classify(&["sân bóng đá", "gậy bóng chày", "vợt tennis"]);
        assert!(ctx.must_force_baseball_field);
        assert!(!ctx.must_force_tennis_field);
    }

    #[test]
    fn tennis_signal_without_bat_forces_tennis_field() {
        let ctx = classify(&["sân bóng đá", "quả bóng tennis"]);
        assert!(!ctx.must_force_baseball_field);
        assert!(ctx.must_force_tennis_field);
    }

    #[test]
    fn soccer_dominant_requires_no_baseball_signal() {
        assert!(classify(&["sân bóng đá", "bóng đá"]).is_soccer_dominant);
        assert!(classify(&["sân bóng đá", "khung thành", "cầu thủ"]).is_soccer_dominant);
        assert!(!classify(&["sân bóng đá", "bóng đá", "găng bóng chày"]).is_soccer_dominant);
        assert!(!classify(&["bóng đá"]).is_soccer_dominant);
    }

    #[test]
    fn fallback_needs_baseball_without_soccer_signal() {
        assert!(classify(&["sân bóng đá", "bóng chày"]).fallback_force_baseball_field);
        assert!(!classify(&["sân bóng đá", "bóng chày", "khung thành"]).fallback_force_baseball_field);
    }

    #[test]
    fn broad_context_differs_from_narrow_signals() {
        // "quả bóng chày" is a sport item but not a baseball signal.
        let ctx = classify(&["quả bóng chày"]);
        assert!(ctx.is_baseball_or_tennis_context);
        assert!(!ctx.has_baseball_signal);

        let field_only = classify(&["sân tennis"]);
        assert!(field_only.is_baseball_or_tennis_context);
        assert!(field_only.has_tennis_signal);
    }

    #[test]
    fn empty_image_has_no_context() {
        assert_eq!(classify(&[]), SportContext::default());
    }
}
