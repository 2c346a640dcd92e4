//! Per-image conflict resolution.
//!
//! Each pass takes one [`ImageAnnotation`] by mutable reference, recomputes
//! whatever labels or context it needs from the current objects, and ends by
//! pruning dangling relationships and rebuilding triplets. [`clean_image`]
//! chains them in the documented order:
//!
//! 1. field-label coercion
//! 2. soccer-dominant cleanup ([`SoccerDominantStrategy`])
//! 3. legacy fallback field coercion
//! 4. duplicate-field collapsing ([`FieldPolicy`])
//! 5. mislabeled-ball filtering
//! 6. predicate normalization (optional)
//!
//! preceded by label standardization.

mod fields;
mod harmonize;
pub mod integrity;
mod mislabel;
pub mod report;
mod standardize;

pub use fields::drop_extra_fields;
pub use harmonize::{
    harmonize_image, DropBaseballItems, RelabelBaseballItems, SoccerDominantHandler,
};
pub use mislabel::{cluster_by_iou, filter_mislabeled_balls, MislabelOptions};
pub use report::{CleanCounts, CleanIssue, CleanReport, ImageChanges, IssueCode, Severity};
pub use standardize::{normalize_predicates, standardize_image, standardize_triplets};

use crate::error::SgcleanError;
use crate::graph::{normalize_text, ImageAnnotation};
use crate::rules::Ruleset;

/// Default IoU at which two soccer balls count as duplicates.
pub const DEFAULT_IOU_DUP: f64 = 0.90;

/// Default IoU at which a soccer ball conflicts with a baseball ball.
pub const DEFAULT_IOU_CONFLICT: f64 = 0.0;

/// How baseball items are handled in a soccer-dominant image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SoccerDominantStrategy {
    /// Remove baseball items and their relationships.
    #[default]
    Drop,
    /// Rewrite baseball items through the relabel table.
    Relabel,
}

/// Which object survives when a field label appears more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Largest box; ties go to the smaller object id.
    #[default]
    LargestArea,
    /// Topmost box; ties go to the larger box, then the smaller id.
    LowestY,
}

/// Per-run knobs for the resolver passes.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolveOptions {
    pub strategy: SoccerDominantStrategy,
    pub field_policy: FieldPolicy,
    /// Field labels to collapse; `None` uses the rule tables' set.
    pub field_labels: Option<Vec<String>>,
    pub iou_dup: f64,
    pub iou_conflict: f64,
    pub require_overlap: bool,
    /// Re-derive predicates from the final labels.
    pub fix_predicates: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strategy: SoccerDominantStrategy::default(),
            field_policy: FieldPolicy::default(),
            field_labels: None,
            iou_dup: DEFAULT_IOU_DUP,
            iou_conflict: DEFAULT_IOU_CONFLICT,
            require_overlap: false,
            fix_predicates: false,
        }
    }
}

fn check_threshold(name: &str, value: f64) -> Result<(), SgcleanError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SgcleanError::InvalidOption(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

impl ResolveOptions {
    /// Rejects thresholds outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), SgcleanError> {
        check_threshold("--iou-dup", self.iou_dup)?;
        check_threshold("--iou-conflict", self.iou_conflict)?;
        Ok(())
    }

    /// Folded field labels in effect for this run.
    pub fn field_labels(&self, rules: &Ruleset) -> Vec<String> {
        match &self.field_labels {
            Some(labels) => labels
                .iter()
                .map(|l| normalize_text(l))
                .filter(|l| !l.is_empty())
                .collect(),
            None => rules.field_labels.clone(),
        }
    }

    /// Thresholds for the mislabel pass.
    pub fn mislabel(&self) -> MislabelOptions {
        MislabelOptions {
            iou_dup: self.iou_dup,
            iou_conflict: self.iou_conflict,
            require_overlap: self.require_overlap,
        }
    }

    /// True when require-overlap cannot keep any soccer ball.
    pub fn overlap_always_conflicts(&self) -> bool {
        self.require_overlap && self.iou_conflict <= 0.0
    }
}

/// Runs the full pipeline on one image: standardization, then steps 1 to 6.
///
/// `field_labels` must already be folded (see [`ResolveOptions::field_labels`]).
pub fn clean_image(
    ann: &mut ImageAnnotation,
    rules: &Ruleset,
    opts: &ResolveOptions,
    field_labels: &[String],
) -> ImageChanges {
    let mut changes = standardize_image(ann, &rules.normalizer);
    changes += harmonize_image(ann, rules, opts.strategy);
    changes += drop_extra_fields(ann, field_labels, opts.field_policy);
    changes += filter_mislabeled_balls(ann, &rules.classifier, &opts.mislabel());
    if opts.fix_predicates {
        changes += normalize_predicates(ann, &rules.normalizer);
    }
    changes
}
