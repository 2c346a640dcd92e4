//! Sport-context harmonization: field coercion and soccer-dominant cleanup.

use std::collections::HashSet;

use tracing::{debug, info};

use super::integrity::{finish, relabel_objects, remove_objects};
use super::report::ImageChanges;
use super::SoccerDominantStrategy;
use crate::graph::{ImageAnnotation, ObjectId};
use crate::rules::Ruleset;

/// Handles baseball items in a soccer-dominant image.
pub trait SoccerDominantHandler: Sync {
    /// Applies the strategy; relationships of removed objects are pruned.
    fn apply(&self, ann: &mut ImageAnnotation, rules: &Ruleset) -> ImageChanges;
}

/// Removes every baseball item.
#[derive(Clone, Copy, Debug, Default)]
pub struct DropBaseballItems;

/// Rewrites baseball items through the relabel table; unmapped items stay.
#[derive(Clone, Copy, Debug, Default)]
pub struct RelabelBaseballItems;

impl SoccerDominantHandler for DropBaseballItems {
    fn apply(&self, ann: &mut ImageAnnotation, rules: &Ruleset) -> ImageChanges {
        let ids: HashSet<ObjectId> = ann
            .objects
            .iter()
            .filter(|o| rules.classifier.is_baseball_item(&o.canonical_label()))
            .map(|o| o.object_id)
            .collect();

        let changes = remove_objects(ann, &ids);
        if changes.objects_removed > 0 {
            info!(
                image_id = %ann.image_id,
                removed = changes.objects_removed,
                "dropped baseball items from soccer scene"
            );
        }
        changes
    }
}

impl SoccerDominantHandler for RelabelBaseballItems {
    fn apply(&self, ann: &mut ImageAnnotation, rules: &Ruleset) -> ImageChanges {
        let mut changes = ImageChanges::default();
        for obj in ann.objects.iter_mut() {
            let label = obj.canonical_label();
            if !rules.classifier.is_baseball_item(&label) {
                continue;
            }
            if let Some(target) = rules.relabel_map.get(&label) {
                obj.set_label(target.clone());
                changes.objects_relabeled += 1;
            }
        }
        if changes.objects_relabeled > 0 {
            info!(
                image_id = %ann.image_id,
                relabeled = changes.objects_relabeled,
                "relabeled baseball items in soccer scene"
            );
        }
        changes
    }
}

impl SoccerDominantStrategy {
    /// The handler implementing this strategy.
    pub fn handler(self) -> &'static dyn SoccerDominantHandler {
        match self {
            SoccerDominantStrategy::Drop => &DropBaseballItems,
            SoccerDominantStrategy::Relabel => &RelabelBaseballItems,
        }
    }
}

fn coerce_field(ann: &mut ImageAnnotation, from: &str, to: &str, reason: &str) -> usize {
    let n = relabel_objects(ann, from, to);
    if n > 0 {
        info!(image_id = %ann.image_id, from, to, reason, "coerced field label");
    }
    n
}

/// Runs field coercion, soccer-dominant cleanup and the legacy fallback,
/// recomputing the context before each step.
pub fn harmonize_image(
    ann: &mut ImageAnnotation,
    rules: &Ruleset,
    strategy: SoccerDominantStrategy,
) -> ImageChanges {
    let labels = &rules.sport_labels;
    let mut changes = ImageChanges::default();

    let ctx = rules.classifier.classify(&ann.label_set());
    if ctx.must_force_baseball_field {
        changes.objects_relabeled +=
            coerce_field(ann, &labels.soccer_field, &labels.baseball_field, "baseball bat");
    } else if ctx.must_force_tennis_field {
        changes.objects_relabeled +=
            coerce_field(ann, &labels.soccer_field, &labels.tennis_field, "tennis signal");
    }

    let ctx = rules.classifier.classify(&ann.label_set());
    if ctx.is_soccer_dominant {
        changes += strategy.handler().apply(ann, rules);
    }

    let ctx = rules.classifier.classify(&ann.label_set());
    if ctx.fallback_force_baseball_field {
        changes.objects_relabeled += coerce_field(
            ann,
            &labels.soccer_field,
            &labels.baseball_field,
            "baseball signal without soccer signal",
        );
    }

    finish(ann, &mut changes);
    debug!(image_id = %ann.image_id, ?changes, "harmonize pass done");
    changes
}
