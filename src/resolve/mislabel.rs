//! Removal of soccer balls mislabelled in baseball or tennis scenes.

use std::collections::HashSet;

use tracing::{debug, info};

use super::integrity::{finish, remove_objects};
use super::report::ImageChanges;
use crate::graph::{ImageAnnotation, ObjectId, VgObject};
use crate::rules::ContextClassifier;

/// Thresholds for [`filter_mislabeled_balls`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MislabelOptions {
    /// Soccer balls with IoU at or above this are one duplicate cluster.
    pub iou_dup: f64,
    /// With `require_overlap`, a soccer ball is dropped when its IoU with a
    /// baseball ball reaches this value.
    pub iou_conflict: f64,
    pub require_overlap: bool,
}

/// Groups objects into clusters connected by IoU >= `threshold`.
///
/// Clusters are listed in order of their first member; members keep input
/// order.
pub fn cluster_by_iou(objects: &[&VgObject], threshold: f64) -> Vec<Vec<usize>> {
    let n = objects.len();
    let mut seen = vec![false; n];
    let mut clusters = Vec::new();

    for start in 0..n {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        let mut stack = vec![start];
        let mut members = Vec::new();
        while let Some(i) = stack.pop() {
            members.push(i);
            for j in 0..n {
                if !seen[j] && objects[i].iou(objects[j]) >= threshold {
                    seen[j] = true;
                    stack.push(j);
                }
            }
        }
        members.sort_unstable();
        clusters.push(members);
    }
    clusters
}

/// Largest box of a cluster; ties go to the earliest member.
fn representative(objects: &[&VgObject], members: &[usize]) -> usize {
    let mut best = members[0];
    for &i in &members[1..] {
        if objects[i].area() > objects[best].area() {
            best = i;
        }
    }
    best
}

/// Drops soccer-ball objects from baseball/tennis scenes without a soccer
/// field.
///
/// Soccer balls are first deduplicated by IoU, keeping the largest box of
/// each cluster. Survivors are then dropped unconditionally, or, with
/// `require_overlap` and at least one baseball ball present, only when they
/// overlap one.
pub fn filter_mislabeled_balls(
    ann: &mut ImageAnnotation,
    classifier: &ContextClassifier,
    opts: &MislabelOptions,
) -> ImageChanges {
    let mut changes = ImageChanges::default();
    let ctx = classifier.classify(&ann.label_set());
    if !ctx.is_baseball_or_tennis_context || ctx.has_soccer_field {
        finish(ann, &mut changes);
        return changes;
    }

    let soccer: Vec<&VgObject> = ann
        .objects
        .iter()
        .filter(|o| classifier.is_soccer_ball(&o.canonical_label()))
        .collect();
    let baseball: Vec<&VgObject> = ann
        .objects
        .iter()
        .filter(|o| classifier.is_baseball_ball(&o.canonical_label()))
        .collect();

    let mut drop: HashSet<ObjectId> = HashSet::new();
    let mut duplicates = 0usize;
    for members in cluster_by_iou(&soccer, opts.iou_dup) {
        let keep = representative(&soccer, &members);
        for &i in &members {
            if i != keep {
                drop.insert(soccer[i].object_id);
                duplicates += 1;
            }
        }

        // Without any baseball ball to compare against, the overlap
        // requirement is waived.
        let kept = soccer[keep];
        let conflicts = !opts.require_overlap
            || baseball.is_empty()
            || baseball.iter().any(|b| kept.iou(b) >= opts.iou_conflict);
        if conflicts {
            drop.insert(kept.object_id);
        }
    }

    if !drop.is_empty() {
        let mut removed: Vec<ObjectId> = drop.iter().copied().collect();
        removed.sort_unstable();
        info!(
            image_id = %ann.image_id,
            duplicates,
            removed = ?removed,
            "removed mislabeled soccer balls"
        );
    } else {
        debug!(image_id = %ann.image_id, "no mislabeled soccer balls");
    }

    changes += remove_objects(ann, &drop);
    finish(ann, &mut changes);
    changes
}
