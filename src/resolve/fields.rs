//! Duplicate-field collapsing.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use tracing::info;

use super::integrity::{finish, remove_objects};
use super::report::ImageChanges;
use super::FieldPolicy;
use crate::graph::{ImageAnnotation, ObjectId, VgObject};

/// Larger area first, then smaller id.
fn by_largest_area(a: &VgObject, b: &VgObject) -> Ordering {
    b.area()
        .total_cmp(&a.area())
        .then_with(|| a.object_id.cmp(&b.object_id))
}

/// Topmost first; objects without geometry sort last.
fn by_lowest_y(a: &VgObject, b: &VgObject) -> Ordering {
    let y = |o: &VgObject| o.bbox().map(|b| b.y).unwrap_or(f64::INFINITY);
    y(a).total_cmp(&y(b)).then_with(|| by_largest_area(a, b))
}

impl FieldPolicy {
    /// Picks the object to keep from a group of same-labelled fields.
    pub fn choose<'a>(self, group: &[&'a VgObject]) -> Option<&'a VgObject> {
        let cmp = match self {
            FieldPolicy::LargestArea => by_largest_area,
            FieldPolicy::LowestY => by_lowest_y,
        };
        group.iter().copied().min_by(|a, b| cmp(a, b))
    }
}

/// Keeps one object per field label and drops the rest with their
/// relationships. Labels are compared after folding.
pub fn drop_extra_fields(
    ann: &mut ImageAnnotation,
    field_labels: &[String],
    policy: FieldPolicy,
) -> ImageChanges {
    let wanted: HashSet<&str> = field_labels.iter().map(String::as_str).collect();

    let mut groups: BTreeMap<String, Vec<&VgObject>> = BTreeMap::new();
    for obj in &ann.objects {
        let label = obj.canonical_label();
        if wanted.contains(label.as_str()) {
            groups.entry(label).or_default().push(obj);
        }
    }

    let mut drop: HashSet<ObjectId> = HashSet::new();
    for (label, group) in &groups {
        if group.len() < 2 {
            continue;
        }
        let Some(keep) = policy.choose(group) else {
            continue;
        };
        let keep_id = keep.object_id;
        let removed: Vec<ObjectId> = group
            .iter()
            .map(|o| o.object_id)
            .filter(|id| *id != keep_id)
            .collect();
        info!(
            image_id = %ann.image_id,
            label = %label,
            kept = %keep_id,
            removed = ?removed,
            "collapsed duplicate fields"
        );
        drop.extend(removed);
    }

    let mut changes = remove_objects(ann, &drop);
    finish(ann, &mut changes);
    changes
}
