//! Keeps relationships and derived triplets consistent with the object set.
//!
//! Every pass funnels its removals and relabels through this module and ends
//! with [`finish`], so no pass can leave a dangling relationship or a stale
//! triplet behind.

use std::collections::HashSet;

use super::report::ImageChanges;
use crate::graph::{ImageAnnotation, ObjectId, Triplet};

/// Removes objects by id together with every relationship touching them.
pub fn remove_objects(ann: &mut ImageAnnotation, ids: &HashSet<ObjectId>) -> ImageChanges {
    if ids.is_empty() {
        return ImageChanges::default();
    }

    let objects_before = ann.objects.len();
    ann.objects.retain(|o| !ids.contains(&o.object_id));

    let rels_before = ann.relationships.len();
    ann.relationships.retain(|r| !r.touches(ids));

    ImageChanges {
        objects_removed: objects_before - ann.objects.len(),
        relationships_removed: rels_before - ann.relationships.len(),
        ..Default::default()
    }
}

/// Rewrites the canonical label of every object labelled `from` to `to`.
///
/// Returns the number of objects changed.
pub fn relabel_objects(ann: &mut ImageAnnotation, from: &str, to: &str) -> usize {
    let mut changed = 0;
    for obj in ann.objects.iter_mut() {
        if obj.canonical_label() == from {
            obj.set_label(to);
            changed += 1;
        }
    }
    changed
}

/// Drops relationships whose subject or object id is not in the image.
pub fn prune_dangling(ann: &mut ImageAnnotation) -> ImageChanges {
    let ids: HashSet<ObjectId> = ann.objects.iter().map(|o| o.object_id).collect();
    let before = ann.relationships.len();
    ann.relationships
        .retain(|r| ids.contains(&r.subject_id) && ids.contains(&r.object_id));
    let pruned = before - ann.relationships.len();

    ImageChanges {
        relationships_removed: pruned,
        dangling_relationships: pruned,
        ..Default::default()
    }
}

/// Recomputes `triplets` from the current objects and relationships.
///
/// A relationship yields a triplet only when both endpoint labels are
/// non-empty.
pub fn rebuild_triplets(ann: &mut ImageAnnotation) {
    let labels = ann.label_map();
    ann.triplets = ann
        .relationships
        .iter()
        .filter_map(|r| {
            let s = labels.get(&r.subject_id).filter(|s| !s.is_empty())?;
            let o = labels.get(&r.object_id).filter(|o| !o.is_empty())?;
            Some(Triplet::new(s.as_str(), r.predicate.as_str(), o.as_str()))
        })
        .collect();
}

/// Closes a pass: prunes dangling relationships and rebuilds triplets.
pub fn finish(ann: &mut ImageAnnotation, changes: &mut ImageChanges) {
    *changes += prune_dangling(ann);
    rebuild_triplets(ann);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Relationship, VgObject};

    fn sample() -> ImageAnnotation {
        ImageAnnotation::new(1u64)
            .with_object(VgObject::new(1u64, "cầu thủ"))
            .with_object(VgObject::new(2u64, "bóng đá"))
            .with_object(VgObject::new(3u64, "sân bóng đá"))
            .with_relationship(Relationship::new(1u64, "đá", 2u64))
            .with_relationship(Relationship::new(2u64, "trên", 3u64))
            .with_relationship(Relationship::new(1u64, "trên", 3u64))
    }

    #[test]
    fn remove_objects_prunes_touching_relationships() {
        let mut ann = sample();
        let ids: HashSet<ObjectId> = [ObjectId(2)].into_iter().collect();
        let changes = remove_objects(&mut ann, &ids);

        assert_eq!(changes.objects_removed, 1);
        assert_eq!(changes.relationships_removed, 2);
        assert_eq!(ann.relationships, vec![Relationship::new(1u64, "trên", 3u64)]);
    }

    #[test]
    fn prune_dangling_counts_removed() {
        let mut ann = sample().with_relationship(Relationship::new(1u64, "nhìn", 99u64));
        let changes = prune_dangling(&mut ann);
        assert_eq!(changes.dangling_relationships, 1);
        assert_eq!(ann.relationships.len(), 3);
    }

    #[test]
    fn rebuild_skips_empty_labels() {
        let mut ann = sample();
        ann.objects[0].names.clear();
        rebuild_triplets(&mut ann);

        assert_eq!(ann.triplets, vec![Triplet::new("bóng đá", "trên", "sân bóng đá")]);
    }

    #[test]
    fn relabel_replaces_all_names() {
        let mut ann = sample();
        ann.objects[2].names.push("sân".into());
        let n = relabel_objects(&mut ann, "sân bóng đá", "sân bóng chày");

        assert_eq!(n, 1);
        assert_eq!(ann.objects[2].names, vec!["sân bóng chày".to_string()]);
    }

    #[test]
    fn finish_leaves_no_dangling_and_fresh_triplets() {
        let mut ann = sample().with_relationship(Relationship::new(7u64, "gần", 1u64));
        ann.triplets = vec![Triplet::new("stale", "stale", "stale")];
        let mut changes = ImageChanges::default();
        finish(&mut ann, &mut changes);

        assert_eq!(changes.relationships_removed, 1);
        assert_eq!(ann.triplets.len(), 3);
        assert!(ann.triplets.iter().all(|t| t.subject != "stale"));
    }
}
