//! Label Normalizer passes over whole images and triplet lists.

use tracing::info;

use super::integrity::finish;
use super::report::ImageChanges;
use crate::graph::{ImageAnnotation, Triplet};
use crate::rules::LabelNormalizer;

/// Canonicalizes object labels and runs every relationship through
/// [`LabelNormalizer::standardize_triplet`].
///
/// Implausible relationships are removed; surviving predicates take the
/// normalized form.
pub fn standardize_image(ann: &mut ImageAnnotation, normalizer: &LabelNormalizer) -> ImageChanges {
    let mut changes = ImageChanges::default();

    for obj in ann.objects.iter_mut() {
        let Some(first) = obj.names.first() else {
            continue;
        };
        let label = normalizer.normalize_object_label(first);
        if obj.names.len() != 1 || obj.names[0] != label {
            obj.set_label(label);
            changes.objects_relabeled += 1;
        }
    }

    let labels = ann.label_map();
    let before = ann.relationships.len();
    ann.relationships.retain_mut(|rel| {
        let subject = labels.get(&rel.subject_id).map(String::as_str).unwrap_or("");
        let object = labels.get(&rel.object_id).map(String::as_str).unwrap_or("");
        match normalizer.standardize_triplet(subject, &rel.predicate, object) {
            None => false,
            Some((_, predicate, _)) => {
                if predicate != rel.predicate {
                    rel.predicate = predicate;
                    changes.predicates_rewritten += 1;
                }
                true
            }
        }
    });
    let implausible = before - ann.relationships.len();
    changes.relationships_removed += implausible;

    if changes.objects_relabeled > 0 || implausible > 0 {
        info!(
            image_id = %ann.image_id,
            relabeled = changes.objects_relabeled,
            implausible,
            "standardized labels"
        );
    }

    finish(ann, &mut changes);
    changes
}

/// Re-derives every predicate from the current labels (pipeline step 6).
pub fn normalize_predicates(ann: &mut ImageAnnotation, normalizer: &LabelNormalizer) -> ImageChanges {
    let mut changes = ImageChanges::default();
    let labels = ann.label_map();

    for rel in ann.relationships.iter_mut() {
        let subject = labels.get(&rel.subject_id).map(String::as_str).unwrap_or("");
        let object = labels.get(&rel.object_id).map(String::as_str).unwrap_or("");
        let predicate = normalizer.normalize_predicate(&rel.predicate, subject, object);
        if predicate != rel.predicate {
            rel.predicate = predicate;
            changes.predicates_rewritten += 1;
        }
    }

    if changes.predicates_rewritten > 0 {
        info!(
            image_id = %ann.image_id,
            rewritten = changes.predicates_rewritten,
            "fixed predicates"
        );
    }

    finish(ann, &mut changes);
    changes
}

/// Standardizes a bare triplet list, dropping implausible entries.
pub fn standardize_triplets(triplets: &mut Vec<Triplet>, normalizer: &LabelNormalizer) -> ImageChanges {
    let mut changes = ImageChanges::default();
    let before = triplets.len();

    triplets.retain_mut(|t| {
        match normalizer.standardize_triplet(&t.subject, &t.predicate, &t.object) {
            None => false,
            Some((s, p, o)) => {
                if p != t.predicate {
                    changes.predicates_rewritten += 1;
                }
                *t = Triplet::new(s, p, o);
                true
            }
        }
    });

    changes.relationships_removed = before - triplets.len();
    changes
}
