#![allow(dead_code)]

use std::collections::HashSet;

use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use sgclean::graph::{BBoxXYWH, ImageAnnotation, ObjectId, Relationship, VgObject};
use sgclean::resolve::{FieldPolicy, ResolveOptions, SoccerDominantStrategy};

/// Labels from the default rule tables, plus raw variants the normalizer
/// has to fold.
pub const LABELS: &[&str] = &[
    "sân bóng đá",
    "Sân Bóng",
    "sân bóng chày",
    "sân tennis",
    "bóng đá",
    "quả bóng đá",
    "bóng chày",
    "quả bóng chày",
    "gậy bóng chày",
    "găng bóng chày",
    "vợt tennis",
    "quả bóng tennis",
    "khung thành",
    "cầu thủ",
    "Giày Sneaker",
    "đồng phục",
    "áo đấu",
    "khán giả",
];

pub const PREDICATES: &[&str] = &[
    "trên",
    "trên sân",
    "trong",
    "đeo",
    "bắt",
    "gần",
    "cầm",
    "đánh vung",
    "đá",
];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Boxes with strictly positive size.
pub fn arb_bbox() -> BoxedStrategy<BBoxXYWH> {
    (-100.0f64..100.0, -100.0f64..100.0, 0.5f64..100.0, 0.5f64..100.0)
        .prop_map(|(x, y, w, h)| BBoxXYWH::new(x, y, w, h))
        .boxed()
}

/// An object with a label from [`LABELS`] (or no label) and, usually, a box
/// on a small grid so that overlaps are common.
pub fn arb_object(id: u64) -> BoxedStrategy<VgObject> {
    (
        prop::option::weighted(0.9, prop::sample::select(LABELS)),
        prop::option::weighted(0.9, (0u32..20, 0u32..20, 1u32..20, 1u32..20)),
    )
        .prop_map(move |(label, bbox)| {
            let mut obj = VgObject::new(id, label.unwrap_or_default());
            if label.is_none() {
                obj.names.clear();
            }
            if let Some((x, y, w, h)) = bbox {
                obj = obj.with_bbox(x as f64, y as f64, w as f64, h as f64);
            }
            obj
        })
        .boxed()
}

/// An image with unique object ids and relationships that may point at
/// missing objects.
pub fn arb_image(max_objects: usize, max_rels: usize) -> BoxedStrategy<ImageAnnotation> {
    (0usize..=max_objects)
        .prop_flat_map(move |n| {
            let objects: Vec<BoxedStrategy<VgObject>> = (1..=n as u64).map(arb_object).collect();
            let max_id = n as u64 + 2;
            let rels = prop::collection::vec(
                (1..=max_id, prop::sample::select(PREDICATES), 1..=max_id),
                0..=max_rels,
            );
            (objects, rels, 0u64..1000)
        })
        .prop_map(|(objects, rels, image_id)| {
            let mut ann = ImageAnnotation::new(image_id);
            ann.objects = objects;
            ann.relationships = rels
                .into_iter()
                .map(|(s, p, o)| Relationship::new(s, p, o))
                .collect();
            ann
        })
        .boxed()
}

pub fn arb_options() -> BoxedStrategy<ResolveOptions> {
    (
        prop_oneof![
            Just(SoccerDominantStrategy::Drop),
            Just(SoccerDominantStrategy::Relabel)
        ],
        prop_oneof![Just(FieldPolicy::LargestArea), Just(FieldPolicy::LowestY)],
        prop::sample::select(vec![0.5, 0.9]),
        prop::sample::select(vec![0.0, 0.1]),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(strategy, field_policy, iou_dup, iou_conflict, require_overlap, fix_predicates)| {
                ResolveOptions {
                    strategy,
                    field_policy,
                    field_labels: None,
                    iou_dup,
                    iou_conflict,
                    require_overlap,
                    fix_predicates,
                }
            },
        )
        .boxed()
}

pub fn assert_no_dangling(ann: &ImageAnnotation) -> Result<(), String> {
    let ids: HashSet<ObjectId> = ann.objects.iter().map(|o| o.object_id).collect();
    for rel in &ann.relationships {
        if !ids.contains(&rel.subject_id) || !ids.contains(&rel.object_id) {
            return Err(format!(
                "image {}: relationship {} -> {} references a missing object",
                ann.image_id, rel.subject_id, rel.object_id
            ));
        }
    }
    Ok(())
}

/// Relationships whose endpoints both carry a non-empty label.
pub fn labelled_relationship_count(ann: &ImageAnnotation) -> usize {
    let labels = ann.label_map();
    ann.relationships
        .iter()
        .filter(|r| {
            let labelled = |id: &ObjectId| labels.get(id).is_some_and(|l| !l.is_empty());
            labelled(&r.subject_id) && labelled(&r.object_id)
        })
        .count()
}
