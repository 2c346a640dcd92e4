//! End-to-end scenarios run with the English rule tables in
//! `tests/fixtures/rules_en.yaml`.

use std::path::Path;

use sgclean::graph::{ImageAnnotation, Relationship, VgObject};
use sgclean::resolve::{
    clean_image, drop_extra_fields, filter_mislabeled_balls, harmonize_image, FieldPolicy,
    ResolveOptions, SoccerDominantStrategy,
};
use sgclean::rules::{RuleTables, Ruleset};

fn rules() -> Ruleset {
    let tables = RuleTables::from_file(Path::new("tests/fixtures/rules_en.yaml"))
        .expect("load english rules");
    Ruleset::compile(&tables).expect("compile english rules")
}

fn labels(ann: &ImageAnnotation) -> Vec<String> {
    ann.objects.iter().map(|o| o.canonical_label()).collect()
}

#[test]
fn scenario_a_largest_field_survives() {
    let rules = rules();
    let mut ann = ImageAnnotation::new(1u64)
        .with_object(VgObject::new(1u64, "soccer-field").with_bbox(0.0, 0.0, 10.0, 10.0))
        .with_object(VgObject::new(2u64, "soccer-field").with_bbox(30.0, 30.0, 20.0, 20.0))
        .with_object(VgObject::new(3u64, "player").with_bbox(1.0, 1.0, 2.0, 4.0))
        .with_relationship(Relationship::new(3u64, "on", 1u64));

    let changes = drop_extra_fields(&mut ann, &rules.field_labels, FieldPolicy::LargestArea);

    let fields: Vec<&VgObject> = ann
        .objects
        .iter()
        .filter(|o| o.canonical_label() == "soccer-field")
        .collect();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].area(), 400.0);
    assert_eq!(changes.objects_removed, 1);
    assert!(ann.relationships.is_empty());
}

#[test]
fn scenario_b_bat_forces_baseball_field() {
    let rules = rules();
    let mut ann = ImageAnnotation::new(2u64)
        .with_object(VgObject::new(1u64, "soccer-field"))
        .with_object(VgObject::new(2u64, "baseball-bat"));

    let ctx = rules.classifier.classify(&ann.label_set());
    assert!(ctx.must_force_baseball_field);
    assert!(!ctx.must_force_tennis_field);

    harmonize_image(&mut ann, &rules, SoccerDominantStrategy::Drop);
    assert_eq!(labels(&ann), vec!["baseball-field", "baseball-bat"]);
}

#[test]
fn scenario_b_bat_wins_over_tennis_signal() {
    let rules = rules();
    let mut ann = ImageAnnotation::new(2u64)
        .with_object(VgObject::new(1u64, "soccer-field"))
        .with_object(VgObject::new(2u64, "baseball-bat"))
        .with_object(VgObject::new(3u64, "tennis-racket"));

    harmonize_image(&mut ann, &rules, SoccerDominantStrategy::Drop);
    assert_eq!(labels(&ann)[0], "baseball-field");
}

fn scenario_c_image() -> ImageAnnotation {
    ImageAnnotation::new(3u64)
        .with_object(VgObject::new(1u64, "baseball-field").with_bbox(0.0, 0.0, 100.0, 100.0))
        .with_object(VgObject::new(2u64, "soccer-ball").with_bbox(10.0, 10.0, 2.0, 2.0))
        .with_object(VgObject::new(3u64, "baseball-ball").with_bbox(80.0, 80.0, 2.0, 2.0))
        .with_object(VgObject::new(4u64, "player").with_bbox(20.0, 20.0, 5.0, 10.0))
        .with_relationship(Relationship::new(4u64, "kicking", 2u64))
        .with_relationship(Relationship::new(2u64, "on", 1u64))
        .with_relationship(Relationship::new(4u64, "on", 1u64))
}

#[test]
fn scenario_c_soccer_ball_removed_from_baseball_scene() {
    let rules = rules();
    let opts = ResolveOptions::default();
    let mut ann = scenario_c_image();

    let changes = filter_mislabeled_balls(&mut ann, &rules.classifier, &opts.mislabel());

    assert!(ann.objects.iter().all(|o| o.canonical_label() != "soccer-ball"));
    assert_eq!(changes.objects_removed, 1);
    assert_eq!(changes.relationships_removed, 2);
    assert_eq!(ann.relationships, vec![Relationship::new(4u64, "on", 1u64)]);
    assert_eq!(ann.triplets.len(), 1);
}

#[test]
fn scenario_d_zero_conflict_threshold_still_drops() {
    let rules = rules();
    let opts = ResolveOptions {
        require_overlap: true,
        ..Default::default()
    };
    assert_eq!(opts.iou_conflict, 0.0);
    assert!(opts.overlap_always_conflicts());

    let mut ann = scenario_c_image();
    let ball = ann.object(2u64.into()).unwrap();
    let other = ann.object(3u64.into()).unwrap();
    assert_eq!(ball.iou(other), 0.0);

    filter_mislabeled_balls(&mut ann, &rules.classifier, &opts.mislabel());
    assert!(ann.object(2u64.into()).is_none());
}

#[test]
fn scenario_d_positive_threshold_requires_real_overlap() {
    let rules = rules();
    let opts = ResolveOptions {
        require_overlap: true,
        iou_conflict: 0.01,
        ..Default::default()
    };

    let mut ann = scenario_c_image();
    filter_mislabeled_balls(&mut ann, &rules.classifier, &opts.mislabel());
    assert!(ann.object(2u64.into()).is_some());
}

#[test]
fn scenario_e_wear_is_specialized_by_object() {
    let rules = rules();
    let n = &rules.normalizer;

    assert_eq!(n.normalize_predicate("wear", "player", "uniform"), "put on clothing");
    assert_eq!(n.normalize_predicate("wear", "player", "sneakers"), "put on footwear");
    assert_eq!(n.normalize_predicate("wear", "player", "sneaker"), "put on footwear");
    assert_eq!(n.normalize_predicate("wear", "player", "hat"), "wear");
}

#[test]
fn full_clean_with_english_rules() {
    let rules = rules();
    let opts = ResolveOptions {
        fix_predicates: true,
        ..Default::default()
    };
    let field_labels = opts.field_labels(&rules);

    let mut ann = ImageAnnotation::new(9u64)
        .with_object(VgObject::new(1u64, "Football Field").with_bbox(0.0, 0.0, 50.0, 50.0))
        .with_object(VgObject::new(2u64, "tennis-ball").with_bbox(5.0, 5.0, 1.0, 1.0))
        .with_object(VgObject::new(3u64, "player").with_bbox(10.0, 10.0, 4.0, 9.0))
        .with_object(VgObject::new(4u64, "sneaker").with_bbox(10.0, 18.0, 2.0, 1.0))
        .with_object(VgObject::new(5u64, "coach").with_bbox(30.0, 10.0, 4.0, 9.0))
        .with_object(VgObject::new(6u64, "jersey").with_bbox(30.0, 11.0, 4.0, 4.0))
        .with_relationship(Relationship::new(2u64, "on", 1u64))
        .with_relationship(Relationship::new(3u64, "wear", 4u64))
        .with_relationship(Relationship::new(5u64, "near", 6u64));

    clean_image(&mut ann, &rules, &opts, &field_labels);

    assert_eq!(
        labels(&ann),
        vec!["tennis-field", "tennis-ball", "player", "sneakers", "coach", "jersey"]
    );
    let predicates: Vec<&str> = ann.relationships.iter().map(|r| r.predicate.as_str()).collect();
    assert_eq!(predicates, vec!["resting on", "put on footwear"]);
    assert_eq!(ann.triplets.len(), 2);
}
