use proptest::prelude::*;
use sgclean::graph::{area, intersection_area, iou, BBoxXYWH};

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn iou_with_self_is_one(a in proptest_helpers::arb_bbox()) {
        prop_assert!((iou(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn iou_is_symmetric(a in proptest_helpers::arb_bbox(), b in proptest_helpers::arb_bbox()) {
        prop_assert_eq!(iou(&a, &b), iou(&b, &a));
    }

    #[test]
    fn iou_is_within_unit_interval(a in proptest_helpers::arb_bbox(), b in proptest_helpers::arb_bbox()) {
        let v = iou(&a, &b);
        prop_assert!((0.0..=1.0 + 1e-12).contains(&v), "iou out of range: {}", v);
    }

    #[test]
    fn disjoint_boxes_have_zero_iou(a in proptest_helpers::arb_bbox(), gap in 0.0f64..50.0, dy in -100.0f64..100.0) {
        let b = BBoxXYWH::new(a.x + a.w + gap, a.y + dy, a.w, a.h);
        prop_assert_eq!(intersection_area(&a, &b), 0.0);
        prop_assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn intersection_never_exceeds_either_area(a in proptest_helpers::arb_bbox(), b in proptest_helpers::arb_bbox()) {
        let inter = intersection_area(&a, &b);
        prop_assert!(inter <= area(&a) + 1e-9);
        prop_assert!(inter <= area(&b) + 1e-9);
    }
}
