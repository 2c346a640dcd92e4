use proptest::prelude::*;
use sgclean::graph::io_json::{Document, Entry};
use sgclean::graph::ImageAnnotation;
use sgclean::pipeline::{run_tool, Tool};
use sgclean::resolve::clean_image;
use sgclean::rules::Ruleset;

mod proptest_helpers;

const TOOLS: &[Tool] = &[
    Tool::Standardize,
    Tool::Harmonize,
    Tool::DropExtraFields,
    Tool::FilterMislabel,
    Tool::Clean,
];

fn run_on_image(
    ann: ImageAnnotation,
    tool: Tool,
    rules: &Ruleset,
    opts: &sgclean::resolve::ResolveOptions,
) -> ImageAnnotation {
    let mut doc = Document::Flat(vec![Entry::Image(ann)]);
    run_tool(&mut doc, tool, rules, opts).expect("run tool");
    match doc {
        Document::Flat(mut entries) => match entries.pop() {
            Some(Entry::Image(ann)) => ann,
            other => panic!("unexpected entry: {:?}", other),
        },
        other => panic!("unexpected document: {:?}", other),
    }
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn clean_is_idempotent(
        ann in proptest_helpers::arb_image(8, 12),
        opts in proptest_helpers::arb_options(),
    ) {
        let rules = Ruleset::default();
        let field_labels = opts.field_labels(&rules);

        let mut once = ann;
        clean_image(&mut once, &rules, &opts, &field_labels);

        let mut twice = once.clone();
        let changes = clean_image(&mut twice, &rules, &opts, &field_labels);

        prop_assert!(changes.is_empty(), "second run changed {:?}", changes);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn no_tool_leaves_dangling_relationships(
        ann in proptest_helpers::arb_image(8, 12),
        opts in proptest_helpers::arb_options(),
        tool in prop::sample::select(TOOLS),
    ) {
        let rules = Ruleset::default();
        let out = run_on_image(ann, tool, &rules, &opts);
        if let Err(msg) = proptest_helpers::assert_no_dangling(&out) {
            prop_assert!(false, "{}: {}", tool.name(), msg);
        }
    }

    #[test]
    fn triplets_match_labelled_relationships(
        ann in proptest_helpers::arb_image(8, 12),
        opts in proptest_helpers::arb_options(),
        tool in prop::sample::select(TOOLS),
    ) {
        let rules = Ruleset::default();
        let out = run_on_image(ann, tool, &rules, &opts);

        prop_assert!(out.triplets.len() <= out.relationships.len());
        prop_assert_eq!(
            out.triplets.len(),
            proptest_helpers::labelled_relationship_count(&out)
        );
    }

    #[test]
    fn every_tool_is_idempotent(
        ann in proptest_helpers::arb_image(8, 12),
        opts in proptest_helpers::arb_options(),
        tool in prop::sample::select(TOOLS),
    ) {
        let rules = Ruleset::default();
        let once = run_on_image(ann, tool, &rules, &opts);
        let twice = run_on_image(once.clone(), tool, &rules, &opts);
        prop_assert_eq!(once, twice);
    }
}
