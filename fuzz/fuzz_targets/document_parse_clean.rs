//! Fuzz target for document parsing followed by every tool.
//!
//! Arbitrary bytes are parsed as a scene-graph document; whatever parses is
//! run through each tool that accepts it, checked for dangling relationships
//! and serialized again.

#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use sgclean::graph::io_json::{from_json_slice, to_json_string, Entry};
use sgclean::pipeline::{run_tool, Tool};
use sgclean::resolve::ResolveOptions;
use sgclean::rules::Ruleset;

const TOOLS: &[Tool] = &[
    Tool::Standardize,
    Tool::Harmonize,
    Tool::DropExtraFields,
    Tool::FilterMislabel,
    Tool::Clean,
    Tool::DropEmpty,
];

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(doc) = from_json_slice(data) else {
        return;
    };

    let rules = Ruleset::default();
    let opts = ResolveOptions::default();

    for tool in TOOLS {
        let mut out = doc.clone();
        if run_tool(&mut out, *tool, &rules, &opts).is_err() {
            continue;
        }

        for entry in out.entries().unwrap_or_default() {
            if let Entry::Image(ann) = entry {
                let ids: HashSet<_> = ann.objects.iter().map(|o| o.object_id).collect();
                for rel in &ann.relationships {
                    assert!(ids.contains(&rel.subject_id) && ids.contains(&rel.object_id));
                }
            }
        }

        let _ = to_json_string(&out);
    }
});
