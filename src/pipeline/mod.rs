//! Pipeline driver: runs one tool over every image of a document.
//!
//! Images are independent, so entries are processed with rayon and the
//! per-image change counts are reduced into a [`CleanReport`]. Entry order
//! is preserved. Entries that failed to decode are left untouched and
//! reported.

use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::SgcleanError;
use crate::graph::io_json::{read_document, write_document, Document, Entry, Shape};
use crate::graph::ImageAnnotation;
use crate::resolve::{
    clean_image, drop_extra_fields, filter_mislabeled_balls, harmonize_image,
    normalize_predicates, standardize_image, standardize_triplets, CleanIssue, CleanReport,
    ImageChanges, IssueCode, ResolveOptions,
};
use crate::rules::Ruleset;

/// The transformations available over a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    /// Label and predicate normalization.
    Standardize,
    /// Field coercion and soccer-dominant cleanup (optionally predicates).
    Harmonize,
    /// Duplicate-field collapsing.
    DropExtraFields,
    /// Mislabeled-ball filtering.
    FilterMislabel,
    /// Standardization followed by every resolver pass.
    Clean,
    /// Removal of images without relationships.
    DropEmpty,
}

impl Tool {
    /// Name as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Tool::Standardize => "standardize",
            Tool::Harmonize => "harmonize",
            Tool::DropExtraFields => "drop-extra-fields",
            Tool::FilterMislabel => "filter-mislabel",
            Tool::Clean => "clean",
            Tool::DropEmpty => "drop-empty",
        }
    }

    /// Whether the tool reads object boxes.
    fn uses_geometry(self) -> bool {
        matches!(self, Tool::DropExtraFields | Tool::FilterMislabel | Tool::Clean)
    }

    /// Whether the tool runs the mislabel pass.
    fn uses_overlap(self) -> bool {
        matches!(self, Tool::FilterMislabel | Tool::Clean)
    }

    fn accepts(self, shape: Shape) -> bool {
        shape != Shape::Triplets || self == Tool::Standardize
    }
}

fn process_image(
    tool: Tool,
    ann: &mut ImageAnnotation,
    rules: &Ruleset,
    opts: &ResolveOptions,
    field_labels: &[String],
) -> ImageChanges {
    match tool {
        Tool::Standardize => standardize_image(ann, &rules.normalizer),
        Tool::Harmonize => {
            let mut changes = harmonize_image(ann, rules, opts.strategy);
            if opts.fix_predicates {
                changes += normalize_predicates(ann, &rules.normalizer);
            }
            changes
        }
        Tool::DropExtraFields => drop_extra_fields(ann, field_labels, opts.field_policy),
        Tool::FilterMislabel => filter_mislabeled_balls(ann, &rules.classifier, &opts.mislabel()),
        Tool::Clean => clean_image(ann, rules, opts, field_labels),
        Tool::DropEmpty => ImageChanges::default(),
    }
}

/// Applies `tool` to every image of `doc` in place.
///
/// # Errors
/// Fails before touching `doc` if the options are invalid or the tool does
/// not accept the document's shape.
pub fn run_tool(
    doc: &mut Document,
    tool: Tool,
    rules: &Ruleset,
    opts: &ResolveOptions,
) -> Result<CleanReport, SgcleanError> {
    opts.validate()?;
    let shape = doc.shape();
    if !tool.accepts(shape) {
        return Err(SgcleanError::UnsupportedFormat(format!(
            "'{}' expects a flat or wrapped annotation list, got a {} document",
            tool.name(),
            shape.name()
        )));
    }

    let mut report = CleanReport::new(tool.name(), shape.name());

    let entries = match doc {
        Document::Triplets(triplets) => {
            report.counts.triplets_in = triplets.len();
            let changes = standardize_triplets(triplets, &rules.normalizer);
            report.counts.absorb(&changes);
            report.counts.triplets_out = triplets.len();
            debug!(tool = tool.name(), ?changes, "triplet document done");
            return Ok(report);
        }
        Document::Flat(entries) => entries,
        Document::Wrapped { annotations, .. } => annotations,
    };

    report.counts.images_in = entries.len();
    report.counts.triplets_in = entries
        .iter()
        .filter_map(Entry::as_image)
        .map(|a| a.triplets.len())
        .sum();

    for (index, entry) in entries.iter().enumerate() {
        if let Entry::Raw { value, reason } = entry {
            let image = match value.get("image_id") {
                Some(id) => format!("entry {} (image_id {})", index, id),
                None => format!("entry {}", index),
            };
            warn!(index, %reason, "passing undecodable image entry through");
            report.counts.undecodable_images += 1;
            report.add(CleanIssue::warning(
                IssueCode::UndecodableImage,
                format!(
                    "{} could not be decoded; the whole image was left uncleaned: {}",
                    image, reason
                ),
            ));
        }
    }

    if tool.uses_geometry() {
        let malformed: usize = entries
            .iter()
            .filter_map(Entry::as_image)
            .map(|a| a.objects.iter().filter(|o| o.is_malformed()).count())
            .sum();
        if malformed > 0 {
            report.add(CleanIssue::warning(
                IssueCode::MalformedGeometry,
                format!(
                    "{} object(s) lack complete x/y/w/h and were treated as zero-area",
                    malformed
                ),
            ));
        }
    }

    if tool.uses_overlap() && opts.overlap_always_conflicts() {
        report.add(CleanIssue::info(
            IssueCode::ConflictThresholdAlwaysOverlaps,
            "--require-overlap with --iou-conflict 0.0 drops every soccer ball in \
             baseball/tennis scenes; raise the threshold to require real overlap",
        ));
    }

    let changes: ImageChanges = if tool == Tool::DropEmpty {
        entries.retain(|e| !e.has_no_relationships());
        ImageChanges::default()
    } else {
        let field_labels = opts.field_labels(rules);
        entries
            .par_iter_mut()
            .map(|entry| match entry {
                Entry::Image(ann) => process_image(tool, ann, rules, opts, &field_labels),
                Entry::Raw { .. } => ImageChanges::default(),
            })
            .sum()
    };

    report.counts.absorb(&changes);
    report.counts.images_out = entries.len();
    report.counts.triplets_out = entries
        .iter()
        .filter_map(Entry::as_image)
        .map(|a| a.triplets.len())
        .sum();

    if changes.dangling_relationships > 0 {
        report.add(CleanIssue::info(
            IssueCode::DanglingRelationships,
            format!(
                "{} relationship(s) referenced missing objects and were dropped",
                changes.dangling_relationships
            ),
        ));
    }

    debug!(tool = tool.name(), ?changes, images = entries.len(), "document done");
    Ok(report)
}

/// Reads `infile`, applies `tool` and writes the result to `outfile`.
///
/// Nothing is written unless every step succeeds.
pub fn run_file(
    infile: &Path,
    outfile: &Path,
    tool: Tool,
    rules: &Ruleset,
    opts: &ResolveOptions,
) -> Result<CleanReport, SgcleanError> {
    let mut doc = read_document(infile)?;
    let report = run_tool(&mut doc, tool, rules, opts)?;
    write_document(outfile, &doc)?;
    Ok(report)
}
