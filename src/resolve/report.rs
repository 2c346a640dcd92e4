//! Change counters and the run report.
//!
//! Passes return [`ImageChanges`]; the driver sums them into a
//! [`CleanReport`], which mirrors how a validation report is printed: counts
//! first, then warnings and notes.

use serde::Serialize;
use std::fmt;
use std::ops::AddAssign;

/// What one pass (or a whole pipeline) changed in one image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImageChanges {
    pub objects_removed: usize,
    pub objects_relabeled: usize,
    pub relationships_removed: usize,
    pub predicates_rewritten: usize,
    /// Subset of `relationships_removed` that referenced missing objects.
    pub dangling_relationships: usize,
}

impl ImageChanges {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl AddAssign for ImageChanges {
    fn add_assign(&mut self, rhs: Self) {
        self.objects_removed += rhs.objects_removed;
        self.objects_relabeled += rhs.objects_relabeled;
        self.relationships_removed += rhs.relationships_removed;
        self.predicates_rewritten += rhs.predicates_rewritten;
        self.dangling_relationships += rhs.dangling_relationships;
    }
}

impl std::iter::Sum for ImageChanges {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut acc, c| {
            acc += c;
            acc
        })
    }
}

/// Summary of one tool run over a document.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CleanReport {
    /// Tool that produced the report.
    pub tool: String,
    /// Detected input shape.
    pub shape: String,
    pub counts: CleanCounts,
    pub issues: Vec<CleanIssue>,
}

/// Dataset-level counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanCounts {
    pub images_in: usize,
    pub images_out: usize,
    /// Entries written back unchanged because they could not be decoded.
    pub undecodable_images: usize,
    pub objects_removed: usize,
    pub objects_relabeled: usize,
    pub relationships_removed: usize,
    pub predicates_rewritten: usize,
    pub triplets_in: usize,
    pub triplets_out: usize,
}

impl CleanCounts {
    /// Adds per-image change totals.
    pub fn absorb(&mut self, changes: &ImageChanges) {
        self.objects_removed += changes.objects_removed;
        self.objects_relabeled += changes.objects_relabeled;
        self.relationships_removed += changes.relationships_removed;
        self.predicates_rewritten += changes.predicates_rewritten;
    }
}

impl CleanReport {
    /// Creates an empty report.
    pub fn new(tool: impl Into<String>, shape: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            shape: shape.into(),
            ..Default::default()
        }
    }

    /// Adds an issue to the report.
    pub fn add(&mut self, issue: CleanIssue) {
        self.issues.push(issue);
    }

    /// Number of warning-level issues.
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    /// Number of info-level issues.
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Info)
            .count()
    }
}

impl fmt::Display for CleanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(f, "{} ({} input):", self.tool, self.shape)?;

        if self.shape == "triplets" {
            writeln!(f, "  triplets: {} in, {} out", c.triplets_in, c.triplets_out)?;
        } else {
            writeln!(f, "  images: {} in, {} out", c.images_in, c.images_out)?;
            writeln!(
                f,
                "  objects: {} removed, {} relabeled",
                c.objects_removed, c.objects_relabeled
            )?;
            writeln!(f, "  triplets: {}", c.triplets_out)?;
        }
        writeln!(
            f,
            "  relationships: {} removed, {} predicate(s) rewritten",
            c.relationships_removed, c.predicates_rewritten
        )?;

        for (title, severity) in [("Warnings", Severity::Warning), ("Notes", Severity::Info)] {
            let matching: Vec<_> = self
                .issues
                .iter()
                .filter(|i| i.severity == severity)
                .collect();
            if matching.is_empty() {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{} ({}):", title, matching.len())?;
            for issue in matching {
                writeln!(f, "  - {}", issue)?;
            }
        }

        Ok(())
    }
}

/// One observation about the input or the run configuration.
#[derive(Clone, Debug, Serialize)]
pub struct CleanIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl CleanIssue {
    /// Creates a warning.
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    /// Creates an informational note.
    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CleanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

/// Severity of a report issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Input data that could not be fully processed.
    Warning,
    /// Policy decisions and notes.
    Info,
}

/// A stable code identifying the kind of issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    /// An image entry could not be decoded and was passed through.
    UndecodableImage,
    /// Objects without complete x/y/w/h were treated as zero-area.
    MalformedGeometry,
    /// Relationships referencing missing objects were dropped.
    DanglingRelationships,
    /// require-overlap is set but the conflict threshold is 0.0, so every
    /// soccer ball overlaps.
    ConflictThresholdAlwaysOverlaps,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_sum() {
        let a = ImageChanges {
            objects_removed: 1,
            relationships_removed: 2,
            ..Default::default()
        };
        let b = ImageChanges {
            objects_removed: 3,
            predicates_rewritten: 4,
            ..Default::default()
        };
        let total: ImageChanges = [a, b].into_iter().sum();
        assert_eq!(total.objects_removed, 4);
        assert_eq!(total.relationships_removed, 2);
        assert_eq!(total.predicates_rewritten, 4);
        assert!(!total.is_empty());
        assert!(ImageChanges::default().is_empty());
    }

    #[test]
    fn display_lists_warnings_and_notes() {
        let mut report = CleanReport::new("clean", "flat");
        report.counts.images_in = 3;
        report.counts.images_out = 3;
        report.add(CleanIssue::warning(
            IssueCode::UndecodableImage,
            "entry 2 passed through",
        ));
        report.add(CleanIssue::info(IssueCode::DanglingRelationships, "1 dropped"));

        let text = report.to_string();
        assert!(text.contains("images: 3 in, 3 out"));
        assert!(text.contains("Warnings (1):"));
        assert!(text.contains("[UndecodableImage] entry 2 passed through"));
        assert!(text.contains("Notes (1):"));
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.info_count(), 1);
    }

    #[test]
    fn serializes_severity_lowercase() {
        let issue = CleanIssue::info(IssueCode::MalformedGeometry, "x");
        let json = serde_json::to_string(&issue).unwrap();
        assert!(json.contains("\"severity\":\"info\""));
        assert!(json.contains("\"code\":\"MalformedGeometry\""));
    }
}
