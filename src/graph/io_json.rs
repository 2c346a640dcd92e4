//! JSON document adapter.
//!
//! Three top-level shapes are recognised:
//! - **flat**: an array of per-image annotations (`[{"image_id", "objects",
//!   "relationships", ...}, ...]`)
//! - **wrapped**: an object whose `annotations` key holds such an array; all
//!   other top-level keys are carried through untouched
//! - **triplets**: an array of plain `{"subject", "predicate", "object"}`
//!   records, accepted only by the standardizer
//!
//! Each image entry is decoded on its own. An entry that does not decode is
//! kept as raw JSON and written back unchanged, so one bad image never blocks
//! the rest of the dataset.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use super::model::{ImageAnnotation, ListSource, Triplet};
use crate::error::SgcleanError;

const EXPECTED_SHAPES: &str = "a list of VG-like items (each with 'objects' and 'relationships') \
     or an object with an 'annotations' list";

/// The top-level shape a document was read as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    Flat,
    Wrapped,
    Triplets,
}

impl Shape {
    /// Human-readable name of the shape.
    pub fn name(&self) -> &'static str {
        match self {
            Shape::Flat => "flat",
            Shape::Wrapped => "wrapped",
            Shape::Triplets => "triplets",
        }
    }
}

/// One image entry of a document.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// Successfully decoded annotation.
    Image(ImageAnnotation),
    /// Entry that failed to decode, with the reason; written back verbatim.
    Raw { value: Value, reason: String },
}

impl Entry {
    fn decode(value: Value) -> Self {
        let relationships_source = ListSource::of(&value, "relationships");
        match serde_json::from_value::<ImageAnnotation>(value.clone()) {
            Ok(mut ann) => {
                ann.relationships_source = relationships_source;
                Entry::Image(ann)
            }
            Err(e) => Entry::Raw {
                value,
                reason: e.to_string(),
            },
        }
    }

    fn encode(&self) -> Result<Value, serde_json::Error> {
        match self {
            Entry::Image(ann) => {
                let mut value = serde_json::to_value(ann)?;
                // An absent or null list that is still empty is written back
                // the way it was read.
                if ann.relationships.is_empty() {
                    if let Value::Object(map) = &mut value {
                        match ann.relationships_source {
                            ListSource::Array => {}
                            ListSource::Null => {
                                map.insert("relationships".to_string(), Value::Null);
                            }
                            ListSource::Missing => {
                                map.shift_remove("relationships");
                            }
                        }
                    }
                }
                Ok(value)
            }
            Entry::Raw { value, .. } => Ok(value.clone()),
        }
    }

    /// Returns the decoded annotation, if any.
    pub fn as_image(&self) -> Option<&ImageAnnotation> {
        match self {
            Entry::Image(ann) => Some(ann),
            Entry::Raw { .. } => None,
        }
    }

    /// Returns true if the entry has an explicitly empty relationship list.
    ///
    /// A missing or `null` `relationships` key does not count as empty.
    pub fn has_no_relationships(&self) -> bool {
        match self {
            Entry::Image(ann) => {
                ann.relationships_source == ListSource::Array && ann.relationships.is_empty()
            }
            Entry::Raw { value, .. } => value
                .get("relationships")
                .and_then(Value::as_array)
                .is_some_and(|r| r.is_empty()),
        }
    }
}

/// A whole input document.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    /// Bare list of image entries.
    Flat(Vec<Entry>),
    /// Image entries under `annotations`, plus the other top-level keys
    /// (`rest` keeps an `annotations` placeholder to hold its position).
    Wrapped {
        annotations: Vec<Entry>,
        rest: Map<String, Value>,
    },
    /// Bare list of label triplets.
    Triplets(Vec<Triplet>),
}

impl Document {
    /// The shape this document was read as.
    pub fn shape(&self) -> Shape {
        match self {
            Document::Flat(_) => Shape::Flat,
            Document::Wrapped { .. } => Shape::Wrapped,
            Document::Triplets(_) => Shape::Triplets,
        }
    }

    /// Image entries, or `None` for a triplet document.
    pub fn entries(&self) -> Option<&[Entry]> {
        match self {
            Document::Flat(entries) => Some(entries),
            Document::Wrapped { annotations, .. } => Some(annotations),
            Document::Triplets(_) => None,
        }
    }

    /// Mutable image entries, or `None` for a triplet document.
    pub fn entries_mut(&mut self) -> Option<&mut Vec<Entry>> {
        match self {
            Document::Flat(entries) => Some(entries),
            Document::Wrapped { annotations, .. } => Some(annotations),
            Document::Triplets(_) => None,
        }
    }

    /// Builds a document from already-parsed JSON, detecting its shape.
    ///
    /// # Errors
    /// Returns [`SgcleanError::UnsupportedFormat`] if the value matches none
    /// of the accepted shapes, or if a triplet list is malformed.
    pub fn from_value(value: Value) -> Result<Self, SgcleanError> {
        match detect_shape(&value) {
            Some(Shape::Flat) => {
                let items = into_array(value);
                Ok(Document::Flat(items.into_iter().map(Entry::decode).collect()))
            }
            Some(Shape::Wrapped) => {
                let mut rest = match value {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                // Leave the key in place so it keeps its position on output.
                let annotations = rest
                    .get_mut("annotations")
                    .map(Value::take)
                    .map(into_array)
                    .unwrap_or_default();
                Ok(Document::Wrapped {
                    annotations: annotations.into_iter().map(Entry::decode).collect(),
                    rest,
                })
            }
            Some(Shape::Triplets) => serde_json::from_value::<Vec<Triplet>>(value)
                .map(Document::Triplets)
                .map_err(|e| {
                    SgcleanError::UnsupportedFormat(format!("malformed triplet list: {}", e))
                }),
            None => Err(SgcleanError::UnsupportedFormat(format!(
                "expected {}",
                EXPECTED_SHAPES
            ))),
        }
    }

    /// Converts the document back to JSON in its original shape.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Document::Flat(entries) => encode_entries(entries),
            Document::Wrapped { annotations, rest } => {
                let mut out = rest.clone();
                out.insert("annotations".to_string(), encode_entries(annotations)?);
                Ok(Value::Object(out))
            }
            Document::Triplets(triplets) => serde_json::to_value(triplets),
        }
    }
}

fn into_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

fn encode_entries(entries: &[Entry]) -> Result<Value, serde_json::Error> {
    entries
        .iter()
        .map(Entry::encode)
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

/// Detects which supported shape a JSON value has, if any.
///
/// Only the first element of a list is inspected, matching how the upstream
/// tools sniff their input. An empty list is treated as flat.
pub fn detect_shape(value: &Value) -> Option<Shape> {
    match value {
        Value::Array(items) => match items.first() {
            None => Some(Shape::Flat),
            Some(Value::Object(first)) => {
                if first.contains_key("objects") && first.contains_key("relationships") {
                    Some(Shape::Flat)
                } else if first.contains_key("subject")
                    && first.contains_key("predicate")
                    && first.contains_key("object")
                {
                    Some(Shape::Triplets)
                } else {
                    None
                }
            }
            Some(_) => None,
        },
        Value::Object(map) => match map.get("annotations") {
            Some(Value::Array(_)) => Some(Shape::Wrapped),
            _ => None,
        },
        _ => None,
    }
}

/// Reads a document from a UTF-8 JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read, is not valid JSON, or has
/// an unsupported shape.
pub fn read_document(path: &Path) -> Result<Document, SgcleanError> {
    let bytes = fs::read(path)?;
    let value: Value =
        serde_json::from_slice(&bytes).map_err(|source| SgcleanError::JsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    Document::from_value(value)
}

/// Writes a document as pretty-printed UTF-8 JSON.
///
/// The whole document is rendered in memory first; the file is only created
/// once rendering has succeeded.
pub fn write_document(path: &Path, document: &Document) -> Result<(), SgcleanError> {
    let rendered = to_json_string(document).map_err(|source| SgcleanError::JsonWrite {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, rendered)?;
    Ok(())
}

/// Parses a document from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Document, SgcleanError> {
    from_json_slice(json.as_bytes())
}

/// Parses a document from raw JSON bytes.
pub fn from_json_slice(bytes: &[u8]) -> Result<Document, SgcleanError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| {
        SgcleanError::UnsupportedFormat(format!("input is not valid JSON: {}", e))
    })?;
    Document::from_value(value)
}

/// Renders a document as a pretty-printed JSON string.
pub fn to_json_string(document: &Document) -> Result<String, serde_json::Error> {
    let value = document.to_value()?;
    let mut out = serde_json::to_string_pretty(&value)?;
    out.push('\n');
    Ok(out)
}
