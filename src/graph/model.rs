//! Per-image scene-graph model.
//!
//! Mirrors the Visual Genome JSON layout closely enough that a document can
//! be loaded, mutated in place and written back without losing fields this
//! crate does not understand: every struct keeps unknown keys in `extra`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use super::bbox::BBoxXYWH;
use super::ids::{ImageId, ObjectId};

/// Trims and lowercases a label or predicate.
///
/// This is the only text folding applied before any table lookup.
pub fn normalize_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// One annotated image: its objects, the relationships between them, and the
/// derived human-readable triplets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotation {
    /// Identifier of the image.
    pub image_id: ImageId,

    /// Objects in the image; ids are expected to be unique.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub objects: Vec<VgObject>,

    /// Relationships between objects of this image.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub relationships: Vec<Relationship>,

    /// Derived `(subject, predicate, object)` labels. Never edited directly;
    /// see [`crate::resolve::integrity::rebuild_triplets`].
    #[serde(default, deserialize_with = "null_as_empty")]
    pub triplets: Vec<Triplet>,

    /// Fields not interpreted by sgclean, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,

    /// How `relationships` appeared in the source entry. Set by the document
    /// reader; plain deserialization and [`ImageAnnotation::new`] assume an
    /// array.
    #[serde(skip)]
    pub relationships_source: ListSource,
}

/// The form a list field took in the source JSON.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListSource {
    #[default]
    Array,
    Null,
    Missing,
}

impl ListSource {
    /// Classifies `key` of a JSON object.
    pub fn of(value: &Value, key: &str) -> Self {
        match value.get(key) {
            None => ListSource::Missing,
            Some(Value::Null) => ListSource::Null,
            Some(_) => ListSource::Array,
        }
    }
}

impl ImageAnnotation {
    /// Creates an empty annotation for an image.
    pub fn new(image_id: impl Into<ImageId>) -> Self {
        Self {
            image_id: image_id.into(),
            objects: Vec::new(),
            relationships: Vec::new(),
            triplets: Vec::new(),
            extra: Map::new(),
            relationships_source: ListSource::Array,
        }
    }

    /// Adds an object.
    pub fn with_object(mut self, object: VgObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Adds a relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Maps every object id to its current canonical label.
    pub fn label_map(&self) -> HashMap<ObjectId, String> {
        self.objects
            .iter()
            .map(|o| (o.object_id, o.canonical_label()))
            .collect()
    }

    /// The distinct canonical labels currently present in the image.
    pub fn label_set(&self) -> HashSet<String> {
        self.objects.iter().map(VgObject::canonical_label).collect()
    }

    /// Looks up an object by id.
    pub fn object(&self, id: ObjectId) -> Option<&VgObject> {
        self.objects.iter().find(|o| o.object_id == id)
    }
}

/// An object instance: labels plus an optional bounding box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VgObject {
    pub object_id: ObjectId,

    /// Labels; the first one is the canonical name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub names: Vec<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_coord"
    )]
    pub x: Option<Coord>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_coord"
    )]
    pub y: Option<Coord>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_coord"
    )]
    pub w: Option<Coord>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_coord"
    )]
    pub h: Option<Coord>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VgObject {
    /// Creates an object with a single label and no geometry.
    pub fn new(object_id: impl Into<ObjectId>, name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            names: vec![name.into()],
            x: None,
            y: None,
            w: None,
            h: None,
            extra: Map::new(),
        }
    }

    /// Sets the bounding box.
    pub fn with_bbox(mut self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.x = Some(Coord::Number(x));
        self.y = Some(Coord::Number(y));
        self.w = Some(Coord::Number(w));
        self.h = Some(Coord::Number(h));
        self
    }

    /// The first label, trimmed and lowercased; empty when there is none.
    pub fn canonical_label(&self) -> String {
        self.names
            .first()
            .map(|n| normalize_text(n))
            .unwrap_or_default()
    }

    /// Replaces all labels with `label`.
    pub fn set_label(&mut self, label: impl Into<String>) {
        self.names = vec![label.into()];
    }

    /// The bounding box, or `None` when any of x/y/w/h is missing or not
    /// numeric.
    pub fn bbox(&self) -> Option<BBoxXYWH> {
        let coord = |c: &Option<Coord>| c.as_ref().and_then(Coord::as_f64);
        Some(BBoxXYWH::new(
            coord(&self.x)?,
            coord(&self.y)?,
            coord(&self.w)?,
            coord(&self.h)?,
        ))
    }

    /// Returns true if the geometry is incomplete.
    pub fn is_malformed(&self) -> bool {
        self.bbox().is_none()
    }

    /// Clamped box area; zero for malformed objects.
    pub fn area(&self) -> f64 {
        self.bbox().map(|b| b.area()).unwrap_or(0.0)
    }

    /// IoU with another object; zero if either one is malformed.
    pub fn iou(&self, other: &VgObject) -> f64 {
        match (self.bbox(), other.bbox()) {
            (Some(a), Some(b)) => a.iou(&b),
            _ => 0.0,
        }
    }
}

/// A directed `subject --predicate--> object` edge between two objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub subject_id: ObjectId,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub predicate: String,

    pub object_id: ObjectId,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Relationship {
    /// Creates a relationship between two object ids.
    pub fn new(
        subject_id: impl Into<ObjectId>,
        predicate: impl Into<String>,
        object_id: impl Into<ObjectId>,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            predicate: predicate.into(),
            object_id: object_id.into(),
            extra: Map::new(),
        }
    }

    /// Returns true if either endpoint is in `ids`.
    pub fn touches(&self, ids: &HashSet<ObjectId>) -> bool {
        ids.contains(&self.subject_id) || ids.contains(&self.object_id)
    }
}

/// A relationship rendered with labels instead of ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triplet {
    #[serde(default, alias = "subj")]
    pub subject: String,
    #[serde(default, alias = "pred")]
    pub predicate: String,
    #[serde(default, alias = "obj")]
    pub object: String,
}

impl Triplet {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One box coordinate, kept in the form it was read in.
///
/// Numeric strings are still usable as geometry. Anything else is carried
/// through untouched and makes the box malformed.
#[derive(Clone, Debug, PartialEq)]
pub enum Coord {
    Number(f64),
    Text(String),
    Other(Value),
}

impl Coord {
    /// The coordinate as a finite number, if it is one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Coord::Number(v) => Some(*v),
            Coord::Text(s) => s.trim().parse::<f64>().ok(),
            Coord::Other(_) => None,
        }
        .filter(|v| v.is_finite())
    }
}

impl Serialize for Coord {
    /// Integral numbers are written as JSON integers so untouched boxes keep
    /// their original textual form.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        const MAX_EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
        match self {
            Coord::Number(v) if v.fract() == 0.0 && v.abs() < MAX_EXACT => {
                serializer.serialize_i64(*v as i64)
            }
            Coord::Number(v) => serializer.serialize_f64(*v),
            Coord::Text(s) => serializer.serialize_str(s),
            Coord::Other(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => match n.as_f64() {
                Some(v) => Coord::Number(v),
                None => Coord::Other(Value::Number(n)),
            },
            Value::String(s) => Coord::Text(s),
            other => Coord::Other(other),
        })
    }
}

/// A present key always yields `Some`, even for `null`, so the value is
/// written back.
fn present_coord<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Coord>, D::Error> {
    Coord::deserialize(deserializer).map(Some)
}
