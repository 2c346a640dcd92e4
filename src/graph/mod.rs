//! Scene-graph data model for sgclean.
//!
//! Each image carries its own small graph: objects (nodes, with labels and
//! boxes) and relationships (edges referencing objects by id). Graphs never
//! share state across images, so every image can be cleaned in isolation.
//!
//! # Example
//!
//! ```
//! use sgclean::graph::{ImageAnnotation, Relationship, VgObject};
//!
//! let ann = ImageAnnotation::new(1u64)
//!     .with_object(VgObject::new(1u64, "cầu thủ").with_bbox(0.0, 0.0, 40.0, 90.0))
//!     .with_object(VgObject::new(2u64, "sân bóng đá").with_bbox(0.0, 0.0, 640.0, 480.0))
//!     .with_relationship(Relationship::new(1u64, "trên", 2u64));
//!
//! assert_eq!(ann.label_map().len(), 2);
//! ```

mod bbox;
mod ids;
pub mod io_json;
mod model;

// Re-export core types for convenient access
pub use bbox::{area, intersection_area, iou, BBoxXYWH};
pub use ids::{ImageId, ObjectId};
pub use io_json::{Document, Entry, Shape};
pub use model::{
    normalize_text, Coord, ImageAnnotation, ListSource, Relationship, Triplet, VgObject,
};
