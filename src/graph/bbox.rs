//! Bounding boxes in the Visual Genome `(x, y, w, h)` layout and the
//! overlap geometry the resolver passes rely on.

/// An axis-aligned bounding box: top-left corner plus width and height.
///
/// Note: negative widths or heights are representable. Malformed upstream
/// boxes are not rejected here; [`area`] clamps them to zero instead.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBoxXYWH {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBoxXYWH {
    /// Creates a new bounding box from its top-left corner and size.
    #[inline]
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Returns the corners as `(xmin, ymin, xmax, ymax)`.
    #[inline]
    pub fn to_xyxy(&self) -> (f64, f64, f64, f64) {
        (self.x, self.y, self.x + self.w, self.y + self.h)
    }

    /// Returns the clamped area. See [`area`].
    #[inline]
    pub fn area(&self) -> f64 {
        area(self)
    }

    /// Returns the intersection-over-union with `other`. See [`iou`].
    #[inline]
    pub fn iou(&self, other: &BBoxXYWH) -> f64 {
        iou(self, other)
    }
}

/// Area of a box, with negative dimensions clamped to zero.
#[inline]
pub fn area(b: &BBoxXYWH) -> f64 {
    b.w.max(0.0) * b.h.max(0.0)
}

/// Area of the overlap between two boxes; zero when they are disjoint.
pub fn intersection_area(a: &BBoxXYWH, b: &BBoxXYWH) -> f64 {
    let (ax1, ay1, ax2, ay2) = a.to_xyxy();
    let (bx1, by1, bx2, by2) = b.to_xyxy();

    let iw = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
    let ih = (ay2.min(by2) - ay1.max(by1)).max(0.0);
    iw * ih
}

/// Intersection-over-union of two boxes, in `[0, 1]`.
///
/// Returns 0.0 when the union is empty (both boxes degenerate).
pub fn iou(a: &BBoxXYWH, b: &BBoxXYWH) -> f64 {
    let inter = intersection_area(a, b);
    let union = area(a) + area(b) - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}
