use crate::error::BoundsError;
use crate::vector::Axis;

/// Generic axis-aligned bounding box for N-dimensional space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<const D: usize> {
    pub min: [f64; D],
    pub max: [f64; D],
}

impl<const D: usize> BoundingBox<D> {
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point of a flat coordinate buffer `[x, y, z, x, y, z, ...]`.
    pub fn from_points(points: &[f64]) -> Result<Self, BoundsError> {
        if points.is_empty() {
            return Err(BoundsError::NoVertices);
        }
        if points.len() % D != 0 {
            return Err(BoundsError::RaggedBuffer { len: points.len(), dim: D });
        }
        let mut min = [f64::INFINITY; D];
        let mut max = [f64::NEG_INFINITY; D];
        for chunk in points.chunks_exact(D) {
            for i in 0..D {
                if !chunk[i].is_finite() {
                    return Err(BoundsError::NonFinite { axis: i });
                }
                min[i] = min[i].min(chunk[i]);
                max[i] = max[i].max(chunk[i]);
            }
        }
        Ok(Self { min, max })
    }

    pub fn extents(&self) -> [f64; D] {
        let mut e = [0.0; D];
        for i in 0..D {
            e[i] = self.max[i] - self.min[i];
        }
        e
    }

    /// Checks that the box is finite, not inverted and not collapsed to a point.
    pub fn validate(&self) -> Result<(), BoundsError> {
        for i in 0..D {
            if !self.min[i].is_finite() || !self.max[i].is_finite() {
                return Err(BoundsError::NonFinite { axis: i });
            }
            if self.min[i] > self.max[i] {
                return Err(BoundsError::Inverted { axis: i, min: self.min[i], max: self.max[i] });
            }
        }
        if self.extents().iter().all(|&e| e == 0.0) {
            return Err(BoundsError::Empty);
        }
        Ok(())
    }
}

/// Which local axis of the patient asset runs head-to-foot, left-to-right and front-to-back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InferredAxes {
    pub long: Axis,
    pub wide: Axis,
    pub thick: Axis,
}

/// Orders the three axes by descending extent: longest is `long`, then `wide`, then `thick`.
///
/// Equal extents keep ascending axis order (X before Y before Z), so the result is
/// deterministic for cubes and other symmetric boxes.
pub fn infer_axes(bounds: &BoundingBox<3>) -> InferredAxes {
    let extents = bounds.extents();
    let mut axes = Axis::ALL;
    // `sort_by` is stable, ties stay in axis order.
    axes.sort_by(|a, b| extents[b.index()].total_cmp(&extents[a.index()]));
    InferredAxes {
        long: axes[0],
        wide: axes[1],
        thick: axes[2],
    }
}

/// Local-space bounds of the patient asset, captured once when it finishes loading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PatientBounds {
    bbox: BoundingBox<3>,
    ready: bool,
}

impl Default for PatientBounds {
    fn default() -> Self {
        Self::pending()
    }
}

impl PatientBounds {
    /// Bounds before the asset has loaded. Classification treats these as a miss.
    pub fn pending() -> Self {
        Self {
            bbox: BoundingBox::new([0.0; 3], [0.0; 3]),
            ready: false,
        }
    }

    /// Captures the raw, pre-transform box of the loaded asset.
    pub fn capture(min: [f64; 3], max: [f64; 3]) -> Result<Self, BoundsError> {
        let bbox = BoundingBox::new(min, max);
        bbox.validate()?;
        Ok(Self { bbox, ready: true })
    }

    /// Captures the box spanned by a flat `xyz` vertex buffer.
    pub fn capture_from_positions(positions: &[f64]) -> Result<Self, BoundsError> {
        let bbox = BoundingBox::<3>::from_points(positions)?;
        Self::capture(bbox.min, bbox.max)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The captured box, or `None` before readiness.
    pub fn bbox(&self) -> Option<&BoundingBox<3>> {
        self.ready.then_some(&self.bbox)
    }

    pub fn axes(&self) -> Option<InferredAxes> {
        self.bbox().map(infer_axes)
    }
}
