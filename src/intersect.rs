//! Beam–patient intersection in the patient's local frame.

use crate::bounds::BoundingBox;
use crate::transform::Transform;
use crate::vector::{self, Vec3};

/// Shortest source-to-detector distance considered a usable beam.
pub const MIN_SID: f64 = 1e-8;
/// Direction components below this magnitude are treated as parallel to a slab.
pub const PARALLEL_EPS: f64 = 1e-12;

/// Distance along a unit ray from `origin` to the first point inside `bbox`.
///
/// An origin already inside the box yields `Some(0.0)`. Returns `None` when the ray
/// misses the box or the box lies entirely behind the origin.
pub fn ray_box(origin: Vec3, dir: Vec3, bbox: &BoundingBox<3>) -> Option<f64> {
    let mut t_near = f64::NEG_INFINITY;
    let mut t_far = f64::INFINITY;
    for i in 0..3 {
        if dir[i].abs() < PARALLEL_EPS {
            if origin[i] < bbox.min[i] || origin[i] > bbox.max[i] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / dir[i];
        let t1 = (bbox.min[i] - origin[i]) * inv;
        let t2 = (bbox.max[i] - origin[i]) * inv;
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }
    let entry = t_near.max(0.0);
    if t_far < entry {
        return None;
    }
    Some(entry)
}

/// The part of the beam that lies inside the patient box, in local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamInterval {
    pub local_source: Vec3,
    pub local_detector: Vec3,
    /// Beam length measured in the patient's local units.
    pub local_sid: f64,
    pub entry: Vec3,
    pub exit: Vec3,
    /// Fraction along source → detector where the beam enters the box, in `[0, 1]`.
    pub t_start: f64,
    /// Fraction along source → detector where the beam leaves the box, in `[t_start, 1]`.
    pub t_end: f64,
}

impl BeamInterval {
    /// Local-space point at fraction `t` of the source → detector segment.
    pub fn point_at(&self, t: f64) -> Vec3 {
        vector::lerp(self.local_source, self.local_detector, t)
    }
}

/// Why a beam produced no usable interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissReason {
    /// The patient transform cannot be inverted.
    SingularTransform,
    /// Source and detector coincide in local space.
    DegenerateBeam,
    /// The beam line never enters the box.
    NoEntry,
    /// The box is only reached past the detector.
    BeyondDetector,
    /// Entry and exit collapse to a single fraction (tangential beam).
    EmptyInterval,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Intersection {
    Hit(BeamInterval),
    Miss(MissReason),
}

impl Intersection {
    pub fn is_hit(&self) -> bool {
        matches!(self, Intersection::Hit(_))
    }

    pub fn interval(&self) -> Option<&BeamInterval> {
        match self {
            Intersection::Hit(interval) => Some(interval),
            Intersection::Miss(_) => None,
        }
    }
}

/// Intersects the world-space beam with the patient box.
///
/// Both anchors are taken into the patient's local frame, the box is entered from the
/// source end and exited by casting back from the detector. Total over every finite input.
pub fn intersect_beam(
    source: Vec3,
    detector: Vec3,
    patient_world: &Transform,
    bbox: &BoundingBox<3>,
) -> Intersection {
    let Some(to_local) = patient_world.inverse() else {
        return Intersection::Miss(MissReason::SingularTransform);
    };
    let local_source = to_local.transform_point(source);
    let local_detector = to_local.transform_point(detector);
    intersect_local(local_source, local_detector, bbox)
}

/// [`intersect_beam`] for anchors already in the patient's local frame.
pub fn intersect_local(local_source: Vec3, local_detector: Vec3, bbox: &BoundingBox<3>) -> Intersection {
    let delta = vector::sub(local_detector, local_source);
    let local_sid = vector::length(delta);
    let Some(dir) = vector::normalize(delta, MIN_SID) else {
        return Intersection::Miss(MissReason::DegenerateBeam);
    };

    let Some(t_entry) = ray_box(local_source, dir, bbox) else {
        return Intersection::Miss(MissReason::NoEntry);
    };
    if t_entry > local_sid {
        return Intersection::Miss(MissReason::BeyondDetector);
    }
    let entry = vector::add(local_source, vector::scale(dir, t_entry));

    let back = vector::scale(dir, -1.0);
    let exit = match ray_box(local_detector, back, bbox) {
        Some(t_back) => vector::add(local_detector, vector::scale(back, t_back)),
        None => entry,
    };

    let fraction = |p: Vec3| (vector::dot(vector::sub(p, local_source), dir) / local_sid).clamp(0.0, 1.0);
    let t_start = fraction(entry);
    let t_end = fraction(exit);
    if !(t_end > t_start) {
        return Intersection::Miss(MissReason::EmptyInterval);
    }

    Intersection::Hit(BeamInterval {
        local_source,
        local_detector,
        local_sid,
        entry,
        exit,
        t_start,
        t_end,
    })
}
