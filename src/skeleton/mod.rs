//! Stylized skeleton used to classify beam samples.
//!
//! Landmarks are defined in normalized patient-box coordinates and resolved into the
//! patient's local frame on demand; edges between landmarks carry the zone rule that
//! turns "nearest bone" into an anatomical region.

pub mod catalog;

use crate::bounds::{BoundingBox, InferredAxes};
use crate::vector::Vec3;
use crate::zone::Zone;

/// Named skeletal reference points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LandmarkId {
    HeadTop,
    Neck,
    Chest,
    Abdomen,
    Pelvis,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftHand,
    RightHand,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftFoot,
    RightFoot,
}

impl LandmarkId {
    pub const COUNT: usize = 17;

    pub const ALL: [LandmarkId; LandmarkId::COUNT] = [
        LandmarkId::HeadTop,
        LandmarkId::Neck,
        LandmarkId::Chest,
        LandmarkId::Abdomen,
        LandmarkId::Pelvis,
        LandmarkId::LeftShoulder,
        LandmarkId::RightShoulder,
        LandmarkId::LeftElbow,
        LandmarkId::RightElbow,
        LandmarkId::LeftHand,
        LandmarkId::RightHand,
        LandmarkId::LeftHip,
        LandmarkId::RightHip,
        LandmarkId::LeftKnee,
        LandmarkId::RightKnee,
        LandmarkId::LeftFoot,
        LandmarkId::RightFoot,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LandmarkId::HeadTop => "head_top",
            LandmarkId::Neck => "neck",
            LandmarkId::Chest => "chest",
            LandmarkId::Abdomen => "abdomen",
            LandmarkId::Pelvis => "pelvis",
            LandmarkId::LeftShoulder => "left_shoulder",
            LandmarkId::RightShoulder => "right_shoulder",
            LandmarkId::LeftElbow => "left_elbow",
            LandmarkId::RightElbow => "right_elbow",
            LandmarkId::LeftHand => "left_hand",
            LandmarkId::RightHand => "right_hand",
            LandmarkId::LeftHip => "left_hip",
            LandmarkId::RightHip => "right_hip",
            LandmarkId::LeftKnee => "left_knee",
            LandmarkId::RightKnee => "right_knee",
            LandmarkId::LeftFoot => "left_foot",
            LandmarkId::RightFoot => "right_foot",
        }
    }
}

/// A skeletal reference point in normalized (0..1) patient-box coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub id: LandmarkId,
    /// Fraction along the long axis, 0 at the box minimum (feet of a y-up asset).
    pub long: f64,
    /// Fraction along the wide axis, 0.5 on the midline.
    pub wide: f64,
    /// Fraction along the thick axis.
    pub thick: f64,
    /// Extra outward push from the midline, in the asset's local units.
    pub lateral_correction: Option<f64>,
}

/// Maps a position along an edge to a zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZoneRule {
    Constant(Zone),
    /// Ascending `(threshold, zone)` pairs; the first threshold strictly greater than the
    /// fraction selects the zone, and the entry at 1.0 covers the far end.
    Split(&'static [(f64, Zone)]),
}

impl ZoneRule {
    pub fn zone_at(&self, fraction: f64) -> Zone {
        match *self {
            ZoneRule::Constant(zone) => zone,
            ZoneRule::Split(table) => table
                .iter()
                .find(|(threshold, _)| *threshold > fraction)
                .or_else(|| table.iter().find(|(threshold, _)| *threshold >= 1.0))
                .or_else(|| table.last())
                .map(|&(_, zone)| zone)
                .unwrap_or(Zone::Miss),
        }
    }
}

/// A bone or region: a segment between two landmarks plus its zone rule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub name: &'static str,
    pub from: LandmarkId,
    pub to: LandmarkId,
    pub rule: ZoneRule,
}

/// Landmark set plus edge list.
#[derive(Clone, Debug, PartialEq)]
pub struct Skeleton {
    landmarks: [Landmark; LandmarkId::COUNT],
    edges: &'static [Edge],
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::standard()
    }
}

impl Skeleton {
    /// The built-in skeleton calibrated for a supine adult asset.
    pub fn standard() -> Self {
        Self {
            landmarks: catalog::LANDMARKS,
            edges: catalog::EDGES,
        }
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn landmark(&self, id: LandmarkId) -> &Landmark {
        &self.landmarks[id.index()]
    }

    pub fn edges(&self) -> &[Edge] {
        self.edges
    }

    /// Overrides the lateral correction of one landmark, e.g. when recalibrating against
    /// a different asset.
    pub fn set_lateral_correction(&mut self, id: LandmarkId, correction: Option<f64>) {
        self.landmarks[id.index()].lateral_correction = correction;
    }

    /// Resolves every landmark into the patient's local frame.
    pub fn resolve(&self, bbox: &BoundingBox<3>, axes: InferredAxes) -> ResolvedSkeleton {
        let (long, wide, thick) = (axes.long.index(), axes.wide.index(), axes.thick.index());
        let midline = 0.5 * (bbox.min[wide] + bbox.max[wide]);
        let lerp = |axis: usize, f: f64| bbox.min[axis] + f * (bbox.max[axis] - bbox.min[axis]);

        let mut points = [[0.0; 3]; LandmarkId::COUNT];
        for (point, landmark) in points.iter_mut().zip(&self.landmarks) {
            point[long] = lerp(long, landmark.long);
            point[wide] = lerp(wide, landmark.wide);
            point[thick] = lerp(thick, landmark.thick);
            if let Some(correction) = landmark.lateral_correction {
                if point[wide] >= midline {
                    point[wide] += correction;
                } else {
                    point[wide] -= correction;
                }
            }
        }
        ResolvedSkeleton { points }
    }
}

/// Landmark positions in the patient's local frame, indexed by [`LandmarkId`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedSkeleton {
    points: [Vec3; LandmarkId::COUNT],
}

impl ResolvedSkeleton {
    pub fn point(&self, id: LandmarkId) -> Vec3 {
        self.points[id.index()]
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn endpoints(&self, edge: &Edge) -> (Vec3, Vec3) {
        (self.point(edge.from), self.point(edge.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::infer_axes;

    const SPLIT: &[(f64, Zone)] = &[(0.1, Zone::Knee), (0.85, Zone::Tibia), (1.0, Zone::Foot)];

    #[test]
    fn test_split_rule_picks_first_greater_threshold() {
        let rule = ZoneRule::Split(SPLIT);
        assert_eq!(rule.zone_at(0.0), Zone::Knee);
        assert_eq!(rule.zone_at(0.1), Zone::Tibia);
        assert_eq!(rule.zone_at(0.5), Zone::Tibia);
        assert_eq!(rule.zone_at(0.9), Zone::Foot);
        // Nothing exceeds 1.0, the far-end entry applies.
        assert_eq!(rule.zone_at(1.0), Zone::Foot);
    }

    #[test]
    fn test_constant_rule_ignores_fraction() {
        let rule = ZoneRule::Constant(Zone::Pelvis);
        assert_eq!(rule.zone_at(0.0), Zone::Pelvis);
        assert_eq!(rule.zone_at(1.0), Zone::Pelvis);
    }

    #[test]
    fn test_resolve_maps_fractions_onto_inferred_axes() {
        let bbox = BoundingBox::new([-0.25, -0.85, -0.15], [0.25, 0.85, 0.15]);
        let skeleton = Skeleton::standard();
        let resolved = skeleton.resolve(&bbox, infer_axes(&bbox));

        let head = resolved.point(LandmarkId::HeadTop);
        let head_def = skeleton.landmark(LandmarkId::HeadTop);
        assert!((head[1] - (-0.85 + 1.7 * head_def.long)).abs() < 1e-12);
        assert!(head[0].abs() < 1e-12, "head sits on the midline");
    }

    #[test]
    fn test_lateral_correction_pushes_outward() {
        let bbox = BoundingBox::new([-0.25, -0.85, -0.15], [0.25, 0.85, 0.15]);
        let axes = infer_axes(&bbox);
        let mut skeleton = Skeleton::standard();
        let corrected = skeleton.resolve(&bbox, axes);
        skeleton.set_lateral_correction(LandmarkId::LeftHand, None);
        skeleton.set_lateral_correction(LandmarkId::RightHand, None);
        let plain = skeleton.resolve(&bbox, axes);

        // Left hand sits below the midline on X and moves further down, right hand moves up.
        assert!(corrected.point(LandmarkId::LeftHand)[0] < plain.point(LandmarkId::LeftHand)[0]);
        assert!(corrected.point(LandmarkId::RightHand)[0] > plain.point(LandmarkId::RightHand)[0]);
        assert_eq!(corrected.point(LandmarkId::Chest), plain.point(LandmarkId::Chest));
    }
}
