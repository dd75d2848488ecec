//! The standard landmark layout and edge list.
//!
//! Fractions are normalized to the patient box with the long axis running from the feet
//! (0) to the top of the head (1). The lateral corrections were tuned against the
//! reference supine placement; `sweep::zone_map` shows their effect when recalibrating.

use super::{Edge, Landmark, LandmarkId, ZoneRule};
use crate::zone::Zone;

const fn midline(id: LandmarkId, long: f64, thick: f64) -> Landmark {
    Landmark { id, long, wide: 0.5, thick, lateral_correction: None }
}

const fn limb(id: LandmarkId, long: f64, wide: f64, thick: f64, correction: Option<f64>) -> Landmark {
    Landmark { id, long, wide, thick, lateral_correction: correction }
}

/// Indexed by [`LandmarkId`].
pub const LANDMARKS: [Landmark; LandmarkId::COUNT] = [
    midline(LandmarkId::HeadTop, 0.98, 0.5),
    midline(LandmarkId::Neck, 0.85, 0.45),
    midline(LandmarkId::Chest, 0.72, 0.5),
    midline(LandmarkId::Abdomen, 0.60, 0.45),
    midline(LandmarkId::Pelvis, 0.50, 0.5),
    limb(LandmarkId::LeftShoulder, 0.82, 0.22, 0.5, None),
    limb(LandmarkId::RightShoulder, 0.82, 0.78, 0.5, None),
    limb(LandmarkId::LeftElbow, 0.65, 0.10, 0.5, Some(0.03)),
    limb(LandmarkId::RightElbow, 0.65, 0.90, 0.5, Some(0.03)),
    limb(LandmarkId::LeftHand, 0.47, 0.07, 0.5, Some(0.04)),
    limb(LandmarkId::RightHand, 0.47, 0.93, 0.5, Some(0.04)),
    limb(LandmarkId::LeftHip, 0.50, 0.38, 0.5, None),
    limb(LandmarkId::RightHip, 0.50, 0.62, 0.5, None),
    limb(LandmarkId::LeftKnee, 0.28, 0.39, 0.52, Some(0.02)),
    limb(LandmarkId::RightKnee, 0.28, 0.61, 0.52, Some(0.02)),
    limb(LandmarkId::LeftFoot, 0.03, 0.40, 0.55, Some(0.03)),
    limb(LandmarkId::RightFoot, 0.03, 0.60, 0.55, Some(0.03)),
];

const THORACOLUMBAR: &[(f64, Zone)] = &[(0.3, Zone::Thorax), (1.0, Zone::Abdomen)];
const LUMBOSACRAL: &[(f64, Zone)] = &[(0.6, Zone::Abdomen), (1.0, Zone::Pelvis)];
const HUMERUS: &[(f64, Zone)] = &[(0.2, Zone::Shoulder), (1.0, Zone::Humerus)];
const FOREARM: &[(f64, Zone)] = &[(0.85, Zone::Forearm), (1.0, Zone::Hand)];
const FEMUR: &[(f64, Zone)] = &[(0.88, Zone::Femur), (1.0, Zone::Knee)];
const LOWER_LEG: &[(f64, Zone)] = &[
    (0.1, Zone::Knee),
    (0.85, Zone::Tibia),
    (0.93, Zone::Ankle),
    (1.0, Zone::Foot),
];

const fn edge(name: &'static str, from: LandmarkId, to: LandmarkId, rule: ZoneRule) -> Edge {
    Edge { name, from, to, rule }
}

pub const EDGES: &[Edge] = &[
    edge("skull", LandmarkId::HeadTop, LandmarkId::Neck, ZoneRule::Constant(Zone::Head)),
    edge("thoracic_spine", LandmarkId::Neck, LandmarkId::Chest, ZoneRule::Constant(Zone::Thorax)),
    edge("thoracolumbar_spine", LandmarkId::Chest, LandmarkId::Abdomen, ZoneRule::Split(THORACOLUMBAR)),
    edge("lumbosacral_spine", LandmarkId::Abdomen, LandmarkId::Pelvis, ZoneRule::Split(LUMBOSACRAL)),
    edge("left_clavicle", LandmarkId::Neck, LandmarkId::LeftShoulder, ZoneRule::Constant(Zone::Shoulder)),
    edge("right_clavicle", LandmarkId::Neck, LandmarkId::RightShoulder, ZoneRule::Constant(Zone::Shoulder)),
    edge("left_humerus", LandmarkId::LeftShoulder, LandmarkId::LeftElbow, ZoneRule::Split(HUMERUS)),
    edge("left_forearm", LandmarkId::LeftElbow, LandmarkId::LeftHand, ZoneRule::Split(FOREARM)),
    edge("left_pelvis", LandmarkId::Pelvis, LandmarkId::LeftHip, ZoneRule::Constant(Zone::Pelvis)),
    edge("left_femur", LandmarkId::LeftHip, LandmarkId::LeftKnee, ZoneRule::Split(FEMUR)),
    edge("left_lower_leg", LandmarkId::LeftKnee, LandmarkId::LeftFoot, ZoneRule::Split(LOWER_LEG)),
    edge("right_humerus", LandmarkId::RightShoulder, LandmarkId::RightElbow, ZoneRule::Split(HUMERUS)),
    edge("right_forearm", LandmarkId::RightElbow, LandmarkId::RightHand, ZoneRule::Split(FOREARM)),
    edge("right_pelvis", LandmarkId::Pelvis, LandmarkId::RightHip, ZoneRule::Constant(Zone::Pelvis)),
    edge("right_femur", LandmarkId::RightHip, LandmarkId::RightKnee, ZoneRule::Split(FEMUR)),
    edge("right_lower_leg", LandmarkId::RightKnee, LandmarkId::RightFoot, ZoneRule::Split(LOWER_LEG)),
];
