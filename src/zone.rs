use std::fmt;

/// Anatomical region produced by the classifier.
///
/// The declaration order is the ordinal used to break exact vote ties: the earlier
/// variant wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    Head,
    Thorax,
    Abdomen,
    Pelvis,
    Shoulder,
    Humerus,
    Forearm,
    Hand,
    Femur,
    Knee,
    Tibia,
    Ankle,
    Foot,
    /// The beam does not reach the patient, or the patient is not ready.
    Miss,
}

impl Zone {
    pub const COUNT: usize = 14;

    pub const ALL: [Zone; Zone::COUNT] = [
        Zone::Head,
        Zone::Thorax,
        Zone::Abdomen,
        Zone::Pelvis,
        Zone::Shoulder,
        Zone::Humerus,
        Zone::Forearm,
        Zone::Hand,
        Zone::Femur,
        Zone::Knee,
        Zone::Tibia,
        Zone::Ankle,
        Zone::Foot,
        Zone::Miss,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable machine key.
    pub fn key(self) -> &'static str {
        match self {
            Zone::Head => "head",
            Zone::Thorax => "thorax",
            Zone::Abdomen => "abdomen",
            Zone::Pelvis => "pelvis",
            Zone::Shoulder => "shoulder",
            Zone::Humerus => "humerus",
            Zone::Forearm => "forearm",
            Zone::Hand => "hand",
            Zone::Femur => "femur",
            Zone::Knee => "knee",
            Zone::Tibia => "tibia",
            Zone::Ankle => "ankle",
            Zone::Foot => "foot",
            Zone::Miss => "miss",
        }
    }

    /// Human-readable label for the target readout.
    pub fn label(self) -> &'static str {
        match self {
            Zone::Head => "Head / Skull",
            Zone::Thorax => "Thorax / Chest",
            Zone::Abdomen => "Abdomen",
            Zone::Pelvis => "Pelvis / Hip",
            Zone::Shoulder => "Shoulder",
            Zone::Humerus => "Upper Arm (Humerus)",
            Zone::Forearm => "Forearm",
            Zone::Hand => "Hand / Wrist",
            Zone::Femur => "Thigh (Femur)",
            Zone::Knee => "Knee",
            Zone::Tibia => "Lower Leg (Tibia)",
            Zone::Ankle => "Ankle",
            Zone::Foot => "Foot",
            Zone::Miss => "No Target",
        }
    }

    /// Unknown keys map to [`Zone::Miss`].
    pub fn from_key(key: &str) -> Zone {
        Zone::ALL.into_iter().find(|z| z.key() == key).unwrap_or(Zone::Miss)
    }

    pub fn is_miss(self) -> bool {
        self == Zone::Miss
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
