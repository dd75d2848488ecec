use crate::intersect::MIN_SID;
use crate::transform::Transform;
use crate::vector::{self, Vec3};

/// World-space beam between the source and detector anchors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamGeometry {
    pub source: Vec3,
    pub detector: Vec3,
    /// Unit vector from source to detector.
    pub direction: Vec3,
    /// Source-to-detector distance.
    pub sid: f64,
}

impl BeamGeometry {
    /// Returns `None` when the anchors are closer than [`MIN_SID`] or not finite.
    pub fn between(source: Vec3, detector: Vec3) -> Option<Self> {
        if !vector::is_finite(source) || !vector::is_finite(detector) {
            return None;
        }
        let delta = vector::sub(detector, source);
        let direction = vector::normalize(delta, MIN_SID)?;
        Some(Self {
            source,
            detector,
            direction,
            sid: vector::length(delta),
        })
    }

    /// Angle between the beam and world +Y, in degrees. 0 for a source-below beam.
    pub fn tilt_deg(&self) -> f64 {
        self.direction[1].clamp(-1.0, 1.0).acos().to_degrees()
    }

    /// Heading of the beam's horizontal component, in degrees from +X toward +Z.
    /// Zero for a vertical beam.
    pub fn azimuth_deg(&self) -> f64 {
        let [x, _, z] = self.direction;
        if x.hypot(z) < 1e-9 {
            return 0.0;
        }
        z.atan2(x).to_degrees()
    }
}

/// Pose of the visual beam volume: a frustum with its narrow end at the source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamFrustum {
    pub apex: Vec3,
    pub axis: Vec3,
    pub length: f64,
    pub apex_radius: f64,
    pub base_radius: f64,
}

impl BeamFrustum {
    pub fn new(beam: &BeamGeometry, apex_radius: f64, base_radius: f64) -> Self {
        Self {
            apex: beam.source,
            axis: beam.direction,
            length: beam.sid,
            apex_radius,
            base_radius,
        }
    }

    /// Maps a unit frustum (apex at the origin, base of radius 1 at `y = 1`) onto the beam.
    pub fn transform(&self) -> Transform {
        let r = self.base_radius;
        let scale = Transform {
            linear: [[r, 0.0, 0.0], [0.0, self.length, 0.0], [0.0, 0.0, r]],
            translation: [0.0; 3],
        };
        Transform::from_translation(self.apex)
            .then(&Transform::align_y(self.axis))
            .then(&scale)
    }

    /// Ratio of apex to base radius, for a unit frustum built with that taper.
    pub fn taper(&self) -> f64 {
        if self.base_radius > 0.0 { self.apex_radius / self.base_radius } else { 1.0 }
    }
}

/// Result of one resolver update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BeamUpdate {
    Updated(BeamGeometry),
    /// The anchors were degenerate; the previous pose is kept.
    Retained,
}

/// Tracks the beam pose from tick to tick and fails soft on degenerate anchors.
#[derive(Clone, Debug, Default)]
pub struct BeamResolver {
    apex_radius: f64,
    base_radius: f64,
    current: Option<BeamGeometry>,
    frustum: Option<BeamFrustum>,
    skipped: u64,
}

impl BeamResolver {
    pub fn new(apex_radius: f64, base_radius: f64) -> Self {
        Self {
            apex_radius,
            base_radius,
            ..Self::default()
        }
    }

    pub fn resolve(&mut self, source: Vec3, detector: Vec3) -> BeamUpdate {
        match BeamGeometry::between(source, detector) {
            Some(beam) => {
                self.frustum = Some(BeamFrustum::new(&beam, self.apex_radius, self.base_radius));
                self.current = Some(beam);
                BeamUpdate::Updated(beam)
            }
            None => {
                self.skipped += 1;
                log::debug!("beam update skipped: source and detector coincide");
                BeamUpdate::Retained
            }
        }
    }

    /// Last valid beam, if any update has succeeded.
    pub fn current(&self) -> Option<&BeamGeometry> {
        self.current.as_ref()
    }

    pub fn frustum(&self) -> Option<&BeamFrustum> {
        self.frustum.as_ref()
    }

    /// Number of updates skipped for degenerate anchors.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertical_beam() {
        let beam = BeamGeometry::between([1.0, 0.0, 0.0], [1.0, 1.0, 0.0]).unwrap();
        assert_eq!(beam.direction, [0.0, 1.0, 0.0]);
        assert_eq!(beam.sid, 1.0);
        assert!(beam.tilt_deg().abs() < 1e-9);
        assert_eq!(beam.azimuth_deg(), 0.0);
    }

    #[test]
    fn test_tilted_beam_angles() {
        let beam = BeamGeometry::between([0.0, 0.0, 0.0], [0.0, 1.0, 1.0]).unwrap();
        assert!((beam.tilt_deg() - 45.0).abs() < 1e-9);
        assert!((beam.azimuth_deg() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_sid_boundary() {
        assert!(BeamGeometry::between([0.0; 3], [0.0, 0.5 * MIN_SID, 0.0]).is_none());
        assert!(BeamGeometry::between([0.0; 3], [0.0, 2.0 * MIN_SID, 0.0]).is_some());
    }

    #[test]
    fn test_resolver_retains_pose_on_degenerate_anchors() {
        let mut resolver = BeamResolver::new(0.01, 0.15);
        let first = resolver.resolve([0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        assert!(matches!(first, BeamUpdate::Updated(_)));
        let frustum = *resolver.frustum().unwrap();

        assert_eq!(resolver.resolve([0.3, 0.3, 0.3], [0.3, 0.3, 0.3]), BeamUpdate::Retained);
        assert_eq!(resolver.frustum(), Some(&frustum));
        assert_eq!(resolver.current().unwrap().direction, [0.0, 1.0, 0.0]);
        assert_eq!(resolver.skipped(), 1);
    }

    #[test]
    fn test_frustum_transform_places_base_at_detector() {
        let beam = BeamGeometry::between([1.0, 0.0, 2.0], [1.0, 0.0, 3.0]).unwrap();
        let frustum = BeamFrustum::new(&beam, 0.01, 0.15);
        let t = frustum.transform();
        let apex = t.transform_point([0.0, 0.0, 0.0]);
        let base = t.transform_point([0.0, 1.0, 0.0]);
        for i in 0..3 {
            assert!((apex[i] - beam.source[i]).abs() < 1e-9);
            assert!((base[i] - beam.detector[i]).abs() < 1e-9);
        }
        let rim = t.transform_point([1.0, 1.0, 0.0]);
        assert!((vector::length(vector::sub(rim, base)) - 0.15).abs() < 1e-9);
    }
}
