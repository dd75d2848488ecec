//! Debug overlay: world-space markers built from the same quantities the classifier used.

use crate::beam::BeamGeometry;
use crate::classifier::{BeamClassification, Outcome};
use crate::skeleton::{LandmarkId, Skeleton};
use crate::transform::Transform;
use crate::vector::Vec3;
use crate::zone::Zone;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleMarker {
    pub point: Vec3,
    /// Closest point on the nearest edge.
    pub closest: Vec3,
    pub zone: Zone,
    pub edge: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LandmarkMarker {
    pub id: LandmarkId,
    pub position: Vec3,
}

/// Everything the host needs to draw the debug view, in world coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugOverlay {
    /// Source and detector.
    pub ray: Option<(Vec3, Vec3)>,
    pub entry: Option<Vec3>,
    pub exit: Option<Vec3>,
    pub samples: Vec<SampleMarker>,
    pub landmarks: Vec<LandmarkMarker>,
    /// Resolved edges as world-space segments, in catalog order.
    pub edges: Vec<(Vec3, Vec3)>,
}

impl DebugOverlay {
    pub fn build(
        beam: Option<&BeamGeometry>,
        classification: &BeamClassification,
        skeleton: &Skeleton,
        patient_world: &Transform,
    ) -> Self {
        let to_world = |p: Vec3| patient_world.transform_point(p);
        let mut overlay = DebugOverlay {
            ray: beam.map(|b| (b.source, b.detector)),
            ..Default::default()
        };
        if let Outcome::Hit(interval) = &classification.outcome {
            overlay.entry = Some(to_world(interval.entry));
            overlay.exit = Some(to_world(interval.exit));
        }
        overlay.samples = classification
            .samples
            .iter()
            .map(|s| SampleMarker {
                point: to_world(s.point),
                closest: to_world(s.closest),
                zone: s.zone,
                edge: s.edge,
            })
            .collect();
        if let Some(resolved) = &classification.resolved {
            overlay.landmarks = LandmarkId::ALL
                .iter()
                .map(|&id| LandmarkMarker { id, position: to_world(resolved.point(id)) })
                .collect();
            overlay.edges = skeleton
                .edges()
                .iter()
                .map(|edge| {
                    let (a, b) = resolved.endpoints(edge);
                    (to_world(a), to_world(b))
                })
                .collect();
        }
        overlay
    }

    /// Line segments as a flat `[ax, ay, az, bx, by, bz, ...]` buffer: the beam ray first,
    /// then one segment from each sample to its closest edge point.
    pub fn line_buffer(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(6 * (1 + self.samples.len()));
        let segments = self
            .ray
            .iter()
            .copied()
            .chain(self.samples.iter().map(|s| (s.point, s.closest)));
        for (a, b) in segments {
            out.extend_from_slice(&a);
            out.extend_from_slice(&b);
        }
        out
    }

    /// Landmark positions as a flat `xyz` buffer, in [`LandmarkId`] order.
    pub fn landmark_buffer(&self) -> Vec<f64> {
        self.landmarks.iter().flat_map(|m| m.position).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::PatientBounds;
    use crate::classifier::classify_beam;
    use crate::config::ClassifierConfig;

    #[test]
    fn test_overlay_follows_patient_transform() {
        let bounds = PatientBounds::capture([-0.25, -0.85, -0.15], [0.25, 0.85, 0.15]).unwrap();
        let skeleton = Skeleton::standard();
        let patient = Transform::from_translation([10.0, 0.0, 0.0]);
        let (source, detector) = ([10.0, 0.35, -1.0], [10.0, 0.35, 1.0]);
        let classification =
            classify_beam(source, detector, &patient, &bounds, &skeleton, &ClassifierConfig::default());
        let beam = BeamGeometry::between(source, detector);
        let overlay = DebugOverlay::build(beam.as_ref(), &classification, &skeleton, &patient);

        assert_eq!(overlay.ray, Some((source, detector)));
        let entry = overlay.entry.unwrap();
        assert!((entry[0] - 10.0).abs() < 1e-9);
        assert!((entry[2] + 0.15).abs() < 1e-9);
        assert_eq!(overlay.samples.len(), 9);
        assert_eq!(overlay.landmarks.len(), LandmarkId::COUNT);
        assert_eq!(overlay.edges.len(), skeleton.edges().len());
        assert!(overlay.landmarks.iter().all(|m| m.position[0] > 9.0));
        assert_eq!(overlay.line_buffer().len(), 6 * 10);
        assert_eq!(overlay.landmark_buffer().len(), 3 * LandmarkId::COUNT);
    }

    #[test]
    fn test_overlay_for_miss_has_only_the_ray() {
        let skeleton = Skeleton::standard();
        let classification = classify_beam(
            [0.0, -1.0, 0.0],
            [0.0, 1.0, 0.0],
            &Transform::IDENTITY,
            &PatientBounds::pending(),
            &skeleton,
            &ClassifierConfig::default(),
        );
        let beam = BeamGeometry::between([0.0, -1.0, 0.0], [0.0, 1.0, 0.0]);
        let overlay = DebugOverlay::build(beam.as_ref(), &classification, &skeleton, &Transform::IDENTITY);
        assert!(overlay.entry.is_none());
        assert!(overlay.samples.is_empty());
        assert!(overlay.landmarks.is_empty());
        assert_eq!(overlay.line_buffer().len(), 6);
    }
}
