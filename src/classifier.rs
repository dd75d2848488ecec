//! Beam-to-anatomy classification.
//!
//! Samples are spread evenly across the part of the beam inside the patient box. Each
//! sample finds its nearest skeleton edge and votes for that edge's zone with weight
//! `1 / (d² + ε)`, so zones the beam passes close to dominate zones merely touched at the
//! ends of the path.

use crate::beam::BeamGeometry;
use crate::bounds::PatientBounds;
use crate::config::ClassifierConfig;
use crate::intersect::{self, BeamInterval, MissReason};
use crate::skeleton::{ResolvedSkeleton, Skeleton};
use crate::transform::Transform;
use crate::vector::{self, Vec3};
use crate::zone::Zone;

/// Squared edge length below which an edge is treated as a single point.
pub const EDGE_EPS: f64 = 1e-12;

/// Closest point to `p` on segment `a`–`b`, and its fraction along the segment.
pub fn closest_on_segment(p: Vec3, a: Vec3, b: Vec3) -> (Vec3, f64) {
    let ab = vector::sub(b, a);
    let len_sq = vector::length_sq(ab);
    if len_sq < EDGE_EPS {
        return (a, 0.0);
    }
    let t = (vector::dot(vector::sub(p, a), ab) / len_sq).clamp(0.0, 1.0);
    (vector::add(a, vector::scale(ab, t)), t)
}

/// Nearest edge to a single point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointClass {
    pub zone: Zone,
    pub dist_sq: f64,
    /// Index into [`Skeleton::edges`].
    pub edge: usize,
    /// Projection fraction along the edge, in `[0, 1]`.
    pub fraction: f64,
    pub closest: Vec3,
}

/// Classifies a local-space point against every edge. Ties go to the earlier edge.
pub fn classify_point(point: Vec3, skeleton: &Skeleton, resolved: &ResolvedSkeleton) -> Option<PointClass> {
    let mut best: Option<PointClass> = None;
    for (i, edge) in skeleton.edges().iter().enumerate() {
        let (a, b) = resolved.endpoints(edge);
        let (closest, fraction) = closest_on_segment(point, a, b);
        let dist_sq = vector::distance_sq(point, closest);
        if best.is_none_or(|b| dist_sq < b.dist_sq) {
            best = Some(PointClass {
                zone: edge.rule.zone_at(fraction),
                dist_sq,
                edge: i,
                fraction,
                closest,
            });
        }
    }
    best
}

/// Evenly spaced fractions across `[t_start, t_end]`, both ends included.
///
/// A single sample, or an interval that has collapsed, yields just the midpoint.
pub fn sample_fractions(t_start: f64, t_end: f64, count: usize) -> Vec<f64> {
    if count <= 1 || !(t_end > t_start) {
        return vec![0.5 * (t_start + t_end)];
    }
    let span = t_end - t_start;
    let last = (count - 1) as f64;
    (0..count).map(|i| t_start + span * i as f64 / last).collect()
}

/// One classified point along the beam.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeamSample {
    /// Fraction along the source → detector segment.
    pub t: f64,
    /// Patient-local position.
    pub point: Vec3,
    pub zone: Zone,
    pub dist_sq: f64,
    pub edge: &'static str,
    /// Closest point on the nearest edge, patient-local.
    pub closest: Vec3,
}

/// Accumulated inverse-square vote weight per zone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoteTally {
    epsilon: f64,
    weights: [f64; Zone::COUNT],
    counts: [usize; Zone::COUNT],
}

impl VoteTally {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            weights: [0.0; Zone::COUNT],
            counts: [0; Zone::COUNT],
        }
    }

    /// Adds a vote for `zone` from a sample at squared distance `dist_sq`. Returns its weight.
    pub fn cast(&mut self, zone: Zone, dist_sq: f64) -> f64 {
        let weight = 1.0 / (dist_sq.max(0.0) + self.epsilon);
        self.weights[zone.index()] += weight;
        self.counts[zone.index()] += 1;
        weight
    }

    pub fn weight(&self, zone: Zone) -> f64 {
        self.weights[zone.index()]
    }

    pub fn count(&self, zone: Zone) -> usize {
        self.counts[zone.index()]
    }

    pub fn total_votes(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Heaviest zone. Exact ties go to the lowest zone ordinal; no votes is a miss.
    pub fn winner(&self) -> Zone {
        let mut best = Zone::Miss;
        let mut best_weight = 0.0;
        for zone in Zone::ALL {
            let w = self.weights[zone.index()];
            if self.counts[zone.index()] > 0 && (best.is_miss() || w > best_weight) {
                best = zone;
                best_weight = w;
            }
        }
        best
    }

    /// Zones that received at least one vote, with their weights, in zone order.
    pub fn ranked(&self) -> Vec<(Zone, f64)> {
        let mut out: Vec<(Zone, f64)> = Zone::ALL
            .into_iter()
            .filter(|z| self.counts[z.index()] > 0)
            .map(|z| (z, self.weights[z.index()]))
            .collect();
        // Stable: equal weights keep zone order.
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }
}

/// Samples and votes across a hit interval.
pub fn classify_interval(
    interval: &BeamInterval,
    skeleton: &Skeleton,
    resolved: &ResolvedSkeleton,
    config: &ClassifierConfig,
) -> (Zone, Vec<BeamSample>, VoteTally) {
    let mut tally = VoteTally::new(config.vote_epsilon);
    let mut samples = Vec::with_capacity(config.samples);
    for t in sample_fractions(interval.t_start, interval.t_end, config.samples) {
        let point = interval.point_at(t);
        let Some(class) = classify_point(point, skeleton, resolved) else {
            continue;
        };
        tally.cast(class.zone, class.dist_sq);
        samples.push(BeamSample {
            t,
            point,
            zone: class.zone,
            dist_sq: class.dist_sq,
            edge: skeleton.edges()[class.edge].name,
            closest: class.closest,
        });
    }
    (tally.winner(), samples, tally)
}

/// How far the beam got before classification.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Patient bounds are not captured yet.
    NotReady,
    Missed(MissReason),
    Hit(BeamInterval),
}

/// Full output of one beam classification.
#[derive(Clone, Debug, PartialEq)]
pub struct BeamClassification {
    pub zone: Zone,
    pub outcome: Outcome,
    pub samples: Vec<BeamSample>,
    pub tally: VoteTally,
    pub resolved: Option<ResolvedSkeleton>,
}

impl BeamClassification {
    fn short_circuit(outcome: Outcome, epsilon: f64) -> Self {
        Self {
            zone: Zone::Miss,
            outcome,
            samples: Vec::new(),
            tally: VoteTally::new(epsilon),
            resolved: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self.outcome, Outcome::Hit(_)) && !self.zone.is_miss()
    }

    /// Sample closest to any edge.
    pub fn nearest_sample(&self) -> Option<&BeamSample> {
        self.samples.iter().min_by(|a, b| a.dist_sq.total_cmp(&b.dist_sq))
    }
}

/// Classifies the world-space beam against the patient.
///
/// Not-ready bounds and every geometric miss short-circuit to [`Zone::Miss`] without
/// sampling.
pub fn classify_beam(
    source: Vec3,
    detector: Vec3,
    patient_world: &Transform,
    bounds: &PatientBounds,
    skeleton: &Skeleton,
    config: &ClassifierConfig,
) -> BeamClassification {
    let (Some(bbox), Some(axes)) = (bounds.bbox(), bounds.axes()) else {
        return BeamClassification::short_circuit(Outcome::NotReady, config.vote_epsilon);
    };
    let interval = match intersect::intersect_beam(source, detector, patient_world, bbox) {
        intersect::Intersection::Hit(interval) => interval,
        intersect::Intersection::Miss(reason) => {
            return BeamClassification::short_circuit(Outcome::Missed(reason), config.vote_epsilon);
        }
    };
    let resolved = skeleton.resolve(bbox, axes);
    let (zone, samples, tally) = classify_interval(&interval, skeleton, &resolved, config);
    BeamClassification {
        zone,
        outcome: Outcome::Hit(interval),
        samples,
        tally,
        resolved: Some(resolved),
    }
}

/// Debug-only details about a classification.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    /// Name of the edge nearest to any sample.
    pub nearest_edge: Option<&'static str>,
    /// Distance from that sample to the edge, in patient-local units.
    pub nearest_distance: Option<f64>,
    /// `(t_start, t_end)` of the hit interval.
    pub interval: Option<(f64, f64)>,
    pub miss: Option<MissReason>,
    /// World-space source-to-detector distance.
    pub sid: Option<f64>,
    pub tilt_deg: Option<f64>,
    pub azimuth_deg: Option<f64>,
    /// Vote weight per zone, heaviest first.
    pub votes: Vec<(Zone, f64)>,
    pub samples: usize,
}

/// Per-tick classification output handed to the UI.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationResult {
    pub zone: Zone,
    pub hit: bool,
    pub diagnostics: Option<Diagnostics>,
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::miss()
    }
}

impl ClassificationResult {
    pub fn miss() -> Self {
        Self {
            zone: Zone::Miss,
            hit: false,
            diagnostics: None,
        }
    }

    /// Condenses a classification; diagnostics are only gathered when `debug` is set.
    pub fn from_classification(classification: &BeamClassification, beam: Option<&BeamGeometry>, debug: bool) -> Self {
        let diagnostics = debug.then(|| {
            let nearest = classification.nearest_sample();
            Diagnostics {
                nearest_edge: nearest.map(|s| s.edge),
                nearest_distance: nearest.map(|s| s.dist_sq.sqrt()),
                interval: match classification.outcome {
                    Outcome::Hit(interval) => Some((interval.t_start, interval.t_end)),
                    _ => None,
                },
                miss: match classification.outcome {
                    Outcome::Missed(reason) => Some(reason),
                    _ => None,
                },
                sid: beam.map(|b| b.sid),
                tilt_deg: beam.map(BeamGeometry::tilt_deg),
                azimuth_deg: beam.map(BeamGeometry::azimuth_deg),
                votes: classification.tally.ranked(),
                samples: classification.samples.len(),
            }
        });
        Self {
            zone: classification.zone,
            hit: classification.is_hit(),
            diagnostics,
        }
    }

    pub fn key(&self) -> &'static str {
        self.zone.key()
    }

    pub fn label(&self) -> &'static str {
        self.zone.label()
    }
}
