use carmsim::classifier::{Outcome, VoteTally, classify_interval};
use carmsim::controls::ControlState;
use carmsim::intersect::{Intersection, intersect_local};
use carmsim::simulation::resolve_anchors;
use carmsim::vector::{self, Vec3};
use carmsim::{
    Axis, BoundingBox, Control, InferredAxes, PatientBounds, SimConfig, Skeleton, Zone, classify_beam, classify_pose,
    infer_axes,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MIN: [f64; 3] = [-0.25, -0.85, -0.15];
const MAX: [f64; 3] = [0.25, 0.85, 0.15];

fn random_controls(rng: &mut StdRng, config: &SimConfig) -> ControlState {
    let mut controls = ControlState::new(config.controls);
    for control in Control::ALL {
        let range = config.controls.get(control);
        controls.set(control, rng.gen_range(range.min..=range.max));
    }
    controls
}

#[test]
fn test_classification_is_deterministic() {
    let config = SimConfig::default();
    let skeleton = Skeleton::standard();
    let bounds = PatientBounds::capture(MIN, MAX).unwrap();
    let patient = config.patient.transform();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let controls = random_controls(&mut rng, &config);
        let a = classify_pose(&config, &skeleton, &bounds, &patient, &controls);
        let b = classify_pose(&config, &skeleton, &bounds, &patient, &controls);
        assert_eq!(a, b);
    }
}

#[test]
fn test_miss_before_ready() {
    let config = SimConfig::default();
    let skeleton = Skeleton::standard();
    let patient = config.patient.transform();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..100 {
        let controls = random_controls(&mut rng, &config);
        let result = classify_pose(&config, &skeleton, &PatientBounds::pending(), &patient, &controls);
        assert_eq!(result.zone, Zone::Miss);
        assert!(!result.is_hit());
    }
}

#[test]
fn test_axis_inference() {
    let bounds = BoundingBox::new(MIN, MAX);
    assert_eq!(
        infer_axes(&bounds),
        InferredAxes { long: Axis::Y, wide: Axis::X, thick: Axis::Z }
    );

    // Same asset lying along z.
    let lying = BoundingBox::new([-0.25, -0.15, -0.85], [0.25, 0.15, 0.85]);
    assert_eq!(
        infer_axes(&lying),
        InferredAxes { long: Axis::Z, wide: Axis::X, thick: Axis::Y }
    );
}

#[test]
fn test_hit_interval_is_ordered_and_clamped() {
    let config = SimConfig::default();
    let skeleton = Skeleton::standard();
    let bounds = PatientBounds::capture(MIN, MAX).unwrap();
    let patient = config.patient.transform();
    let mut rng = StdRng::seed_from_u64(3);
    let mut hits = 0;
    for _ in 0..500 {
        let controls = random_controls(&mut rng, &config);
        let result = classify_pose(&config, &skeleton, &bounds, &patient, &controls);
        if let Outcome::Hit(interval) = result.outcome {
            hits += 1;
            assert!(0.0 <= interval.t_start, "{:?}", interval);
            assert!(interval.t_start <= interval.t_end, "{:?}", interval);
            assert!(interval.t_end <= 1.0, "{:?}", interval);
        }
    }
    assert!(hits > 0, "random poses never hit the patient");

    // Random segments in and around the box, including ones that start or end inside it.
    let bbox = BoundingBox::new(MIN, MAX);
    for _ in 0..2000 {
        let mut point = || -> Vec3 { std::array::from_fn(|_| rng.gen_range(-1.2..1.2)) };
        let (a, b) = (point(), point());
        if let Intersection::Hit(interval) = intersect_local(a, b, &bbox) {
            assert!(0.0 <= interval.t_start && interval.t_start <= interval.t_end && interval.t_end <= 1.0);
        }
    }
}

#[test]
fn test_zone_is_stable_under_millimeter_perturbation() {
    let config = SimConfig::default();
    let skeleton = Skeleton::standard();
    let bounds = PatientBounds::capture(MIN, MAX).unwrap();
    let patient = config.patient.transform();
    let mut rng = StdRng::seed_from_u64(42);

    // Mid-thorax, mid-abdomen and the skull, each well away from a split threshold.
    for (cart_x, lift, expected) in [(1.3, -0.3, Zone::Thorax), (1.7, -0.3, Zone::Abdomen), (0.8, 0.0, Zone::Head)] {
        let controls = ControlState::new(config.controls)
            .with(Control::CartX, cart_x)
            .with(Control::Lift, lift);
        let (source, detector) = resolve_anchors(&config, &controls);
        let base = classify_beam(source, detector, &patient, &bounds, &skeleton, &config.classifier);
        assert_eq!(base.zone, expected);

        for _ in 0..200 {
            let mut jitter = || -> Vec3 { std::array::from_fn(|_| rng.gen_range(-0.001..=0.001)) };
            let s = vector::add(source, jitter());
            let d = vector::add(detector, jitter());
            let result = classify_beam(s, d, &patient, &bounds, &skeleton, &config.classifier);
            assert_eq!(result.zone, expected, "perturbed beam {:?} -> {:?}", s, d);
        }
    }
}

#[test]
fn test_near_votes_outweigh_more_distant_votes() {
    let mut tally = VoteTally::new(1e-4);
    for _ in 0..5 {
        tally.cast(Zone::Femur, 0.1 * 0.1);
    }
    for _ in 0..4 {
        tally.cast(Zone::Knee, 0.0);
    }
    assert_eq!(tally.count(Zone::Femur), 5);
    assert_eq!(tally.count(Zone::Knee), 4);
    assert_eq!(tally.winner(), Zone::Knee);
    assert!(tally.weight(Zone::Knee) > 10.0 * tally.weight(Zone::Femur));
}

#[test]
fn test_sampled_votes_follow_the_nearest_bone() {
    // A beam through the shaft of the left femur of an unscaled upright asset.
    let bbox = BoundingBox::new(MIN, MAX);
    let skeleton = Skeleton::standard();
    let resolved = skeleton.resolve(&bbox, infer_axes(&bbox));
    let hip = resolved.point(carmsim::skeleton::LandmarkId::LeftHip);
    let knee = resolved.point(carmsim::skeleton::LandmarkId::LeftKnee);
    let shaft = vector::lerp(hip, knee, 0.5);

    let source = [shaft[0], shaft[1], -1.0];
    let detector = [shaft[0], shaft[1], 1.0];
    let Intersection::Hit(interval) = intersect_local(source, detector, &bbox) else {
        panic!("beam should cross the box");
    };
    let (zone, samples, tally) = classify_interval(&interval, &skeleton, &resolved, &Default::default());
    assert_eq!(zone, Zone::Femur);
    assert_eq!(samples.len(), 9);
    assert_eq!(tally.winner(), Zone::Femur);
    assert!(samples.iter().any(|s| s.edge == "left_femur"));
}
