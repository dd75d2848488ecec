use carmsim::{
    BeamResolver, BeamUpdate, Control, GantryConfig, MissReason, NodeId, PatientBounds, SimConfig, Simulator,
    Skeleton, Zone, classify_beam, classify_pose, intersect_beam,
};
use carmsim::classifier::Outcome;
use carmsim::controls::ControlState;
use carmsim::simulation::resolve_anchors;

// Standing adult asset: 1.7 tall on y, 0.5 wide on x, 0.3 thick on z.
const MIN: [f64; 3] = [-0.25, -0.85, -0.15];
const MAX: [f64; 3] = [0.25, 0.85, 0.15];

fn ready_simulator() -> Simulator {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    assert_eq!(sim.capture_patient(MIN, MAX), Ok(true));
    sim
}

#[test]
fn test_scenario_defaults_hit_torso() {
    let mut sim = ready_simulator();
    let report = sim.tick(0.0);
    assert!(report.result.hit, "default pose should hit the patient");
    assert!(
        matches!(report.result.zone, Zone::Thorax | Zone::Abdomen),
        "expected thorax or abdomen, got {}",
        report.result.zone
    );
}

#[test]
fn test_scenario_head_end() {
    let mut sim = ready_simulator();
    assert_eq!(sim.set_control(Control::CartX, 0.8), 0.8);
    sim.set_control(Control::Lift, 0.0);
    let report = sim.tick(0.0);
    assert!(report.result.hit);
    assert_eq!(report.result.zone, Zone::Head);
}

#[test]
fn test_scenario_lateral_miss() {
    let mut sim = ready_simulator();
    sim.set_control(Control::CartZ, 1.5);
    sim.set_debug(true);
    let report = sim.tick(0.0);
    assert!(!report.result.hit);
    assert_eq!(report.result.zone, Zone::Miss);
    let diagnostics = report.result.diagnostics.unwrap();
    assert_eq!(diagnostics.miss, Some(MissReason::NoEntry));
}

#[test]
fn test_scenario_not_ready() {
    let config = SimConfig::default();
    let skeleton = Skeleton::standard();
    let patient = config.patient.transform();
    for (control, value) in [
        (Control::CartX, 0.8),
        (Control::CartX, 1.7),
        (Control::CartZ, 0.0),
        (Control::Orbital, 45.0),
        (Control::ColumnRotation, -90.0),
    ] {
        let controls = ControlState::new(config.controls).with(control, value);
        let result = classify_pose(&config, &skeleton, &PatientBounds::pending(), &patient, &controls);
        assert_eq!(result.zone, Zone::Miss);
        assert!(!result.is_hit());
        assert_eq!(result.outcome, Outcome::NotReady);
    }

    let mut sim = Simulator::new(config).unwrap();
    let report = sim.tick(0.0);
    assert_eq!(report.result.zone, Zone::Miss);
    assert!(!report.result.hit);
}

#[test]
fn test_scenario_coincident_anchors() {
    // Source and detector mounted on the same point of the C-arm.
    let gantry = GantryConfig { source_offset: 0.2, detector_offset: 0.2, ..GantryConfig::default() };
    let config = SimConfig { gantry, ..SimConfig::default() };
    let (source, detector) = resolve_anchors(&config, &ControlState::new(config.controls));
    assert_eq!(source, detector);

    let mut sim = Simulator::new(config.clone()).unwrap();
    sim.capture_patient(MIN, MAX).unwrap();
    sim.set_debug(true);
    let report = sim.tick(0.0);
    assert_eq!(report.beam, Some(BeamUpdate::Retained));
    assert_eq!(report.result.zone, Zone::Miss);
    assert!(!report.result.hit);
    let diagnostics = report.result.diagnostics.unwrap();
    assert_eq!(diagnostics.miss, Some(MissReason::DegenerateBeam));
    assert!(diagnostics.sid.is_none());

    let bounds = PatientBounds::capture(MIN, MAX).unwrap();
    let patient = config.patient.transform();
    let miss = intersect_beam(source, detector, &patient, bounds.bbox().unwrap());
    assert!(!miss.is_hit());
    let result = classify_beam(source, detector, &patient, &bounds, &Skeleton::standard(), &config.classifier);
    assert_eq!(result.outcome, Outcome::Missed(MissReason::DegenerateBeam));
}

#[test]
fn test_scenario_resolver_keeps_last_valid_orientation() {
    let config = SimConfig::default();
    let mut chain = carmsim::KinematicChain::from_gantry(&config.gantry);
    chain.update(&ControlState::new(config.controls).with(Control::Orbital, 30.0));
    let mut resolver = BeamResolver::new(config.gantry.source_radius, config.gantry.detector_radius);
    let first = resolver.resolve(chain.world_position(NodeId::Source), chain.world_position(NodeId::Detector));
    let BeamUpdate::Updated(valid) = first else {
        panic!("expected a valid beam, got {:?}", first);
    };

    let point = chain.world_position(NodeId::CSlide);
    assert_eq!(resolver.resolve(point, point), BeamUpdate::Retained);
    let kept = resolver.current().unwrap();
    assert_eq!(kept, &valid);
    assert!(kept.direction.iter().all(|c| c.is_finite()));
    assert!((kept.tilt_deg() - 30.0).abs() < 1e-9);
}
