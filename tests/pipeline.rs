use carmsim::{Control, ControlRamp, PatientBounds, PatientState, SimConfig, Simulator, Zone, select_image};

const MIN: [f64; 3] = [-0.25, -0.85, -0.15];
const MAX: [f64; 3] = [0.25, 0.85, 0.15];

fn ready_simulator(config: SimConfig) -> Simulator {
    let mut sim = Simulator::new(config).unwrap();
    sim.capture_patient(MIN, MAX).unwrap();
    sim
}

#[test]
fn test_classification_is_throttled() {
    let mut sim = ready_simulator(SimConfig::default());
    let frames: Vec<bool> = (0..13).map(|i| sim.tick(i as f64 / 60.0).classified).collect();
    // 60 fps against 10 Hz: frames 0, 6 and 12.
    let expected: Vec<bool> = (0..13).map(|i| i % 6 == 0).collect();
    assert_eq!(frames, expected);
}

#[test]
fn test_throttled_frames_keep_previous_result() {
    let mut sim = ready_simulator(SimConfig::default());
    let first = sim.tick(0.0);
    assert_eq!(first.result.zone, Zone::Abdomen);

    // Move to the head between classifications: the readout lags until the next slot.
    sim.set_control(Control::CartX, 0.8);
    sim.set_control(Control::Lift, 0.0);
    let lagging = sim.tick(0.05);
    assert!(!lagging.classified);
    assert_eq!(lagging.result.zone, Zone::Abdomen);
    let fresh = sim.tick(0.1);
    assert!(fresh.classified);
    assert_eq!(fresh.result.zone, Zone::Head);
}

#[test]
fn test_clock_going_backwards_reclassifies() {
    let mut sim = ready_simulator(SimConfig::default());
    assert!(sim.tick(10.0).classified);
    assert!(sim.tick(1.0).classified);
}

#[test]
fn test_exposure_latches_zone_at_trigger() {
    let mut sim = ready_simulator(SimConfig::default());
    sim.set_control(Control::CartX, 0.8);
    sim.set_control(Control::Lift, 0.0);
    sim.tick(0.0);
    assert_eq!(sim.expose(0.0), Some(1));

    // The gantry drives to the abdomen while the exposure settles.
    sim.reset_controls();
    let mut delivered = None;
    for i in 1..=10 {
        let report = sim.tick(i as f64 * 0.1);
        if let Some(outcome) = report.exposure {
            delivered = Some((i, outcome));
            break;
        }
        assert_eq!(sim.expose(i as f64 * 0.1), None, "second exposure accepted while settling");
    }
    let (frame, outcome) = delivered.expect("exposure was never delivered");
    assert_eq!(frame, 6);
    assert_eq!(sim.latest().zone, Zone::Abdomen);
    assert_eq!(outcome.zone, Zone::Head);
    assert!(outcome.hit);
    assert_eq!(outcome.image, select_image(Zone::Head));
    assert_eq!(outcome.label(), "Head / Skull");
}

#[test]
fn test_exposure_before_patient_is_blank() {
    let mut sim = Simulator::new(SimConfig::from_json(r#"{ "exposure": { "settle_delay_s": 0.0 } }"#).unwrap()).unwrap();
    sim.expose(0.0);
    let outcome = sim.tick(0.0).exposure.unwrap();
    assert_eq!(outcome.zone, Zone::Miss);
    assert!(!outcome.hit);
}

#[test]
fn test_teardown_ignores_late_asset_load() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    sim.tick(0.0);
    sim.teardown();
    assert!(!sim.is_mounted());

    let bounds = PatientBounds::capture(MIN, MAX).unwrap();
    assert!(!sim.on_patient_loaded(bounds));
    assert_eq!(sim.state().patient, PatientState::Pending);

    sim.on_patient_load_failed("late network error");
    assert_eq!(sim.state().patient, PatientState::Pending);

    let report = sim.tick(1.0);
    assert!(report.beam.is_none());
    assert!(!report.classified);
    assert_eq!(sim.expose(1.0), None);
}

#[test]
fn test_teardown_drops_pending_exposure() {
    let mut sim = ready_simulator(SimConfig::default());
    sim.tick(0.0);
    sim.expose(0.0);
    sim.teardown();
    assert!(sim.tick(5.0).exposure.is_none());
}

#[test]
fn test_load_failure_keeps_gantry_usable() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    sim.on_patient_load_failed("404 patient.glb");
    assert_eq!(sim.state().patient, PatientState::Failed("404 patient.glb".to_string()));

    sim.start_ramp(ControlRamp::new(Control::Orbital, 20.0, 40.0));
    sim.tick(0.0);
    let report = sim.tick(1.0);
    assert_eq!(sim.controls().get(Control::Orbital), 20.0);
    assert!(report.beam.is_some());
    assert_eq!(report.result.zone, Zone::Miss);
    assert!(!report.result.hit);
}

#[test]
fn test_second_capture_keeps_first_bounds() {
    let mut sim = ready_simulator(SimConfig::default());
    let captured = sim.state().patient.clone();
    assert_eq!(sim.capture_patient([-2.0, -0.1, -0.1], [2.0, 0.1, 0.1]), Ok(false));
    assert_eq!(sim.capture_patient_positions(&[-2.0, -0.1, -0.1, 2.0, 0.1, 0.1]), Ok(false));
    assert_eq!(sim.state().patient, captured);
    assert_eq!(sim.tick(0.0).result.zone, Zone::Abdomen);
}

#[test]
fn test_capture_after_failure_stays_a_miss() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    sim.on_patient_load_failed("404");
    assert_eq!(sim.capture_patient(MIN, MAX), Ok(false));
    assert!(!sim.on_patient_loaded(PatientBounds::capture(MIN, MAX).unwrap()));
    assert_eq!(sim.state().patient, PatientState::Failed("404".to_string()));

    let report = sim.tick(0.0);
    assert_eq!(report.result.zone, Zone::Miss);
    assert!(!report.result.hit);
}

#[test]
fn test_late_failure_keeps_ready_patient() {
    let mut sim = ready_simulator(SimConfig::default());
    let captured = sim.state().patient.clone();
    assert_eq!(sim.capture_patient([0.0; 3], [0.0; 3]), Ok(false));
    assert_eq!(sim.capture_patient_positions(&[]), Ok(false));
    sim.on_patient_load_failed("stale error");
    assert_eq!(sim.state().patient, captured);
    assert!(sim.tick(0.0).result.hit);
}

#[test]
fn test_invalid_positions_fail_the_pending_patient() {
    let mut sim = Simulator::new(SimConfig::default()).unwrap();
    assert!(sim.capture_patient_positions(&[0.1, 0.2]).is_err());
    assert!(matches!(sim.state().patient, PatientState::Failed(_)));
}

#[test]
fn test_config_round_trip() {
    let mut config = SimConfig::default();
    config.classifier.rate_hz = 25.0;
    config.exposure.settle_delay_s = 1.25;
    config.gantry.arm_reach = 0.85;
    let json = config.to_json().unwrap();
    let parsed = SimConfig::from_json(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_invalid_config_is_rejected() {
    let bad = SimConfig::from_json(r#"{ "patient": { "scale": 0.0 } }"#);
    assert!(bad.is_err());
    let mut config = SimConfig::default();
    config.classifier.rate_hz = -1.0;
    assert!(Simulator::new(config).is_err());
}
