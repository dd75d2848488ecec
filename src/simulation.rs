//! The per-tick pipeline.
//!
//! All mutable simulator state lives in one [`SimulationState`]; [`Simulator::tick`] runs the
//! stages in a fixed order each frame: ramps, transform chain, beam, classification (at
//! most `rate_hz`), then exposure delivery.

use crate::beam::{BeamGeometry, BeamResolver, BeamUpdate};
use crate::bounds::PatientBounds;
use crate::chain::{KinematicChain, NodeId};
use crate::classifier::{self, BeamClassification, ClassificationResult};
use crate::config::SimConfig;
use crate::controls::{Control, ControlRamp, ControlState};
use crate::error::{BoundsError, ConfigError};
use crate::exposure::{ExposureController, ExposureOutcome};
use crate::overlay::DebugOverlay;
use crate::skeleton::Skeleton;
use crate::transform::Transform;
use crate::vector::Vec3;

/// Loading state of the patient asset.
#[derive(Clone, Debug, PartialEq)]
pub enum PatientState {
    /// Still loading. Classification reports a miss.
    Pending,
    Ready(PatientBounds),
    /// Loading failed; classification stays a miss for the rest of the session.
    Failed(String),
}

impl PatientState {
    /// Bounds to classify against; pending bounds unless the asset is ready.
    pub fn bounds(&self) -> PatientBounds {
        match self {
            PatientState::Ready(bounds) => *bounds,
            _ => PatientBounds::pending(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PatientState::Ready(_))
    }
}

/// Mutable simulator state. Written by the host between ticks, read by the pipeline.
#[derive(Clone, Debug)]
pub struct SimulationState {
    pub controls: ControlState,
    pub chain: KinematicChain,
    pub beam: BeamResolver,
    pub patient: PatientState,
    pub patient_world: Transform,
    pub debug: bool,
    pub mounted: bool,
    pub ramps: [Option<ControlRamp>; Control::COUNT],
    pub last_tick: Option<f64>,
    pub last_classified_at: Option<f64>,
    pub latest: ClassificationResult,
    pub overlay: Option<DebugOverlay>,
    pub exposure: ExposureController,
}

/// What one tick did.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    /// `None` once the simulator has been torn down.
    pub beam: Option<BeamUpdate>,
    /// Whether classification ran on this tick.
    pub classified: bool,
    pub result: ClassificationResult,
    pub exposure: Option<ExposureOutcome>,
}

/// World-space source and detector for a control pose.
pub fn resolve_anchors(config: &SimConfig, controls: &ControlState) -> (Vec3, Vec3) {
    let mut chain = KinematicChain::from_gantry(&config.gantry);
    chain.update(controls);
    (chain.world_position(NodeId::Source), chain.world_position(NodeId::Detector))
}

/// Classifies one control pose from scratch, without any simulator state.
pub fn classify_pose(
    config: &SimConfig,
    skeleton: &Skeleton,
    bounds: &PatientBounds,
    patient_world: &Transform,
    controls: &ControlState,
) -> BeamClassification {
    let (source, detector) = resolve_anchors(config, controls);
    classifier::classify_beam(
        source,
        detector,
        patient_world,
        bounds,
        skeleton,
        &config.classifier,
    )
}

#[derive(Clone, Debug)]
pub struct Simulator {
    config: SimConfig,
    skeleton: Skeleton,
    state: SimulationState,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        Self::with_skeleton(config, Skeleton::standard())
    }

    pub fn with_skeleton(config: SimConfig, skeleton: Skeleton) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut chain = KinematicChain::from_gantry(&config.gantry);
        let controls = ControlState::new(config.controls);
        chain.update(&controls);
        let state = SimulationState {
            controls,
            chain,
            beam: BeamResolver::new(config.gantry.source_radius, config.gantry.detector_radius),
            patient: PatientState::Pending,
            patient_world: config.patient.transform(),
            debug: false,
            mounted: true,
            ramps: [None; Control::COUNT],
            last_tick: None,
            last_classified_at: None,
            latest: ClassificationResult::miss(),
            overlay: None,
            exposure: ExposureController::new(&config.exposure),
        };
        Ok(Self { config, skeleton, state })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn controls(&self) -> &ControlState {
        &self.state.controls
    }

    /// Latest throttled classification.
    pub fn latest(&self) -> &ClassificationResult {
        &self.state.latest
    }

    /// Overlay from the latest classification, when debug mode is on.
    pub fn overlay(&self) -> Option<&DebugOverlay> {
        self.state.overlay.as_ref()
    }

    /// Sets a control directly. Cancels any ramp on it. Returns the clamped value.
    pub fn set_control(&mut self, control: Control, value: f64) -> f64 {
        self.state.ramps[control.index()] = None;
        self.state.controls.set(control, value)
    }

    pub fn nudge(&mut self, control: Control, steps: i32) -> f64 {
        self.state.ramps[control.index()] = None;
        self.state.controls.nudge(control, steps)
    }

    /// Starts (or replaces) a ramp on one control, advanced by subsequent ticks.
    pub fn start_ramp(&mut self, ramp: ControlRamp) {
        self.state.ramps[ramp.control.index()] = Some(ramp);
    }

    pub fn reset_controls(&mut self) {
        self.state.ramps = [None; Control::COUNT];
        self.state.controls.reset();
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.state.debug = debug;
        if !debug {
            self.state.overlay = None;
        }
    }

    /// Updates the patient's world transform, typically from the host scene graph.
    pub fn set_patient_transform(&mut self, transform: Transform) {
        if transform.inverse().is_none() {
            log::warn!("patient transform is singular, classification will miss");
        }
        self.state.patient_world = transform;
    }

    /// Whether an asset event may still change the patient. Only a pending patient on a
    /// mounted simulator accepts one.
    fn accepts_patient_event(&self, event: &str) -> bool {
        if !self.state.mounted {
            log::debug!("{} after teardown, ignored", event);
            return false;
        }
        if !matches!(self.state.patient, PatientState::Pending) {
            log::debug!("{} after the patient was settled, ignored", event);
            return false;
        }
        true
    }

    /// Asset-ready event. Only the first asset event of a session is accepted. Returns
    /// whether the bounds were accepted.
    pub fn on_patient_loaded(&mut self, bounds: PatientBounds) -> bool {
        if !self.accepts_patient_event("patient load") {
            return false;
        }
        let Some(axes) = bounds.axes() else {
            log::warn!("patient load reported bounds that were never captured");
            return false;
        };
        log::info!(
            "patient bounds captured: {:?}, long={:?} wide={:?} thick={:?}",
            bounds.bbox(),
            axes.long,
            axes.wide,
            axes.thick
        );
        self.state.patient = PatientState::Ready(bounds);
        self.state.last_classified_at = None;
        true
    }

    /// Captures the raw asset box and marks the patient ready. Invalid boxes leave the
    /// patient permanently failed. Once the patient is settled the box is not even checked.
    pub fn capture_patient(&mut self, min: [f64; 3], max: [f64; 3]) -> Result<bool, BoundsError> {
        if !self.accepts_patient_event("patient capture") {
            return Ok(false);
        }
        match PatientBounds::capture(min, max) {
            Ok(bounds) => Ok(self.on_patient_loaded(bounds)),
            Err(err) => {
                self.on_patient_load_failed(err.to_string());
                Err(err)
            }
        }
    }

    /// [`Simulator::capture_patient`] from raw `xyz` vertex positions.
    pub fn capture_patient_positions(&mut self, positions: &[f64]) -> Result<bool, BoundsError> {
        if !self.accepts_patient_event("patient capture") {
            return Ok(false);
        }
        match PatientBounds::capture_from_positions(positions) {
            Ok(bounds) => Ok(self.on_patient_loaded(bounds)),
            Err(err) => {
                self.on_patient_load_failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Asset-failed event. The rest of the simulator keeps working and the patient stays a
    /// miss for the session.
    pub fn on_patient_load_failed(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if !self.accepts_patient_event("patient load failure") {
            return;
        }
        log::warn!("patient asset failed to load: {}", reason);
        self.state.patient = PatientState::Failed(reason);
        self.state.last_classified_at = None;
    }

    /// Runs one frame of the pipeline at time `now` (seconds, monotonic).
    pub fn tick(&mut self, now: f64) -> TickReport {
        if !self.state.mounted {
            return TickReport {
                beam: None,
                classified: false,
                result: self.state.latest.clone(),
                exposure: None,
            };
        }

        let dt = self.state.last_tick.map_or(0.0, |last| (now - last).max(0.0));
        self.state.last_tick = Some(now);
        self.advance_ramps(dt);

        self.state.chain.update(&self.state.controls);
        let source = self.state.chain.world_position(NodeId::Source);
        let detector = self.state.chain.world_position(NodeId::Detector);
        let beam = self.state.beam.resolve(source, detector);

        let interval = self.config.classifier.interval_s();
        let due = self
            .state
            .last_classified_at
            .is_none_or(|last| now < last || now - last >= interval);
        if due {
            self.state.latest = self.classify_resolved(beam);
            self.state.last_classified_at = Some(now);
        }

        TickReport {
            beam: Some(beam),
            classified: due,
            result: self.state.latest.clone(),
            exposure: self.state.exposure.poll(now),
        }
    }

    /// Classifies the current controls immediately, bypassing the throttle. Does not touch
    /// the latest result.
    pub fn classify_now(&self) -> ClassificationResult {
        let (source, detector) = resolve_anchors(&self.config, &self.state.controls);
        let classification = classifier::classify_beam(
            source,
            detector,
            &self.state.patient_world,
            &self.state.patient.bounds(),
            &self.skeleton,
            &self.config.classifier,
        );
        let beam = BeamGeometry::between(source, detector);
        ClassificationResult::from_classification(&classification, beam.as_ref(), self.state.debug)
    }

    /// Starts an exposure, latching a fresh classification of the current pose. Returns the
    /// exposure's sequence number, or `None` if one is still settling or after teardown.
    pub fn expose(&mut self, now: f64) -> Option<u64> {
        if !self.state.mounted {
            return None;
        }
        let result = self.classify_now();
        self.state.exposure.trigger(now, &result)
    }

    /// Stops the pipeline. Later ticks do nothing and late asset events are ignored.
    pub fn teardown(&mut self) {
        if !self.state.mounted {
            return;
        }
        self.state.mounted = false;
        self.state.ramps = [None; Control::COUNT];
        self.state.exposure.cancel();
        log::info!("simulator torn down");
    }

    pub fn is_mounted(&self) -> bool {
        self.state.mounted
    }

    fn advance_ramps(&mut self, dt: f64) {
        let state = &mut self.state;
        for slot in state.ramps.iter_mut() {
            if let Some(ramp) = *slot {
                if ramp.advance(&mut state.controls, dt) {
                    *slot = None;
                }
            }
        }
    }

    fn classify_resolved(&mut self, beam: BeamUpdate) -> ClassificationResult {
        let source = self.state.chain.world_position(NodeId::Source);
        let detector = self.state.chain.world_position(NodeId::Detector);
        let classification = classifier::classify_beam(
            source,
            detector,
            &self.state.patient_world,
            &self.state.patient.bounds(),
            &self.skeleton,
            &self.config.classifier,
        );
        let geometry = match beam {
            BeamUpdate::Updated(geometry) => Some(geometry),
            BeamUpdate::Retained => None,
        };
        self.state.overlay = self.state.debug.then(|| {
            DebugOverlay::build(
                geometry.as_ref(),
                &classification,
                &self.skeleton,
                &self.state.patient_world,
            )
        });
        ClassificationResult::from_classification(&classification, geometry.as_ref(), self.state.debug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Zone;

    const MIN: [f64; 3] = [-0.25, -0.85, -0.15];
    const MAX: [f64; 3] = [0.25, 0.85, 0.15];

    #[test]
    fn test_pending_patient_is_a_miss() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        let report = sim.tick(0.0);
        assert!(report.classified);
        assert_eq!(report.result, ClassificationResult::miss());
        assert!(matches!(report.beam, Some(BeamUpdate::Updated(_))));
    }

    #[test]
    fn test_classify_now_matches_tick_without_touching_latest() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        sim.capture_patient(MIN, MAX).unwrap();
        sim.set_debug(true);
        let ticked = sim.tick(0.0).result;

        sim.set_control(Control::CartX, 0.8);
        sim.set_control(Control::Lift, 0.0);
        let now = sim.classify_now();
        assert_eq!(now.zone, Zone::Head);
        assert!(now.diagnostics.as_ref().is_some_and(|d| d.sid.is_some()));
        assert_eq!(sim.latest(), &ticked);

        assert_eq!(sim.tick(0.2).result, now);
    }

    #[test]
    fn test_ready_patient_is_hit_at_defaults() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        assert_eq!(sim.capture_patient(MIN, MAX), Ok(true));
        let report = sim.tick(0.0);
        assert!(report.result.hit);
        assert_eq!(report.result.zone, Zone::Abdomen);
    }

    #[test]
    fn test_ramps_advance_with_elapsed_time() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        sim.start_ramp(ControlRamp::new(Control::Orbital, 30.0, 60.0));
        sim.tick(0.0);
        sim.tick(0.25);
        assert!((sim.controls().get(Control::Orbital) - 15.0).abs() < 1e-9);
        sim.tick(1.0);
        assert_eq!(sim.controls().get(Control::Orbital), 30.0);
        assert!(sim.state().ramps.iter().all(Option::is_none));
    }

    #[test]
    fn test_set_control_cancels_ramp() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        sim.start_ramp(ControlRamp::new(Control::Lift, 0.2, 0.1));
        sim.set_control(Control::Lift, -0.1);
        sim.tick(0.0);
        sim.tick(5.0);
        assert_eq!(sim.controls().get(Control::Lift), -0.1);
    }

    #[test]
    fn test_debug_mode_fills_diagnostics_and_overlay() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        sim.capture_patient(MIN, MAX).unwrap();
        sim.set_debug(true);
        let report = sim.tick(0.0);
        let diagnostics = report.result.diagnostics.unwrap();
        assert!(diagnostics.nearest_edge.is_some());
        assert!((diagnostics.sid.unwrap() - 1.0).abs() < 1e-9);
        assert!(diagnostics.tilt_deg.unwrap().abs() < 1e-6);
        assert!(sim.overlay().is_some());

        sim.set_debug(false);
        assert!(sim.overlay().is_none());
    }

    #[test]
    fn test_invalid_bounds_fail_the_patient() {
        let mut sim = Simulator::new(SimConfig::default()).unwrap();
        assert!(sim.capture_patient([0.0; 3], [0.0; 3]).is_err());
        assert!(matches!(sim.state().patient, PatientState::Failed(_)));
        assert!(!sim.tick(0.0).result.hit);
    }
}
