use crate::chain::NodeId;
use crate::classifier::ClassificationResult;
use crate::config::SimConfig;
use crate::controls::{Control, ControlRamp};
use crate::exposure::ExposureOutcome;
use crate::simulation::{Simulator, TickReport};
use crate::sweep;
use crate::transform::Transform;
use crate::wasm::utils::parse_js_point;
use crate::zone::Zone;
use wasm_bindgen::prelude::*;

fn control(key: &str) -> Result<Control, JsError> {
    Control::from_key(key).ok_or_else(|| JsError::new(&format!("unknown control `{}`", key)))
}

/// Stable key of a zone index, as returned by [`CArmSimulator::zone_map`].
#[wasm_bindgen(js_name = zoneKey)]
pub fn zone_key(index: usize) -> String {
    Zone::ALL.get(index).copied().unwrap_or(Zone::Miss).key().to_string()
}

#[wasm_bindgen(js_name = zoneLabel)]
pub fn zone_label(key: &str) -> String {
    Zone::from_key(key).label().to_string()
}

// --- Classification ---

/// One classification, as shown in the target readout.
#[wasm_bindgen]
pub struct ZoneReading {
    inner: ClassificationResult,
}

#[wasm_bindgen]
impl ZoneReading {
    #[wasm_bindgen(getter)]
    pub fn zone(&self) -> String { self.inner.key().to_string() }
    #[wasm_bindgen(getter)]
    pub fn label(&self) -> String { self.inner.label().to_string() }
    #[wasm_bindgen(getter)]
    pub fn hit(&self) -> bool { self.inner.hit }
    #[wasm_bindgen(getter)]
    pub fn nearest_edge(&self) -> Option<String> {
        self.inner.diagnostics.as_ref()?.nearest_edge.map(str::to_string)
    }
    #[wasm_bindgen(getter)]
    pub fn nearest_distance(&self) -> Option<f64> { self.inner.diagnostics.as_ref()?.nearest_distance }
    #[wasm_bindgen(getter)]
    pub fn sid(&self) -> Option<f64> { self.inner.diagnostics.as_ref()?.sid }
    #[wasm_bindgen(getter)]
    pub fn tilt_deg(&self) -> Option<f64> { self.inner.diagnostics.as_ref()?.tilt_deg }
    #[wasm_bindgen(getter)]
    pub fn azimuth_deg(&self) -> Option<f64> { self.inner.diagnostics.as_ref()?.azimuth_deg }
    #[wasm_bindgen(getter)]
    pub fn t_start(&self) -> Option<f64> { self.inner.diagnostics.as_ref()?.interval.map(|i| i.0) }
    #[wasm_bindgen(getter)]
    pub fn t_end(&self) -> Option<f64> { self.inner.diagnostics.as_ref()?.interval.map(|i| i.1) }
    #[wasm_bindgen(getter)]
    pub fn miss_reason(&self) -> Option<String> {
        self.inner.diagnostics.as_ref()?.miss.map(|m| format!("{:?}", m))
    }
    /// Vote weight per zone index, zero for zones without votes. Empty outside debug mode.
    #[wasm_bindgen(getter)]
    pub fn votes(&self) -> Vec<f64> {
        let Some(diagnostics) = &self.inner.diagnostics else {
            return Vec::new();
        };
        let mut weights = vec![0.0; Zone::COUNT];
        for &(zone, weight) in &diagnostics.votes {
            weights[zone.index()] = weight;
        }
        weights
    }
}

// --- Exposure ---

/// A delivered exposure and the recipe for its image.
#[wasm_bindgen]
pub struct ExposureImage {
    inner: ExposureOutcome,
}

#[wasm_bindgen]
impl ExposureImage {
    #[wasm_bindgen(getter)]
    pub fn sequence(&self) -> usize { self.inner.sequence as usize }
    #[wasm_bindgen(getter)]
    pub fn zone(&self) -> String { self.inner.zone.key().to_string() }
    #[wasm_bindgen(getter)]
    pub fn label(&self) -> String { self.inner.label().to_string() }
    #[wasm_bindgen(getter)]
    pub fn hit(&self) -> bool { self.inner.hit }
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String { self.inner.image.kind.key().to_string() }
    #[wasm_bindgen(getter)]
    pub fn seed(&self) -> u64 { self.inner.image.seed }
    #[wasm_bindgen(getter)]
    pub fn grain(&self) -> f64 { self.inner.image.grain }
    #[wasm_bindgen(getter)]
    pub fn contrast(&self) -> f64 { self.inner.image.contrast }
    #[wasm_bindgen(getter)]
    pub fn rotation_deg(&self) -> f64 { self.inner.image.rotation_deg }
}

// --- Tick ---

#[wasm_bindgen]
pub struct TickResult {
    inner: TickReport,
}

#[wasm_bindgen]
impl TickResult {
    /// False when the beam pose was kept from an earlier tick.
    #[wasm_bindgen(getter)]
    pub fn beam_updated(&self) -> bool {
        matches!(self.inner.beam, Some(crate::beam::BeamUpdate::Updated(_)))
    }
    #[wasm_bindgen(getter)]
    pub fn classified(&self) -> bool { self.inner.classified }
    #[wasm_bindgen(getter)]
    pub fn reading(&self) -> ZoneReading { ZoneReading { inner: self.inner.result.clone() } }
    #[wasm_bindgen(getter)]
    pub fn exposure(&self) -> Option<ExposureImage> { self.inner.exposure.map(|inner| ExposureImage { inner }) }
}

// --- Simulator ---

#[wasm_bindgen(js_name = CArmSimulator)]
pub struct CArmSimulator {
    inner: Simulator,
}

#[wasm_bindgen(js_class = CArmSimulator)]
impl CArmSimulator {
    /// Creates a simulator from an optional JSON configuration.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<CArmSimulator, JsError> {
        let config = match config_json {
            Some(json) => SimConfig::from_json(&json)?,
            None => SimConfig::default(),
        };
        Ok(CArmSimulator { inner: Simulator::new(config)? })
    }

    pub fn config_json(&self) -> Result<String, JsError> {
        Ok(self.inner.config().to_json()?)
    }

    pub fn set_control(&mut self, key: &str, value: f64) -> Result<f64, JsError> {
        Ok(self.inner.set_control(control(key)?, value))
    }

    pub fn get_control(&self, key: &str) -> Result<f64, JsError> {
        Ok(self.inner.controls().get(control(key)?))
    }

    pub fn nudge(&mut self, key: &str, steps: i32) -> Result<f64, JsError> {
        Ok(self.inner.nudge(control(key)?, steps))
    }

    pub fn ramp_to(&mut self, key: &str, target: f64, rate_per_s: f64) -> Result<(), JsError> {
        self.inner.start_ramp(ControlRamp::new(control(key)?, target, rate_per_s));
        Ok(())
    }

    pub fn reset_controls(&mut self) { self.inner.reset_controls(); }

    pub fn set_debug(&mut self, debug: bool) { self.inner.set_debug(debug); }

    /// Sets the patient's world matrix (column-major, 16 values).
    pub fn set_patient_matrix(&mut self, matrix: &[f64]) -> Result<(), JsError> {
        let cols: &[f64; 16] = matrix
            .try_into()
            .map_err(|_| JsError::new(&format!("expected 16 matrix elements, got {}", matrix.len())))?;
        self.inner.set_patient_transform(Transform::from_cols_array(cols));
        Ok(())
    }

    /// Asset-ready event with the raw local box as two `[x, y, z]` arrays.
    pub fn capture_patient(&mut self, min: JsValue, max: JsValue) -> Result<bool, JsError> {
        let (Some(min), Some(max)) = (parse_js_point::<3>(&min), parse_js_point::<3>(&max)) else {
            return Err(JsError::new("patient bounds must be [x, y, z] arrays"));
        };
        Ok(self.inner.capture_patient(min, max)?)
    }

    /// Asset-ready event with the raw vertex positions (`xyz` triples).
    pub fn capture_patient_positions(&mut self, positions: &[f64]) -> Result<bool, JsError> {
        Ok(self.inner.capture_patient_positions(positions)?)
    }

    pub fn patient_load_failed(&mut self, reason: String) { self.inner.on_patient_load_failed(reason); }

    #[wasm_bindgen(getter)]
    pub fn patient_ready(&self) -> bool { self.inner.state().patient.is_ready() }

    /// Runs one frame. `now` is in seconds.
    pub fn tick(&mut self, now: f64) -> TickResult { TickResult { inner: self.inner.tick(now) } }

    pub fn latest(&self) -> ZoneReading { ZoneReading { inner: self.inner.latest().clone() } }

    pub fn classify_now(&self) -> ZoneReading { ZoneReading { inner: self.inner.classify_now() } }

    /// Starts an exposure. Returns its sequence number, or `undefined` while one is settling.
    pub fn expose(&mut self, now: f64) -> Option<usize> { self.inner.expose(now).map(|s| s as usize) }

    #[wasm_bindgen(getter)]
    pub fn exposure_busy(&self) -> bool { self.inner.state().exposure.is_busy() }

    /// World matrix of one chain node, column-major.
    pub fn node_matrix(&self, name: &str) -> Option<Vec<f64>> {
        let id = NodeId::from_name(name)?;
        Some(self.inner.state().chain.world(id).to_cols_array().to_vec())
    }

    /// World matrices of every chain node in chain order, 16 values each.
    pub fn node_matrices(&self) -> Vec<f64> {
        self.inner.state().chain.nodes().iter().flat_map(|n| n.world().to_cols_array()).collect()
    }

    /// Matrix mapping a unit frustum (apex at origin, unit base at `y = 1`) onto the beam.
    pub fn beam_matrix(&self) -> Option<Vec<f64>> {
        Some(self.inner.state().beam.frustum()?.transform().to_cols_array().to_vec())
    }

    /// Apex-to-base radius ratio for the unit frustum geometry.
    pub fn beam_taper(&self) -> f64 {
        self.inner.state().beam.frustum().map_or(1.0, |f| f.taper())
    }

    /// Debug line segments (`[ax, ay, az, bx, by, bz, ...]`), empty unless debug mode is on.
    pub fn overlay_lines(&self) -> Vec<f64> {
        self.inner.overlay().map(|o| o.line_buffer()).unwrap_or_default()
    }

    pub fn overlay_landmarks(&self) -> Vec<f64> {
        self.inner.overlay().map(|o| o.landmark_buffer()).unwrap_or_default()
    }

    /// Zone index per `(cart_x, cart_z)` cell, `cart_x` varying fastest. Runs on the thread
    /// pool when `init_threads` was called.
    pub fn zone_map(&self, x_min: f64, x_max: f64, nx: usize, z_min: f64, z_max: f64, nz: usize) -> Vec<u8> {
        let state = self.inner.state();
        let map = sweep::zone_map(
            self.inner.config(),
            self.inner.skeleton(),
            &state.patient.bounds(),
            &state.patient_world,
            &state.controls,
            &sweep::linspace(x_min, x_max, nx),
            &sweep::linspace(z_min, z_max, nz),
        );
        map.zones.iter().map(|z| z.index() as u8).collect()
    }

    pub fn teardown(&mut self) { self.inner.teardown(); }
}
