use serde::{Deserialize, Serialize};

use crate::controls::ControlLimits;
use crate::error::ConfigError;
use crate::transform::Transform;
use crate::vector::{self, Vec3};

/// Top-level simulator configuration.
///
/// Every section falls back to its defaults, so a JSON document only needs to name the
/// values it overrides:
///
/// ```
/// let config = carmsim::SimConfig::from_json(r#"{ "classifier": { "rate_hz": 5.0 } }"#).unwrap();
/// assert_eq!(config.classifier.rate_hz, 5.0);
/// assert_eq!(config.classifier.samples, 9);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub controls: ControlLimits,
    pub gantry: GantryConfig,
    pub patient: PatientPlacement,
    pub classifier: ClassifierConfig,
    pub exposure: ExposureConfig,
}

/// Fixed dimensions of the mobile C-arm, in meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GantryConfig {
    /// Cart origin when both cart controls are zero.
    pub cart_base: Vec3,
    /// Height of the lift carriage above the cart at zero lift.
    pub column_height: f64,
    /// Horizontal reach from the column to the C-arm center (toward -Z).
    pub arm_reach: f64,
    /// Source anchor offset along the C-arm's local vertical.
    pub source_offset: f64,
    /// Detector anchor offset along the C-arm's local vertical.
    pub detector_offset: f64,
    /// Beam radius at the source (narrow end of the frustum).
    pub source_radius: f64,
    /// Beam radius at the detector (wide end of the frustum).
    pub detector_radius: f64,
}

impl Default for GantryConfig {
    fn default() -> Self {
        Self {
            cart_base: [0.0, 0.0, 0.9],
            column_height: 1.3,
            arm_reach: 0.9,
            source_offset: -0.65,
            detector_offset: 0.35,
            source_radius: 0.01,
            detector_radius: 0.15,
        }
    }
}

/// Reference world placement of the patient asset.
///
/// The host normally supplies the live world matrix of the loaded asset; this placement is
/// used until it does and by offline tools such as [`crate::sweep`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientPlacement {
    pub position: Vec3,
    /// XYZ Euler angles in degrees.
    pub rotation_deg: Vec3,
    pub scale: f64,
}

impl Default for PatientPlacement {
    fn default() -> Self {
        // Lays a y-up standing asset supine on the table, head toward -X.
        Self {
            position: [1.97, 1.0, 0.0],
            rotation_deg: [-90.0, 0.0, 90.0],
            scale: 1.5,
        }
    }
}

impl PatientPlacement {
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position)
            .then(&Transform::from_euler_xyz_deg(self.rotation_deg))
            .then(&Transform::from_scale(self.scale))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Number of samples taken along the beam interval.
    pub samples: usize,
    /// Added to each squared distance before inverting it into a vote weight.
    pub vote_epsilon: f64,
    /// Maximum classification rate, independent of the frame rate.
    pub rate_hz: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            samples: 9,
            vote_epsilon: 1e-4,
            rate_hz: 10.0,
        }
    }
}

impl ClassifierConfig {
    pub fn interval_s(&self) -> f64 {
        1.0 / self.rate_hz
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExposureConfig {
    /// Delay between triggering an exposure and delivering its image.
    pub settle_delay_s: f64,
}

impl Default for ExposureConfig {
    fn default() -> Self {
        Self { settle_delay_s: 0.6 }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.controls.validate()?;

        let g = &self.gantry;
        if !vector::is_finite(g.cart_base) {
            return Err(ConfigError::value("gantry.cart_base", "must be finite"));
        }
        for (field, v) in [
            ("gantry.column_height", g.column_height),
            ("gantry.arm_reach", g.arm_reach),
            ("gantry.source_offset", g.source_offset),
            ("gantry.detector_offset", g.detector_offset),
        ] {
            if !v.is_finite() {
                return Err(ConfigError::value(field, format!("{} is not finite", v)));
            }
        }
        for (field, v) in [
            ("gantry.source_radius", g.source_radius),
            ("gantry.detector_radius", g.detector_radius),
        ] {
            if !(v >= 0.0) || !v.is_finite() {
                return Err(ConfigError::value(field, format!("{} must be a finite non-negative radius", v)));
            }
        }

        let p = &self.patient;
        if !vector::is_finite(p.position) || !vector::is_finite(p.rotation_deg) {
            return Err(ConfigError::value("patient", "placement must be finite"));
        }
        if !(p.scale > 0.0) || !p.scale.is_finite() {
            return Err(ConfigError::value("patient.scale", format!("{} must be positive", p.scale)));
        }

        let c = &self.classifier;
        if c.samples == 0 {
            return Err(ConfigError::value("classifier.samples", "at least one sample is required"));
        }
        if !(c.vote_epsilon > 0.0) || !c.vote_epsilon.is_finite() {
            return Err(ConfigError::value(
                "classifier.vote_epsilon",
                format!("{} must be positive", c.vote_epsilon),
            ));
        }
        if !(c.rate_hz > 0.0) || !c.rate_hz.is_finite() {
            return Err(ConfigError::value("classifier.rate_hz", format!("{} must be positive", c.rate_hz)));
        }

        let e = &self.exposure;
        if !(e.settle_delay_s >= 0.0) || !e.settle_delay_s.is_finite() {
            return Err(ConfigError::value(
                "exposure.settle_delay_s",
                format!("{} must be non-negative", e.settle_delay_s),
            ));
        }
        Ok(())
    }
}
