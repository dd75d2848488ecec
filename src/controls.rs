use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The six operator-settable gantry controls.
///
/// Distances are in meters, angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Cart travel along the table (world X).
    CartX,
    /// Cart travel across the table (world Z).
    CartZ,
    /// Vertical lift offset of the C-arm.
    Lift,
    /// Orbital slide of the C along its own track.
    Orbital,
    /// Horizontal swing of the C about the vertical axis at the arm end.
    WigWag,
    /// Rotation of the column about the vertical axis at the cart.
    ColumnRotation,
}

impl Control {
    pub const COUNT: usize = 6;

    pub const ALL: [Control; Control::COUNT] = [
        Control::CartX,
        Control::CartZ,
        Control::Lift,
        Control::Orbital,
        Control::WigWag,
        Control::ColumnRotation,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            Control::CartX => "cart_x",
            Control::CartZ => "cart_z",
            Control::Lift => "lift",
            Control::Orbital => "orbital",
            Control::WigWag => "wig_wag",
            Control::ColumnRotation => "column_rotation",
        }
    }

    pub fn from_key(key: &str) -> Option<Control> {
        Control::ALL.into_iter().find(|c| c.key() == key)
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Declared range and step of a single control.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl ControlRange {
    pub const fn new(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self { min, max, step, default }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn validate(&self, control: Control) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRange { control, reason };
        if ![self.min, self.max, self.step, self.default].iter().all(|v| v.is_finite()) {
            return Err(invalid("all bounds must be finite".into()));
        }
        if self.min > self.max {
            return Err(invalid(format!("min {} > max {}", self.min, self.max)));
        }
        if self.step <= 0.0 {
            return Err(invalid(format!("step {} must be positive", self.step)));
        }
        if self.default < self.min || self.default > self.max {
            return Err(invalid(format!(
                "default {} outside [{}, {}]",
                self.default, self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Ranges for all six controls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlLimits {
    pub cart_x: ControlRange,
    pub cart_z: ControlRange,
    pub lift: ControlRange,
    pub orbital: ControlRange,
    pub wig_wag: ControlRange,
    pub column_rotation: ControlRange,
}

impl Default for ControlLimits {
    fn default() -> Self {
        Self {
            cart_x: ControlRange::new(0.8, 3.4, 0.01, 1.7),
            cart_z: ControlRange::new(-1.5, 1.5, 0.01, 0.0),
            lift: ControlRange::new(-0.45, 0.25, 0.01, -0.3),
            orbital: ControlRange::new(-90.0, 90.0, 1.0, 0.0),
            wig_wag: ControlRange::new(-20.0, 20.0, 1.0, 0.0),
            column_rotation: ControlRange::new(-90.0, 90.0, 1.0, 0.0),
        }
    }
}

impl ControlLimits {
    pub fn get(&self, control: Control) -> &ControlRange {
        match control {
            Control::CartX => &self.cart_x,
            Control::CartZ => &self.cart_z,
            Control::Lift => &self.lift,
            Control::Orbital => &self.orbital,
            Control::WigWag => &self.wig_wag,
            Control::ColumnRotation => &self.column_rotation,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for control in Control::ALL {
            self.get(control).validate(control)?;
        }
        Ok(())
    }
}

/// Current values of the six controls.
///
/// Every write is clamped to the declared range, so the rest of the pipeline only ever
/// sees values inside [`ControlLimits`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlState {
    limits: ControlLimits,
    values: [f64; Control::COUNT],
}

impl ControlState {
    pub fn new(limits: ControlLimits) -> Self {
        let mut values = [0.0; Control::COUNT];
        for control in Control::ALL {
            values[control.index()] = limits.get(control).default;
        }
        Self { limits, values }
    }

    pub fn limits(&self) -> &ControlLimits {
        &self.limits
    }

    pub fn get(&self, control: Control) -> f64 {
        self.values[control.index()]
    }

    /// Sets a control, clamped to its range. Non-finite input is ignored.
    /// Returns the value now held by the control.
    pub fn set(&mut self, control: Control, value: f64) -> f64 {
        if value.is_finite() {
            self.values[control.index()] = self.limits.get(control).clamp(value);
        }
        self.values[control.index()]
    }

    /// Builder-style [`ControlState::set`].
    pub fn with(mut self, control: Control, value: f64) -> Self {
        self.set(control, value);
        self
    }

    /// Moves a control by a whole number of steps.
    pub fn nudge(&mut self, control: Control, steps: i32) -> f64 {
        let step = self.limits.get(control).step;
        self.set(control, self.get(control) + step * steps as f64)
    }

    pub fn reset(&mut self) {
        *self = ControlState::new(self.limits);
    }
}

/// Drives one control toward a target at a bounded rate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlRamp {
    pub control: Control,
    pub target: f64,
    /// Units per second (meters or degrees).
    pub rate_per_s: f64,
}

impl ControlRamp {
    pub fn new(control: Control, target: f64, rate_per_s: f64) -> Self {
        Self { control, target, rate_per_s }
    }

    /// Advances the ramp by `dt` seconds. Returns `true` once the control sits on its
    /// (clamped) target.
    pub fn advance(&self, state: &mut ControlState, dt: f64) -> bool {
        let target = state.limits().get(self.control).clamp(self.target);
        let current = state.get(self.control);
        let delta = target - current;
        if delta == 0.0 {
            return true;
        }
        let max_move = if dt > 0.0 && self.rate_per_s > 0.0 { self.rate_per_s * dt } else { 0.0 };
        if delta.abs() <= max_move {
            state.set(self.control, target);
            true
        } else {
            state.set(self.control, current + max_move.copysign(delta));
            false
        }
    }
}
