//! # carmsim
//!
//! `carmsim` is the geometric core of a mobile C-arm fluoroscopy simulator, usable from Rust
//! as well as compiled to WebAssembly (WASM). The host owns rendering, asset loading and the
//! control widgets; this crate turns the six operator controls into a beam and tells the host
//! which anatomy that beam is pointing at.
//!
//! ## Features
//!
//! - **Kinematic chain**: cart → column → lift → shoulder → wig-wag → C-arm slide, resolved in
//!   a single parent-before-child pass over an arena of transform nodes.
//! - **Beam targeting**: the source–detector segment is intersected with the patient box in
//!   the patient's local frame and sampled at nine points.
//! - **Skeleton classifier**: each sample votes for the zone of its nearest bone with an
//!   inverse-square weight; the heaviest zone wins.
//! - **Exposure latching**: the zone is captured when an exposure starts, and the image recipe
//!   is derived from it deterministically.
//! - **WASM-first**: `wasm-bindgen` bindings with a console logger and a rayon thread pool.
//!
//! ## Example
//!
//! ```
//! use carmsim::{Control, SimConfig, Simulator, Zone};
//!
//! let mut sim = Simulator::new(SimConfig::default()).unwrap();
//! sim.capture_patient([-0.25, -0.85, -0.15], [0.25, 0.85, 0.15]).unwrap();
//!
//! let report = sim.tick(0.0);
//! assert!(report.result.hit);
//!
//! sim.set_control(Control::CartX, 0.8);
//! sim.set_control(Control::Lift, 0.0);
//! let report = sim.tick(0.2);
//! assert_eq!(report.result.zone, Zone::Head);
//! ```
//!
//! ## Main Interface
//!
//! The primary entry point is the [`Simulator`], which owns a [`SimulationState`] and runs the
//! per-frame pipeline in [`Simulator::tick`]. [`classify_pose`] classifies a single pose
//! without any state.

#[cfg(feature = "gltf")]
pub mod asset;
pub mod beam;
pub mod bounds;
pub mod chain;
pub mod classifier;
pub mod config;
pub mod controls;
mod error;
pub mod exposure;
pub mod image;
pub mod intersect;
pub mod overlay;
pub mod simulation;
pub mod skeleton;
pub mod sweep;
pub mod transform;
pub mod vector;
pub mod wasm;
pub mod zone;

pub use beam::{BeamFrustum, BeamGeometry, BeamResolver, BeamUpdate};
pub use bounds::{BoundingBox, InferredAxes, PatientBounds, infer_axes};
pub use chain::{KinematicChain, NodeId};
pub use classifier::{BeamClassification, ClassificationResult, Diagnostics, VoteTally, classify_beam};
pub use config::{ClassifierConfig, ExposureConfig, GantryConfig, PatientPlacement, SimConfig};
pub use controls::{Control, ControlLimits, ControlRamp, ControlRange, ControlState};
#[cfg(feature = "gltf")]
pub use error::AssetError;
pub use error::{BoundsError, ConfigError};
pub use exposure::{ExposureController, ExposureOutcome};
pub use image::{ImageKind, ImageRecipe, select_image};
pub use intersect::{BeamInterval, Intersection, MissReason, intersect_beam};
pub use overlay::DebugOverlay;
pub use simulation::{PatientState, SimulationState, Simulator, TickReport, classify_pose};
pub use skeleton::{Skeleton, ZoneRule};
pub use sweep::{ZoneMap, zone_map};
pub use transform::Transform;
pub use vector::{Axis, Vec3};
pub use zone::Zone;
