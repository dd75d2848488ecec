//! Zone map over a grid of cart positions.
//!
//! Useful when recalibrating the landmark lateral corrections against a new patient asset:
//! the map shows where each zone starts and ends as the cart travels along and across the
//! table.

use rayon::prelude::*;

use crate::bounds::PatientBounds;
use crate::chain::{KinematicChain, NodeId};
use crate::classifier;
use crate::config::SimConfig;
use crate::controls::{Control, ControlState};
use crate::skeleton::Skeleton;
use crate::transform::Transform;
use crate::zone::Zone;

/// Classified zones over a `(cart_x, cart_z)` grid, row-major with `cart_x` varying fastest.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneMap {
    pub xs: Vec<f64>,
    pub zs: Vec<f64>,
    pub zones: Vec<Zone>,
}

impl ZoneMap {
    pub fn get(&self, ix: usize, iz: usize) -> Option<Zone> {
        if ix >= self.xs.len() {
            return None;
        }
        self.zones.get(iz * self.xs.len() + ix).copied()
    }

    /// One row of the map, at `zs[iz]`.
    pub fn row(&self, iz: usize) -> &[Zone] {
        let n = self.xs.len();
        self.zones.get(iz * n..(iz + 1) * n).unwrap_or(&[])
    }

    /// Number of cells classified as each zone, indexed by [`Zone::index`].
    pub fn histogram(&self) -> [usize; Zone::COUNT] {
        let mut counts = [0; Zone::COUNT];
        for zone in &self.zones {
            counts[zone.index()] += 1;
        }
        counts
    }
}

/// `count` evenly spaced values across `[min, max]`, both ends included.
pub fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.5 * (min + max)],
        _ => (0..count).map(|i| min + (max - min) * i as f64 / (count - 1) as f64).collect(),
    }
}

/// Classifies every `(x, z)` cart position in parallel. The other controls come from `base`.
pub fn zone_map(
    config: &SimConfig,
    skeleton: &Skeleton,
    bounds: &PatientBounds,
    patient_world: &Transform,
    base: &ControlState,
    xs: &[f64],
    zs: &[f64],
) -> ZoneMap {
    let nx = xs.len();
    let zones = (0..nx * zs.len())
        .into_par_iter()
        .map_init(
            || KinematicChain::from_gantry(&config.gantry),
            |chain, i| {
                let controls = base
                    .with(Control::CartX, xs[i % nx])
                    .with(Control::CartZ, zs[i / nx]);
                chain.update(&controls);
                classifier::classify_beam(
                    chain.world_position(NodeId::Source),
                    chain.world_position(NodeId::Detector),
                    patient_world,
                    bounds,
                    skeleton,
                    &config.classifier,
                )
                .zone
            },
        )
        .collect();
    ZoneMap {
        xs: xs.to_vec(),
        zs: zs.to_vec(),
        zones,
    }
}
