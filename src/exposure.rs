//! Latch-then-commit exposure handling.
//!
//! Pressing "expose" latches the classification at that instant. The image is delivered
//! after a fixed settle delay, and it always shows the latched zone even if the gantry
//! moved in the meantime.

use crate::classifier::ClassificationResult;
use crate::config::ExposureConfig;
use crate::image::{self, ImageRecipe};
use crate::zone::Zone;

/// An exposure waiting for its settle delay to elapse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PendingExposure {
    pub sequence: u64,
    pub zone: Zone,
    pub hit: bool,
    pub triggered_at: f64,
    pub ready_at: f64,
}

/// A delivered exposure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExposureOutcome {
    pub sequence: u64,
    pub zone: Zone,
    pub hit: bool,
    pub image: ImageRecipe,
    pub triggered_at: f64,
    pub delivered_at: f64,
}

impl ExposureOutcome {
    pub fn label(&self) -> &'static str {
        self.zone.label()
    }
}

#[derive(Clone, Debug)]
pub struct ExposureController {
    settle_delay_s: f64,
    pending: Option<PendingExposure>,
    last: Option<ExposureOutcome>,
    next_sequence: u64,
}

impl ExposureController {
    pub fn new(config: &ExposureConfig) -> Self {
        Self {
            settle_delay_s: config.settle_delay_s,
            pending: None,
            last: None,
            next_sequence: 1,
        }
    }

    /// Latches `result` at time `now`. Returns the sequence number of the new exposure, or
    /// `None` if one is still settling.
    pub fn trigger(&mut self, now: f64, result: &ClassificationResult) -> Option<u64> {
        if let Some(pending) = &self.pending {
            log::debug!("exposure #{} still settling, trigger ignored", pending.sequence);
            return None;
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending = Some(PendingExposure {
            sequence,
            zone: result.zone,
            hit: result.hit,
            triggered_at: now,
            ready_at: now + self.settle_delay_s,
        });
        Some(sequence)
    }

    /// Delivers the pending exposure once its delay has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<ExposureOutcome> {
        let pending = self.pending.filter(|p| now >= p.ready_at)?;
        self.pending = None;
        let outcome = ExposureOutcome {
            sequence: pending.sequence,
            zone: pending.zone,
            hit: pending.hit,
            image: image::select_image(pending.zone),
            triggered_at: pending.triggered_at,
            delivered_at: now,
        };
        self.last = Some(outcome);
        Some(outcome)
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&PendingExposure> {
        self.pending.as_ref()
    }

    /// Most recently delivered exposure.
    pub fn last(&self) -> Option<&ExposureOutcome> {
        self.last.as_ref()
    }

    /// Drops a pending exposure without delivering it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
