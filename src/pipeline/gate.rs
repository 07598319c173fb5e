// src/pipeline/gate.rs

/// Consecutive-frame confirmation gate against single-frame false
/// positives.
///
/// The gate requires N consecutive sampled frames with accident
/// probability above the threshold before it confirms; any frame at or
/// below the threshold resets the counter to zero. Once confirmed, the
/// gate stays confirmed for the rest of the run (the accident clip keeps
/// accumulating), but a below-threshold frame still closes the open
/// stretch until the counter climbs back past N.
pub struct ConfirmationGate {
    threshold: f32,
    confirm_frames: u32,
    consecutive: u32,
    confirmed: bool,
    /// Accident probability (percent) of every gate-open frame
    samples: Vec<f32>,
}

/// What the gate decided for one observed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Below threshold, or the consecutive run is still too short
    Closed,
    /// This frame completed the confirmation run
    JustConfirmed,
    /// Confirmed on an earlier frame and this frame qualifies
    Open,
}

impl ConfirmationGate {
    pub fn new(threshold: f32, confirm_frames: u32) -> Self {
        Self {
            threshold,
            confirm_frames,
            consecutive: 0,
            confirmed: false,
            samples: Vec::new(),
        }
    }

    pub fn observe(&mut self, accident_probability: f32) -> GateDecision {
        if accident_probability <= self.threshold {
            self.consecutive = 0;
            return GateDecision::Closed;
        }

        self.consecutive += 1;
        if self.consecutive < self.confirm_frames {
            return GateDecision::Closed;
        }

        let decision = if self.confirmed {
            GateDecision::Open
        } else {
            self.confirmed = true;
            GateDecision::JustConfirmed
        };

        self.samples.push(accident_probability * 100.0);
        decision
    }

    /// Has the gate ever confirmed during this run?
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Mean accident probability (percent) across gate-open frames
    pub fn accuracy(&self) -> Option<f32> {
        if self.samples.is_empty() {
            return None;
        }
        Some(self.samples.iter().sum::<f32>() / self.samples.len() as f32)
    }
}
