//! Movement Classifier - per-signal threshold policies
//!
//! HAND, HIP and LEG fire on motion above their threshold. HEAD is inverted:
//! it fires once the nose has stayed nearly still for longer than the
//! stillness duration, and stays eligible every frame while it remains still.

use crate::config::ClassifierConfig;
use crate::tracker::{MovementReading, SlidingSignalTracker};
use crate::types::{AlertCode, Signal};
use std::time::{Duration, Instant};

pub struct MovementClassifier {
    hand_threshold: f64,
    hip_threshold: f64,
    leg_threshold: f64,
    head_stillness_threshold: f64,
    head_stillness: Duration,
    still_since: Option<Instant>,
}

impl MovementClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            hand_threshold: config.hand_threshold,
            hip_threshold: config.hip_threshold,
            leg_threshold: config.leg_threshold,
            head_stillness_threshold: config.head_stillness_threshold,
            head_stillness: config.head_stillness(),
            still_since: None,
        }
    }

    /// Run one classification pass over the signals that received a sample
    /// this frame.
    ///
    /// Signals are evaluated in `Signal::ALL` order (HAND, HIP, LEG, HEAD) and
    /// each triggered policy overwrites the frame's single alert slot, so the
    /// last triggered signal in that order is the one returned.
    pub fn classify_frame(
        &mut self,
        tracker: &SlidingSignalTracker,
        sampled: &[Signal],
        now: Instant,
    ) -> Option<AlertCode> {
        let mut alert = None;
        for signal in Signal::ALL {
            if !sampled.contains(&signal) {
                continue;
            }
            if let Some(code) = self.evaluate(signal, tracker.movement(signal), now) {
                alert = Some(code);
            }
        }
        alert
    }

    /// Apply a single signal's policy. Insufficient data never triggers and
    /// leaves the stillness timer untouched.
    pub fn evaluate(
        &mut self,
        signal: Signal,
        reading: Option<MovementReading>,
        now: Instant,
    ) -> Option<AlertCode> {
        let movement = reading?.mean_delta;
        match signal {
            Signal::Hand => (movement > self.hand_threshold).then_some(AlertCode::FidgetingHands),
            Signal::Hip => (movement > self.hip_threshold).then_some(AlertCode::StopSwaying),
            Signal::Leg => (movement > self.leg_threshold).then_some(AlertCode::SwingingLegs),
            Signal::Head => self.evaluate_head(movement, now),
        }
    }

    fn evaluate_head(&mut self, movement: f64, now: Instant) -> Option<AlertCode> {
        if movement >= self.head_stillness_threshold {
            if self.still_since.take().is_some() {
                log::trace!("Head moved ({movement:.4}), stillness timer reset");
            }
            return None;
        }

        let since = *self.still_since.get_or_insert(now);
        let still_for = now.saturating_duration_since(since);
        (still_for > self.head_stillness).then_some(AlertCode::MoveHead)
    }

    /// How long the head has been continuously still, if the timer is running.
    pub fn still_for(&self, now: Instant) -> Option<Duration> {
        self.still_since.map(|since| now.saturating_duration_since(since))
    }

    pub fn reset(&mut self) {
        self.still_since = None;
    }
}

impl Default for MovementClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}
