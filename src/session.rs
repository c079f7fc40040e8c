//! Monitoring session - one frame in, at most one alert out
//!
//! Owns the tracker, classifier and debouncer of a single monitoring run so
//! two sessions never share debounce or stillness state.

use crate::classifier::MovementClassifier;
use crate::config::PresentlyConfig;
use crate::debounce::AlertDebouncer;
use crate::tracker::SlidingSignalTracker;
use crate::types::{AlertCode, LandmarkFrame, LandmarkId, Position, Signal};
use std::time::Instant;

pub struct MonitoringSession {
    tracker: SlidingSignalTracker,
    classifier: MovementClassifier,
    debouncer: AlertDebouncer,
    leg_visibility_floor: f64,
}

impl MonitoringSession {
    pub fn new(config: &PresentlyConfig) -> Self {
        Self {
            tracker: SlidingSignalTracker::new(
                config.classifier.history_capacity,
                config.classifier.min_samples,
            ),
            classifier: MovementClassifier::new(&config.classifier),
            debouncer: AlertDebouncer::new(config.debounce.window()),
            leg_visibility_floor: config.classifier.leg_visibility_floor,
        }
    }

    /// Feed one perception frame. Returns the alert that survived debouncing,
    /// if any.
    pub fn process_frame(&mut self, frame: &LandmarkFrame, now: Instant) -> Option<AlertCode> {
        let sampled = self.record_samples(frame);

        let candidate = self.classifier.classify_frame(&self.tracker, &sampled, now)?;
        if self.debouncer.consider(candidate, now) {
            log::info!("🚨 Alert: {} ({})", candidate, candidate.message());
            Some(candidate)
        } else {
            None
        }
    }

    fn record_samples(&mut self, frame: &LandmarkFrame) -> Vec<Signal> {
        let mut sampled = Vec::with_capacity(Signal::ALL.len());

        if let Some(wrist) = frame.get(LandmarkId::RightWrist) {
            self.tracker.record(Signal::Hand, wrist.position());
            sampled.push(Signal::Hand);
        }

        if let (Some(left), Some(right)) = (frame.get(LandmarkId::LeftHip), frame.get(LandmarkId::RightHip)) {
            self.tracker.record(Signal::Hip, left.position().midpoint(&right.position()));
            sampled.push(Signal::Hip);
        }

        if let (Some(left), Some(right)) = (frame.get(LandmarkId::LeftAnkle), frame.get(LandmarkId::RightAnkle)) {
            if left.visibility() > self.leg_visibility_floor && right.visibility() > self.leg_visibility_floor {
                self.tracker.record(Signal::Leg, left.position().midpoint(&right.position()));
                sampled.push(Signal::Leg);
            } else if self.tracker.len(Signal::Leg) > 0 {
                log::debug!("Ankles below visibility floor, dropping leg history");
                self.tracker.clear(Signal::Leg);
            }
        }

        if let Some(nose) = frame.get(LandmarkId::Nose) {
            self.tracker.record(Signal::Head, nose.position());
            sampled.push(Signal::Head);
        }

        sampled
    }

    /// Record a raw sample, bypassing landmark extraction.
    pub fn record(&mut self, signal: Signal, position: Position) {
        self.tracker.record(signal, position);
    }

    pub fn tracker(&self) -> &SlidingSignalTracker {
        &self.tracker
    }

    pub fn debouncer(&self) -> &AlertDebouncer {
        &self.debouncer
    }

    /// Start a fresh session: histories, stillness timer and debounce state.
    pub fn reset(&mut self) {
        log::info!("Resetting monitoring session");
        self.tracker.clear_all();
        self.classifier.reset();
        self.debouncer.reset();
    }
}

impl Default for MonitoringSession {
    fn default() -> Self {
        Self::new(&PresentlyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Landmark;
    use std::time::Duration;

    const FRAME: Duration = Duration::from_millis(100);

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark { x, y, visibility: None }
    }

    fn lm_vis(x: f64, y: f64, visibility: f64) -> Landmark {
        Landmark { x, y, visibility: Some(visibility) }
    }

    fn nose_frame(x: f64) -> LandmarkFrame {
        LandmarkFrame::default().with(LandmarkId::Nose, lm(x, 0.3))
    }

    fn ankles(y: f64, visibility: f64) -> LandmarkFrame {
        LandmarkFrame::default()
            .with(LandmarkId::LeftAnkle, lm_vis(0.4, y, visibility))
            .with(LandmarkId::RightAnkle, lm_vis(0.6, y, visibility))
    }

    #[test]
    fn hand_fidgeting_alert() {
        let mut session = MonitoringSession::default();
        let t0 = Instant::now();

        let mut alerts = Vec::new();
        for i in 0..6u32 {
            let frame = LandmarkFrame::default().with(LandmarkId::RightWrist, lm(0.3 + 0.02 * i as f64, 0.5));
            alerts.extend(session.process_frame(&frame, t0 + FRAME * i));
        }
        assert_eq!(alerts, vec![AlertCode::FidgetingHands]);
    }

    #[test]
    fn hip_midpoint_swaying() {
        let mut session = MonitoringSession::default();
        let t0 = Instant::now();

        let mut alerts = Vec::new();
        for i in 0..8u32 {
            let sway = if i % 2 == 0 { 0.0 } else { 0.02 };
            let frame = LandmarkFrame::default()
                .with(LandmarkId::LeftHip, lm(0.4 + sway, 0.6))
                .with(LandmarkId::RightHip, lm(0.6 + sway, 0.6));
            alerts.extend(session.process_frame(&frame, t0 + FRAME * i));
        }
        // Fires at the sixth frame, then debounced.
        assert_eq!(alerts, vec![AlertCode::StopSwaying]);
    }

    #[test]
    fn hidden_legs_clear_history_and_recover() {
        let mut session = MonitoringSession::default();
        let t0 = Instant::now();

        for i in 0..4u32 {
            session.process_frame(&ankles(0.9, 0.9), t0 + FRAME * i);
        }
        assert_eq!(session.tracker().len(Signal::Leg), 4);

        session.process_frame(&ankles(0.9, 0.5), t0 + FRAME * 4);
        assert_eq!(session.tracker().len(Signal::Leg), 0);

        let mut alerts = Vec::new();
        for i in 0..6u32 {
            let y = 0.8 + 0.01 * i as f64;
            alerts.extend(session.process_frame(&ankles(y, 0.95), t0 + FRAME * (5 + i)));
        }
        assert!(session.tracker().movement(Signal::Leg).is_some());
        assert_eq!(alerts, vec![AlertCode::SwingingLegs]);
    }

    #[test]
    fn one_low_confidence_ankle_is_enough_to_clear() {
        let mut session = MonitoringSession::default();
        let t0 = Instant::now();

        for i in 0..3u32 {
            session.process_frame(&ankles(0.9, 0.9), t0 + FRAME * i);
        }
        let frame = LandmarkFrame::default()
            .with(LandmarkId::LeftAnkle, lm_vis(0.4, 0.9, 0.9))
            .with(LandmarkId::RightAnkle, lm_vis(0.6, 0.9, 0.6));
        session.process_frame(&frame, t0 + FRAME * 3);
        assert_eq!(session.tracker().len(Signal::Leg), 0);
    }

    /// Run a still head until `end` and return alert times relative to when
    /// the stillness timer started (first frame with a movement reading).
    fn head_alerts(session: &mut MonitoringSession, t0: Instant, frames: u32, jerk_at: Option<u32>) -> Vec<Duration> {
        let mut alerts = Vec::new();
        for i in 0..frames {
            let x = if Some(i) == jerk_at { 0.6 } else { 0.5 };
            let now = t0 + FRAME * i;
            if session.process_frame(&nose_frame(x), now).is_some() {
                alerts.push(now - t0);
            }
        }
        alerts
    }

    #[test]
    fn head_stillness_fires_once() {
        let mut session = MonitoringSession::default();
        let t0 = Instant::now();
        // Sixth frame (index 5) produces the first reading and starts the timer.
        let timer_start = FRAME * 5;

        let alerts = head_alerts(&mut session, t0, 5 + 52, None);
        assert_eq!(alerts, vec![timer_start + Duration::from_millis(5100)]);
    }

    #[test]
    fn head_movement_before_deadline_restarts_run() {
        let mut session = MonitoringSession::default();
        let t0 = Instant::now();
        let jerk = 5 + 49;

        let alerts = head_alerts(&mut session, t0, 200, Some(jerk));
        assert!(!alerts.is_empty());
        assert!(alerts[0] > FRAME * jerk + Duration::from_secs(5));
    }

    #[test]
    fn sessions_are_independent() {
        let t0 = Instant::now();
        let mut first = MonitoringSession::default();
        let mut second = MonitoringSession::default();

        for i in 0..6u32 {
            let frame = LandmarkFrame::default().with(LandmarkId::RightWrist, lm(0.1 * i as f64, 0.5));
            first.process_frame(&frame, t0 + FRAME * i);
        }
        assert!(first.debouncer().state().last.is_some());
        assert!(second.debouncer().state().last.is_none());

        first.reset();
        assert!(first.debouncer().state().last.is_none());
        assert_eq!(first.tracker().len(Signal::Hand), 0);
        assert!(second.process_frame(&LandmarkFrame::default(), t0).is_none());
    }
}
