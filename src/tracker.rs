//! Sliding Signal Tracker - bounded per-signal position history
//!
//! Each tracked body cue keeps a small ring buffer of recent positions. The
//! movement magnitude is the mean Euclidean step between consecutive samples,
//! recomputed on demand.

use crate::types::{Position, Signal};
use std::collections::VecDeque;

/// Mean step length over a signal's current history window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementReading {
    pub mean_delta: f64,
    pub samples: usize,
}

#[derive(Debug, Clone)]
struct SignalHistory {
    samples: VecDeque<Position>,
}

/// Ring buffers for every tracked signal
#[derive(Debug, Clone)]
pub struct SlidingSignalTracker {
    histories: [SignalHistory; 4],
    capacity: usize,
    min_samples: usize,
}

impl SlidingSignalTracker {
    pub const DEFAULT_CAPACITY: usize = 10;
    pub const DEFAULT_MIN_SAMPLES: usize = 6;

    pub fn new(capacity: usize, min_samples: usize) -> Self {
        // A reading needs at least one step.
        let capacity = capacity.max(2);
        let min_samples = min_samples.clamp(2, capacity);
        let history = SignalHistory {
            samples: VecDeque::with_capacity(capacity),
        };
        Self {
            histories: std::array::from_fn(|_| history.clone()),
            capacity,
            min_samples,
        }
    }

    /// Append a sample, evicting the oldest once the buffer is full.
    pub fn record(&mut self, signal: Signal, position: Position) {
        let capacity = self.capacity;
        let samples = &mut self.histories[signal.index()].samples;
        if samples.len() >= capacity {
            samples.pop_front();
        }
        samples.push_back(position);
    }

    /// `None` until the signal holds enough samples for a verdict.
    pub fn movement(&self, signal: Signal) -> Option<MovementReading> {
        let samples = &self.histories[signal.index()].samples;
        if samples.len() < self.min_samples {
            return None;
        }

        let steps = samples.len() - 1;
        let total: f64 = samples
            .iter()
            .zip(samples.iter().skip(1))
            .map(|(prev, next)| prev.distance(next))
            .sum();

        Some(MovementReading {
            mean_delta: total / steps as f64,
            samples: samples.len(),
        })
    }

    pub fn clear(&mut self, signal: Signal) {
        self.histories[signal.index()].samples.clear();
    }

    pub fn clear_all(&mut self) {
        for history in &mut self.histories {
            history.samples.clear();
        }
    }

    pub fn len(&self, signal: Signal) -> usize {
        self.histories[signal.index()].samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SlidingSignalTracker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_MIN_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_below_six_samples() {
        let mut tracker = SlidingSignalTracker::default();

        for i in 0..5 {
            tracker.record(Signal::Hand, Position::new(0.1 * i as f64, 0.0));
            assert!(tracker.movement(Signal::Hand).is_none());
        }

        tracker.record(Signal::Hand, Position::new(0.5, 0.0));
        let reading = tracker.movement(Signal::Hand).unwrap();
        assert_eq!(reading.samples, 6);
        assert!((reading.mean_delta - 0.1).abs() < 1e-9);
    }

    #[test]
    fn history_is_bounded() {
        let mut tracker = SlidingSignalTracker::default();
        for i in 0..25 {
            tracker.record(Signal::Hip, Position::new(0.0, i as f64 * 0.01));
        }
        assert_eq!(tracker.len(Signal::Hip), 10);
    }

    #[test]
    fn oldest_sample_is_evicted() {
        let mut tracker = SlidingSignalTracker::default();

        // One big jump at the start, then stillness.
        tracker.record(Signal::Head, Position::new(0.0, 0.0));
        for _ in 0..9 {
            tracker.record(Signal::Head, Position::new(0.9, 0.0));
        }
        let reading = tracker.movement(Signal::Head).unwrap();
        assert!((reading.mean_delta - 0.1).abs() < 1e-9);

        // Pushing one more sample evicts the jump.
        tracker.record(Signal::Head, Position::new(0.9, 0.0));
        assert_eq!(tracker.movement(Signal::Head).unwrap().mean_delta, 0.0);
    }

    #[test]
    fn cleared_history_recovers() {
        let mut tracker = SlidingSignalTracker::default();
        for i in 0..8 {
            tracker.record(Signal::Leg, Position::new(0.5, 0.5 + i as f64 * 0.01));
        }
        assert!(tracker.movement(Signal::Leg).is_some());

        tracker.clear(Signal::Leg);
        assert_eq!(tracker.len(Signal::Leg), 0);
        assert!(tracker.movement(Signal::Leg).is_none());

        for i in 0..6 {
            tracker.record(Signal::Leg, Position::new(0.5, 0.5 + i as f64 * 0.02));
        }
        let reading = tracker.movement(Signal::Leg).unwrap();
        assert!((reading.mean_delta - 0.02).abs() < 1e-9);
    }

    #[test]
    fn signals_are_independent() {
        let mut tracker = SlidingSignalTracker::default();
        for _ in 0..6 {
            tracker.record(Signal::Hand, Position::new(0.2, 0.2));
        }
        assert!(tracker.movement(Signal::Hand).is_some());
        assert!(tracker.movement(Signal::Hip).is_none());

        tracker.clear(Signal::Hip);
        assert_eq!(tracker.len(Signal::Hand), 6);
    }
}
