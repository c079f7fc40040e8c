//! Monitor loop - perception frames in, alerts out to the receiver
//!
//! Frames are processed one at a time on a single task; an alert is sent
//! before the next frame is read.

use crate::channel::AlertSink;
use crate::perception::LandmarkSource;
use crate::session::MonitoringSession;
use crate::types::AlertCode;
use anyhow::Result;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames: u64,
    pub alerts_sent: u64,
    pub send_failures: u64,
}

pub struct Monitor<S, K> {
    source: S,
    sink: K,
    session: MonitoringSession,
    stats: MonitorStats,
}

impl<S, K> Monitor<S, K>
where
    S: LandmarkSource,
    K: AlertSink,
{
    pub fn new(source: S, sink: K, session: MonitoringSession) -> Self {
        Self {
            source,
            sink,
            session,
            stats: MonitorStats::default(),
        }
    }

    /// Process frames until the source runs dry.
    pub async fn run(&mut self) -> Result<MonitorStats> {
        log::info!("Monitoring started");
        while let Some(frame) = self.source.next_frame().await? {
            self.stats.frames += 1;
            if let Some(code) = self.session.process_frame(&frame, Instant::now()) {
                self.deliver(code).await;
            }
        }
        log::info!(
            "Landmark source closed after {} frames ({} alerts sent, {} failed)",
            self.stats.frames,
            self.stats.alerts_sent,
            self.stats.send_failures
        );
        Ok(self.stats)
    }

    async fn deliver(&mut self, code: AlertCode) {
        match self.sink.send(code).await {
            Ok(()) => {
                self.stats.alerts_sent += 1;
                log::debug!("{code} acknowledged");
            }
            Err(e) => {
                self.stats.send_failures += 1;
                log::warn!("Failed to deliver {code}: {e}");
            }
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn session_mut(&mut self) -> &mut MonitoringSession {
        &mut self.session
    }
}
