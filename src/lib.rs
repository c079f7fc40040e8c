//! # Presently
//!
//! Turns per-frame body landmarks into rate-limited coaching alerts and
//! delivers them to a small feedback device that scrolls a message and blinks
//! an indicator.
//!
//! ## Architecture
//!
//! - **Tracker**: bounded position history per body signal (hand, hip, leg, head)
//! - **Classifier**: per-signal movement thresholds, plus a stillness timer for the head
//! - **Debouncer**: drops identical alerts inside a cool-down window
//! - **Channel**: newline-framed alert codes over TCP, acknowledged with `OK`
//! - **Actuation**: display and indicator jobs, serialized per device off the receive loop
//!
//! ## Example
//!
//! ```no_run
//! use presently::{AlertSink, MonitoringSession, PersistentSender, PresentlyConfig};
//! use std::time::Instant;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PresentlyConfig::default();
//!     let mut session = MonitoringSession::new(&config);
//!     let mut sender = PersistentSender::new(config.channel.receiver_addr, config.channel.ack_timeout());
//!
//!     let frame = presently::perception::parse_landmark_frame(
//!         r#"{"landmarks":{"nose":{"x":0.5,"y":0.4}}}"#,
//!     )
//!     .unwrap_or_default();
//!     if let Some(code) = session.process_frame(&frame, Instant::now()) {
//!         sender.send(code).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod actuation;
pub mod channel;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod error;
pub mod monitor;
pub mod perception;
pub mod protocol;
pub mod session;
pub mod tracker;
pub mod types;

pub use actuation::{ActuationDispatcher, ActuationTask, DeviceStats, Indicator, TextDisplay};
pub use channel::{AlertSink, CommandServer, OneShotSender, PersistentSender};
pub use classifier::MovementClassifier;
pub use config::PresentlyConfig;
pub use debounce::{AlertDebouncer, DebounceState};
pub use error::{ActuationError, ChannelError};
pub use monitor::Monitor;
pub use session::MonitoringSession;
pub use tracker::{MovementReading, SlidingSignalTracker};
pub use types::*;
