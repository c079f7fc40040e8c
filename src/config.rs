//! Runtime configuration, loaded from TOML with per-field defaults

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PresentlyConfig {
    pub classifier: ClassifierConfig,
    pub debounce: DebounceConfig,
    pub channel: ChannelConfig,
    pub perception: PerceptionConfig,
    pub actuation: ActuationConfig,
}

impl PresentlyConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but can't drive a session.
    pub fn validate(&self) -> Result<()> {
        let c = &self.classifier;
        seconds("classifier.head_stillness_secs", c.head_stillness_secs)?;
        seconds("debounce.window_secs", self.debounce.window_secs)?;

        for (name, value) in [
            ("classifier.hand_threshold", c.hand_threshold),
            ("classifier.hip_threshold", c.hip_threshold),
            ("classifier.leg_threshold", c.leg_threshold),
            ("classifier.head_stillness_threshold", c.head_stillness_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("{name} must be a non-negative number, got {value}");
            }
        }
        if !(0.0..=1.0).contains(&c.leg_visibility_floor) {
            bail!("classifier.leg_visibility_floor must be within 0.0..=1.0, got {}", c.leg_visibility_floor);
        }
        Ok(())
    }
}

fn seconds(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs).with_context(|| format!("{name} must be a non-negative duration, got {secs}"))
}

/// Movement thresholds. These were tuned empirically against live sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    pub history_capacity: usize,
    pub min_samples: usize,
    pub hand_threshold: f64,
    pub hip_threshold: f64,
    pub leg_threshold: f64,
    pub head_stillness_threshold: f64,
    pub head_stillness_secs: f64,
    pub leg_visibility_floor: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            history_capacity: 10,
            min_samples: 6,
            hand_threshold: 0.01,
            hip_threshold: 0.005,
            leg_threshold: 0.005,
            head_stillness_threshold: 0.003,
            head_stillness_secs: 5.0,
            leg_visibility_floor: 0.6,
        }
    }
}

impl ClassifierConfig {
    /// Out-of-range values (rejected by `validate`) read as zero.
    pub fn head_stillness(&self) -> Duration {
        Duration::try_from_secs_f64(self.head_stillness_secs).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebounceConfig {
    pub window_secs: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { window_secs: 5.0 }
    }
}

impl DebounceConfig {
    /// Out-of-range values (rejected by `validate`) read as zero.
    pub fn window(&self) -> Duration {
        Duration::try_from_secs_f64(self.window_secs).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderMode {
    /// One connection kept open and re-established on failure
    Persistent,
    /// Fresh connect/send/close per alert
    OneShot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelConfig {
    pub receiver_addr: SocketAddr,
    pub listen_addr: SocketAddr,
    pub sender_mode: SenderMode,
    pub ack_timeout_ms: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            receiver_addr: SocketAddr::from(([10, 0, 155, 13], 5001)),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5001)),
            sender_mode: SenderMode::Persistent,
            ack_timeout_ms: 2000,
        }
    }
}

impl ChannelConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LandmarkSourceConfig {
    /// One JSON frame per datagram
    Udp { bind_addr: SocketAddr },
    /// JSON lines on standard input
    Stdin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerceptionConfig {
    pub source: LandmarkSourceConfig,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            source: LandmarkSourceConfig::Udp {
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 5002)),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorBackend {
    Log,
    SysfsGpio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuationConfig {
    pub display_width: usize,
    pub scroll_delay_ms: u64,
    pub scroll_passes: u32,
    pub blink_count: u32,
    pub blink_half_period_ms: u64,
    pub indicator_backend: IndicatorBackend,
    pub gpio_line: u32,
}

impl Default for ActuationConfig {
    fn default() -> Self {
        Self {
            display_width: 16,
            scroll_delay_ms: 300,
            scroll_passes: 1,
            blink_count: 3,
            blink_half_period_ms: 500,
            indicator_backend: IndicatorBackend::Log,
            gpio_line: 17,
        }
    }
}
