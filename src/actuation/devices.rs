//! Display and indicator backends

use super::{Indicator, TextDisplay};
use crate::error::ActuationError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// A fixed-width character panel (e.g. a 16x2 HD44780 behind an I2C expander)
pub trait CharacterLcd: Send + 'static {
    fn width(&self) -> usize;
    fn clear(&mut self) -> io::Result<()>;
    fn write_string(&mut self, text: &str) -> io::Result<()>;
}

/// A single on/off output line
pub trait IndicatorPin: Send + 'static {
    fn set(&mut self, on: bool) -> io::Result<()>;
}

/// Windows shown while scrolling `message` across a panel `width` characters wide.
///
/// Messages that fit are shown as a single window.
pub fn scroll_windows(message: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = message.chars().collect();
    if width == 0 || chars.len() <= width {
        return vec![message.to_string()];
    }
    (0..=chars.len() - width)
        .map(|start| chars[start..start + width].iter().collect())
        .collect()
}

/// Scrolls messages across a character panel, one step per `delay`
pub struct ScrollingDisplay<P> {
    panel: P,
    delay: Duration,
    passes: u32,
}

impl<P: CharacterLcd> ScrollingDisplay<P> {
    pub fn new(panel: P, delay: Duration, passes: u32) -> Self {
        Self {
            panel,
            delay,
            passes: passes.max(1),
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}

impl<P: CharacterLcd> TextDisplay for ScrollingDisplay<P> {
    fn display_text(&mut self, message: &str) -> Result<(), ActuationError> {
        let windows = scroll_windows(message, self.panel.width());
        for _ in 0..self.passes {
            for window in &windows {
                self.panel.clear().map_err(|e| ActuationError::device("display", e))?;
                self.panel
                    .write_string(window)
                    .map_err(|e| ActuationError::device("display", e))?;
                thread::sleep(self.delay);
            }
        }
        Ok(())
    }
}

/// Blinks an output line with a fixed half-period
pub struct BlinkingIndicator<P> {
    pin: P,
    half_period: Duration,
}

impl<P: IndicatorPin> BlinkingIndicator<P> {
    pub fn new(pin: P, half_period: Duration) -> Self {
        Self { pin, half_period }
    }

    fn pulse(&mut self) -> io::Result<()> {
        self.pin.set(true)?;
        thread::sleep(self.half_period);
        self.pin.set(false)?;
        thread::sleep(self.half_period);
        Ok(())
    }
}

impl<P: IndicatorPin> Indicator for BlinkingIndicator<P> {
    fn blink(&mut self, count: u32) -> Result<(), ActuationError> {
        for _ in 0..count {
            if let Err(e) = self.pulse() {
                // Don't leave the light on.
                let _ = self.pin.set(false);
                return Err(ActuationError::device("indicator", e));
            }
        }
        Ok(())
    }
}

/// Panel that writes each frame to the log, for hosts without a display
pub struct LogPanel {
    width: usize,
}

impl LogPanel {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl CharacterLcd for LogPanel {
    fn width(&self) -> usize {
        self.width
    }

    fn clear(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_string(&mut self, text: &str) -> io::Result<()> {
        log::info!("🖥️  [{:<width$}]", text, width = self.width);
        Ok(())
    }
}

#[derive(Default)]
pub struct LogPin {
    on: bool,
}

impl IndicatorPin for LogPin {
    fn set(&mut self, on: bool) -> io::Result<()> {
        if on != self.on {
            log::info!("💡 {}", if on { "ON" } else { "off" });
        }
        self.on = on;
        Ok(())
    }
}

/// GPIO output through the Linux sysfs interface
pub struct SysfsGpioPin {
    value_path: PathBuf,
}

impl SysfsGpioPin {
    pub const SYSFS_ROOT: &'static str = "/sys/class/gpio";

    pub fn open(line: u32) -> io::Result<Self> {
        Self::open_at(Path::new(Self::SYSFS_ROOT), line)
    }

    pub fn open_at(root: &Path, line: u32) -> io::Result<Self> {
        let pin_dir = root.join(format!("gpio{line}"));
        if !pin_dir.exists() {
            fs::write(root.join("export"), line.to_string())?;
        }
        fs::write(pin_dir.join("direction"), "out")?;

        let value_path = pin_dir.join("value");
        fs::write(&value_path, "0")?;
        log::info!("GPIO line {line} configured as output");

        Ok(Self { value_path })
    }
}

impl IndicatorPin for SysfsGpioPin {
    fn set(&mut self, on: bool) -> io::Result<()> {
        fs::write(&self.value_path, if on { "1" } else { "0" })
    }
}

impl Drop for SysfsGpioPin {
    fn drop(&mut self) {
        let _ = fs::write(&self.value_path, "0");
    }
}
