//! Presently CLI
//!
//! - `monitor`: read landmark frames, classify movement, send alerts
//! - `receive`: accept alert commands and drive the display and indicator
//! - `send`: push one raw command line to a receiver and wait for `OK`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use presently::actuation::{BlinkingIndicator, LogPanel, LogPin, ScrollingDisplay, SysfsGpioPin};
use presently::config::{ActuationConfig, IndicatorBackend, LandmarkSourceConfig, SenderMode};
use presently::{
    channel, perception, ActuationDispatcher, CommandServer, Monitor, MonitoringSession, OneShotSender, PresentlyConfig,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "presently")]
#[command(about = "Presently - movement coaching alerts and feedback device", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify landmark frames and send alerts to the receiver
    Monitor {
        /// Receiver address (host:port)
        #[arg(short, long)]
        receiver: Option<SocketAddr>,

        /// Open a fresh connection for every alert
        #[arg(long)]
        one_shot: bool,

        /// Read JSON landmark frames from stdin instead of UDP
        #[arg(long, conflicts_with = "udp")]
        stdin: bool,

        /// UDP address to receive landmark frames on
        #[arg(long)]
        udp: Option<SocketAddr>,
    },

    /// Listen for alert commands and run the display and indicator
    Receive {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<SocketAddr>,

        /// Blink a sysfs GPIO line instead of logging
        #[arg(long, value_name = "LINE")]
        gpio: Option<u32>,
    },

    /// Send one command line and wait for the acknowledgment
    Send {
        /// Command text, e.g. MOVE_HEAD
        command: String,

        /// Receiver address (host:port)
        #[arg(short, long)]
        receiver: Option<SocketAddr>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let mut config = if let Some(config_path) = cli.config {
        log::info!("Loading config from: {}", config_path.display());
        PresentlyConfig::load(&config_path)?
    } else {
        PresentlyConfig::default()
    };

    match cli.command {
        Commands::Monitor { receiver, one_shot, stdin, udp } => {
            if let Some(addr) = receiver {
                config.channel.receiver_addr = addr;
            }
            if one_shot {
                config.channel.sender_mode = SenderMode::OneShot;
            }
            if stdin {
                config.perception.source = LandmarkSourceConfig::Stdin;
            } else if let Some(bind_addr) = udp {
                config.perception.source = LandmarkSourceConfig::Udp { bind_addr };
            }
            run_monitor(config).await
        }

        Commands::Receive { listen, gpio } => {
            if let Some(addr) = listen {
                config.channel.listen_addr = addr;
            }
            if let Some(line) = gpio {
                config.actuation.indicator_backend = IndicatorBackend::SysfsGpio;
                config.actuation.gpio_line = line;
            }
            run_receiver(config).await
        }

        Commands::Send { command, receiver } => {
            let addr = receiver.unwrap_or(config.channel.receiver_addr);
            let sender = OneShotSender::new(addr, config.channel.ack_timeout());
            sender
                .send_text(&command)
                .await
                .with_context(|| format!("send {command:?} to {addr}"))?;
            println!("OK");
            Ok(())
        }
    }
}

/// Forward Ctrl+C into the async world.
fn shutdown_signal() -> Result<mpsc::Receiver<()>> {
    let (tx, rx) = mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal...");
        let _ = tx.blocking_send(());
    })?;
    Ok(rx)
}

async fn run_monitor(config: PresentlyConfig) -> Result<()> {
    log::info!("Sending alerts to {}", config.channel.receiver_addr);

    let source = perception::open_source(&config.perception.source).await?;
    let sink = channel::connect_sink(&config.channel);
    let mut monitor = Monitor::new(source, sink, MonitoringSession::new(&config));
    let mut shutdown = shutdown_signal()?;

    tokio::select! {
        result = monitor.run() => {
            result?;
        }
        _ = shutdown.recv() => {}
    }

    let stats = monitor.stats();
    log::info!(
        "Monitor stopped: {} frames, {} alerts sent, {} send failures",
        stats.frames,
        stats.alerts_sent,
        stats.send_failures
    );
    Ok(())
}

fn build_dispatcher(config: &ActuationConfig) -> Result<ActuationDispatcher> {
    let display = ScrollingDisplay::new(
        LogPanel::new(config.display_width),
        Duration::from_millis(config.scroll_delay_ms),
        config.scroll_passes,
    );
    let half_period = Duration::from_millis(config.blink_half_period_ms);

    let dispatcher = match config.indicator_backend {
        IndicatorBackend::Log => {
            ActuationDispatcher::new(display, BlinkingIndicator::new(LogPin::default(), half_period), config.blink_count)
        }
        IndicatorBackend::SysfsGpio => {
            let pin = SysfsGpioPin::open(config.gpio_line)
                .with_context(|| format!("open GPIO line {}", config.gpio_line))?;
            ActuationDispatcher::new(display, BlinkingIndicator::new(pin, half_period), config.blink_count)
        }
    };
    dispatcher.context("start actuation workers")
}

async fn run_receiver(config: PresentlyConfig) -> Result<()> {
    let dispatcher = build_dispatcher(&config.actuation)?;
    let server = CommandServer::bind(config.channel.listen_addr, dispatcher)
        .await
        .with_context(|| format!("bind command listener on {}", config.channel.listen_addr))?;

    let mut shutdown = shutdown_signal()?;
    log::info!("Press Ctrl+C to exit");

    server
        .run_until(async move {
            shutdown.recv().await;
        })
        .await;

    log::info!("Receiver shutdown complete");
    Ok(())
}
