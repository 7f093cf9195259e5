mod cli_utils;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io;
use tracing::{info, warn};
use voxptt::audio::Recorder;
use voxptt::monitor::MonotonicClock;
use voxptt::shutdown::{install_shutdown_handlers, shutdown_flag};
use voxptt::telemetry::{init_tracing, install_panic_hook, tracing_log_path};
use voxptt::{
    run_monitor, AppConfig, EnigoActuator, JsonStatusSink, KeyHold, Monitor, MonitorEvent,
    StatusSink, StopReason, TextStatusSink,
};

use cli_utils::{format_summary, list_input_devices, summary_json};

fn main() -> Result<()> {
    let mut config = AppConfig::parse();
    if config.list_input_devices {
        list_input_devices()?;
        return Ok(());
    }

    let warnings = config.validate()?;
    init_tracing(&config);
    install_panic_hook();
    info!(log = %tracing_log_path().display(), "voxptt starting");
    install_shutdown_handlers()?;

    let recorder =
        Recorder::new(config.input_device.as_deref()).context("failed to open audio input")?;
    let mut stream = recorder
        .open_stream(config.frame_size, config.channel_capacity)
        .with_context(|| format!("failed to start capture on {}", recorder.device_name()))?;
    let settings = config.trigger_settings();
    let key = KeyHold::new(EnigoActuator::new(), config.ptt_key);
    let mut monitor = Monitor::new(config.monitor_config(stream.sample_rate()), key);
    if let Some(db) = config.initial_threshold_db {
        monitor.seed_threshold(db);
    }

    let stdout = io::stdout();
    let mut sink: Box<dyn StatusSink> = if config.json_status {
        Box::new(JsonStatusSink::new(stdout.lock()))
    } else {
        Box::new(TextStatusSink::new(stdout.lock()))
    };
    for warning in &warnings {
        warn!("{warning}");
        sink.event(&MonitorEvent::warning(warning));
    }

    let summary = run_monitor(
        &mut stream,
        &mut monitor,
        &settings,
        &MonotonicClock::new(),
        shutdown_flag(),
        &config.run_options(),
        sink.as_mut(),
    );
    drop(sink);

    if config.json_status {
        println!("{}", summary_json(&summary));
    } else {
        println!("{}", format_summary(&summary, config.calibrate_only));
    }
    info!(reason = summary.stop_reason.label(), "voxptt stopped");

    if let StopReason::Error(message) = &summary.stop_reason {
        bail!("monitoring stopped on error: {message}");
    }
    Ok(())
}
