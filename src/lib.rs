pub mod actuator;
pub mod audio;
pub mod config;
pub mod error;
pub mod monitor;
pub mod shutdown;
pub mod status;
pub mod telemetry;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use actuator::{EnigoActuator, KeyActuator, KeyHold, PttKey};
pub use config::AppConfig;
pub use error::{PttError, PttResult};
pub use monitor::{run_monitor, Monitor, MonitorConfig, RunOptions, RunSummary, StopReason};
pub use status::{JsonStatusSink, MonitorEvent, StatusReport, StatusSink, TextStatusSink};
