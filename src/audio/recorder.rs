//! System microphone capture via cpal.
//!
//! Handles device selection and format conversion. Every supported sample
//! format is converted to mono i16 before it reaches the frame channel.

use super::dispatch::{f32_to_i16, u16_to_i16, FrameDispatcher};
use super::frame::{AudioFrame, FrameSource};
use super::DEFAULT_SAMPLE_RATE;
use crate::error::{PttError, PttResult};
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Audio input device wrapper.
pub struct Recorder {
    device: cpal::Device,
}

impl Recorder {
    /// List microphone names so the CLI can expose a human-friendly selector.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host.input_devices().context("no input devices available")?;
        let mut names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Open the named input device, or the host default when `None`.
    pub fn new(preferred_device: Option<&str>) -> PttResult<Self> {
        let host = cpal::default_host();
        let device = match preferred_device {
            Some(name) => {
                let mut devices = host
                    .input_devices()
                    .map_err(|err| PttError::DeviceUnavailable(err.to_string()))?;
                devices
                    .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| {
                        PttError::DeviceUnavailable(format!("input device '{name}' not found"))
                    })?
            }
            None => host.default_input_device().ok_or_else(|| {
                PttError::DeviceUnavailable("no default input device available".to_string())
            })?,
        };
        Ok(Self { device })
    }

    /// Get the name of the active recording device.
    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Start the device and deliver `frame_size`-sample mono frames.
    ///
    /// `channel_capacity` bounds how many frames may queue up while the polling
    /// loop is busy; the excess is dropped and counted.
    pub fn open_stream(&self, frame_size: usize, channel_capacity: usize) -> PttResult<CaptureStream> {
        let default_config = self
            .device
            .default_input_config()
            .map_err(|err| PttError::DeviceUnavailable(err.to_string()))?;
        let format = default_config.sample_format();
        let device_config: StreamConfig = default_config.into();
        let sample_rate = match device_config.sample_rate.0 {
            0 => DEFAULT_SAMPLE_RATE,
            rate => rate,
        };
        let channels = usize::from(device_config.channels.max(1));
        debug!(?format, sample_rate, channels, frame_size, "capture config");

        let (sender, receiver) = bounded::<Vec<i16>>(channel_capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let dispatcher = Arc::new(Mutex::new(FrameDispatcher::new(
            frame_size,
            sender,
            dropped.clone(),
        )));

        let err_fn = |err| warn!("audio stream error: {err}");
        let stream = match format {
            SampleFormat::I16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[i16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, |sample| sample);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::F32 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[f32], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, f32_to_i16);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            SampleFormat::U16 => {
                let dispatcher = dispatcher.clone();
                let dropped = dropped.clone();
                self.device.build_input_stream(
                    &device_config,
                    move |data: &[u16], _| {
                        if let Ok(mut pump) = dispatcher.try_lock() {
                            pump.push(data, channels, u16_to_i16);
                        } else {
                            dropped.fetch_add(1, Ordering::Relaxed);
                        }
                    },
                    err_fn,
                    None,
                )
            }
            other => {
                return Err(PttError::DeviceUnavailable(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        }
        .map_err(|err| PttError::DeviceUnavailable(err.to_string()))?;

        stream
            .play()
            .map_err(|err| PttError::DeviceUnavailable(err.to_string()))?;
        info!(device = %self.device_name(), sample_rate, "capture started");

        Ok(CaptureStream {
            stream: Some(stream),
            receiver,
            dropped,
            sample_rate,
        })
    }
}

/// A running cpal input stream delivering fixed-size frames.
pub struct CaptureStream {
    stream: Option<cpal::Stream>,
    receiver: Receiver<Vec<i16>>,
    dropped: Arc<AtomicUsize>,
    sample_rate: u32,
}

impl CaptureStream {
    /// Actual device sample rate; frame timing and window size derive from it.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl FrameSource for CaptureStream {
    fn next_frame(&mut self, timeout: Duration) -> PttResult<Option<AudioFrame>> {
        if self.stream.is_none() {
            return Err(PttError::StreamClosed);
        }
        match self.receiver.recv_timeout(timeout) {
            Ok(samples) => Ok(Some(AudioFrame::new(samples))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PttError::StreamClosed),
        }
    }

    fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                debug!("failed to pause audio stream: {err}");
            }
            drop(stream);
            info!("capture stopped");
        }
    }

    fn dropped_frames(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}
