//! Test doubles shared by the unit tests.

use crate::actuator::{KeyActuator, PttKey};
use crate::audio::{AudioFrame, FrameSource};
use crate::error::{PttError, PttResult};
use crate::monitor::Clock;
use crate::status::{MonitorEvent, StatusReport, StatusSink};
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActuatorCall {
    Assert(PttKey),
    Release(PttKey),
}

/// Shared view of the calls an actuator received, readable after the
/// actuator moved into a `KeyHold`.
#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<ActuatorCall>>>);

impl CallLog {
    pub(crate) fn snapshot(&self) -> Vec<ActuatorCall> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn releases(&self) -> usize {
        self.snapshot()
            .iter()
            .filter(|call| matches!(call, ActuatorCall::Release(_)))
            .count()
    }

    fn push(&self, call: ActuatorCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Records successful calls; can be told to fail the next press.
#[derive(Debug, Default)]
pub(crate) struct RecordingActuator {
    calls: CallLog,
    fail_next_assert: Arc<AtomicBool>,
}

impl RecordingActuator {
    pub(crate) fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    pub(crate) fn fail_next_assert(&self) {
        self.fail_next_assert.store(true, Ordering::SeqCst);
    }
}

impl KeyActuator for RecordingActuator {
    fn assert_key(&mut self, key: PttKey) -> PttResult<()> {
        if self.fail_next_assert.swap(false, Ordering::SeqCst) {
            return Err(PttError::Actuator("injected failure".to_string()));
        }
        self.calls.push(ActuatorCall::Assert(key));
        Ok(())
    }

    fn release_key(&mut self, key: PttKey) -> PttResult<()> {
        self.calls.push(ActuatorCall::Release(key));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Frame whose every sample has the same magnitude, giving a known level.
pub(crate) fn frame_at(amplitude: i16, len: usize) -> AudioFrame {
    AudioFrame::new(
        (0..len)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect(),
    )
}

/// Replays a fixed list of results, then reports the stream closed.
pub(crate) struct ScriptedSource {
    script: VecDeque<PttResult<Option<AudioFrame>>>,
    pub(crate) stopped: bool,
    dropped: usize,
    drops_per_frame: usize,
    delivered: usize,
    raise_after: Option<(usize, Arc<AtomicBool>)>,
}

impl ScriptedSource {
    pub(crate) fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            script: frames.into_iter().map(|frame| Ok(Some(frame))).collect(),
            stopped: false,
            dropped: 0,
            drops_per_frame: 0,
            delivered: 0,
            raise_after: None,
        }
    }

    pub(crate) fn push(&mut self, item: PttResult<Option<AudioFrame>>) {
        self.script.push_back(item);
    }

    /// Set `flag` once `frames` frames have been handed out, the way a
    /// signal arriving mid-stream would.
    pub(crate) fn raise_after(mut self, frames: usize, flag: Arc<AtomicBool>) -> Self {
        self.raise_after = Some((frames, flag));
        self
    }

    /// Pretend the upstream buffer overflowed before every delivered frame.
    pub(crate) fn dropping(mut self, drops_per_frame: usize) -> Self {
        self.drops_per_frame = drops_per_frame;
        self
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self, _timeout: Duration) -> PttResult<Option<AudioFrame>> {
        if self.stopped {
            return Err(PttError::StreamClosed);
        }
        let next = self.script.pop_front().unwrap_or(Err(PttError::StreamClosed));
        if matches!(next, Ok(Some(_))) {
            self.dropped += self.drops_per_frame;
            self.delivered += 1;
            if let Some((frames, flag)) = &self.raise_after {
                if self.delivered >= *frames {
                    flag.store(true, Ordering::SeqCst);
                }
            }
        }
        next
    }

    fn stop(&mut self) {
        self.stopped = true;
    }

    fn dropped_frames(&self) -> usize {
        self.dropped
    }
}

/// Clock that advances a fixed step each time it is read.
pub(crate) struct SteppingClock {
    next: Cell<u64>,
    step: u64,
}

impl SteppingClock {
    pub(crate) fn new(start_ms: u64, step_ms: u64) -> Self {
        Self {
            next: Cell::new(start_ms),
            step: step_ms,
        }
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> u64 {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}

#[derive(Debug, Default)]
pub(crate) struct CollectingSink {
    pub(crate) reports: Vec<StatusReport>,
    pub(crate) events: Vec<MonitorEvent>,
}

impl CollectingSink {
    pub(crate) fn event_names(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|event| {
                serde_json::to_value(event)
                    .ok()
                    .and_then(|value| value["event"].as_str().map(str::to_string))
            })
            .collect()
    }
}

impl StatusSink for CollectingSink {
    fn report(&mut self, report: &StatusReport) {
        self.reports.push(report.clone());
    }

    fn event(&mut self, event: &MonitorEvent) {
        self.events.push(event.clone());
    }
}
