use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameSettings {
    pub fps: f64,
    /// Frame-clock jitter tolerated before a frame counts as early.
    /// Zero throttles any frame closer than `1000 / fps`.
    pub slack_ms: f64,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            fps: 60.0,
            slack_ms: 0.0,
        }
    }
}

impl FrameSettings {
    pub fn interval_ms(&self) -> f64 {
        1000.0 / self.fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTick {
    /// Do this frame's work. The next callback is already armed.
    Run,
    /// Too soon since the last executed frame. The next callback is armed.
    Throttled,
    /// Stopped or hidden. Nothing is pending any more.
    Suspended,
}

/// What the frame driver has to do with its display callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    Request,
    Cancel,
    Keep,
}

/// Cadence and suspension rules for the frame loop.
///
/// Holds at most one pending callback; every path that would request a frame
/// checks `pending` first.
#[derive(Debug)]
pub struct FrameScheduler {
    interval_ms: f64,
    slack_ms: f64,
    last_frame_ms: Option<f64>,
    running: bool,
    visible: bool,
    pending: bool,
}

impl FrameScheduler {
    pub fn new(settings: &FrameSettings) -> Self {
        Self {
            interval_ms: settings.interval_ms(),
            slack_ms: settings.slack_ms,
            last_frame_ms: None,
            running: false,
            visible: true,
            pending: false,
        }
    }

    pub fn set_settings(&mut self, settings: &FrameSettings) {
        self.interval_ms = settings.interval_ms();
        self.slack_ms = settings.slack_ms;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn start(&mut self) -> FrameRequest {
        self.running = true;
        self.arm()
    }

    pub fn stop(&mut self) -> FrameRequest {
        self.running = false;
        self.last_frame_ms = None;
        self.disarm()
    }

    pub fn set_visible(&mut self, visible: bool) -> FrameRequest {
        self.visible = visible;
        if visible { self.arm() } else { self.disarm() }
    }

    /// Called from the display callback with its timestamp.
    pub fn on_frame(&mut self, now_ms: f64) -> FrameTick {
        self.pending = false;
        if !(self.running && self.visible) {
            return FrameTick::Suspended;
        }
        self.pending = true;

        if self
            .last_frame_ms
            .is_some_and(|last| now_ms - last + self.slack_ms < self.interval_ms)
        {
            return FrameTick::Throttled;
        }

        self.last_frame_ms = Some(now_ms);
        FrameTick::Run
    }

    fn arm(&mut self) -> FrameRequest {
        if self.running && self.visible && !self.pending {
            self.pending = true;
            FrameRequest::Request
        } else {
            FrameRequest::Keep
        }
    }

    fn disarm(&mut self) -> FrameRequest {
        if std::mem::take(&mut self.pending) {
            FrameRequest::Cancel
        } else {
            FrameRequest::Keep
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkHandle {
    generation: u64,
    id: u64,
}

/// Deferred units of work that can all be invalidated at once.
#[derive(Debug)]
pub struct WorkQueue<J> {
    generation: u64,
    next_id: u64,
    jobs: VecDeque<(WorkHandle, J)>,
}

impl<J> Default for WorkQueue<J> {
    fn default() -> Self {
        Self {
            generation: 0,
            next_id: 0,
            jobs: VecDeque::new(),
        }
    }
}

impl<J> WorkQueue<J> {
    pub fn schedule(&mut self, job: J) -> WorkHandle {
        let handle = WorkHandle {
            generation: self.generation,
            id: self.next_id,
        };
        self.next_id += 1;
        self.jobs.push_back((handle, job));
        handle
    }

    pub fn pop(&mut self) -> Option<(WorkHandle, J)> {
        self.jobs.pop_front()
    }

    /// Drops every queued job and invalidates every handle handed out so far.
    pub fn cancel_all(&mut self) {
        self.generation += 1;
        self.jobs.clear();
    }

    pub fn is_live(&self, handle: WorkHandle) -> bool {
        handle.generation == self.generation && self.jobs.iter().any(|(h, _)| *h == handle)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
