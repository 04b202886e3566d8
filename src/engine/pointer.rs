use super::geometry::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerSettings {
    /// Interpolation weight in (0, 1]. Lower lags more and looks smoother.
    pub smooth_factor: f64,
    /// Inputs arriving sooner than this after the last accepted one are dropped.
    pub throttle_ms: f64,
    /// How long `is_moving` stays set after the last accepted input.
    pub idle_timeout_ms: f64,
}

impl Default for PointerSettings {
    fn default() -> Self {
        Self {
            smooth_factor: 0.15,
            throttle_ms: 5.0,
            idle_timeout_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub raw_target: Point,
    pub smoothed: Point,
    pub is_touch: bool,
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    settings: PointerSettings,
    state: PointerState,
    last_input_ms: Option<f64>,
}

impl PointerTracker {
    pub fn new(settings: PointerSettings, initial: Point) -> Self {
        Self {
            settings,
            state: PointerState {
                raw_target: initial,
                smoothed: initial,
                is_touch: false,
            },
            last_input_ms: None,
        }
    }

    pub fn state(&self) -> &PointerState {
        &self.state
    }

    pub fn smoothed(&self) -> Point {
        self.state.smoothed
    }

    pub fn has_input(&self) -> bool {
        self.last_input_ms.is_some()
    }

    /// Returns whether the input was accepted.
    pub fn on_pointer_move(&mut self, at: Point, now_ms: f64) -> bool {
        self.accept(at, false, now_ms)
    }

    /// Touch events without a touch point leave the state alone.
    pub fn on_touch_move(&mut self, at: Option<Point>, now_ms: f64) -> bool {
        match at {
            Some(at) => self.accept(at, true, now_ms),
            None => false,
        }
    }

    fn accept(&mut self, at: Point, is_touch: bool, now_ms: f64) -> bool {
        if !(at.x.is_finite() && at.y.is_finite()) {
            return false;
        }
        if self
            .last_input_ms
            .is_some_and(|last| now_ms - last < self.settings.throttle_ms)
        {
            return false;
        }

        self.last_input_ms = Some(now_ms);
        self.state.raw_target = at;
        self.state.is_touch = is_touch;
        true
    }

    /// One exponential smoothing step toward the raw target.
    pub fn step(&mut self) -> Point {
        let f = self.settings.smooth_factor;
        let PointerState {
            raw_target: target,
            smoothed,
            ..
        } = &mut self.state;

        smoothed.x += (target.x - smoothed.x) * f;
        smoothed.y += (target.y - smoothed.y) * f;
        *smoothed
    }

    pub fn is_moving(&self, now_ms: f64) -> bool {
        self.last_input_ms
            .is_some_and(|last| now_ms - last < self.settings.idle_timeout_ms)
    }

    /// Where the pointer glow goes. Touch follows the finger directly.
    pub fn highlight(&self) -> Point {
        if self.state.is_touch {
            self.state.raw_target
        } else {
            self.state.smoothed
        }
    }

    /// Moves both positions without counting as input.
    pub fn recenter(&mut self, at: Point) {
        self.state.raw_target = at;
        self.state.smoothed = at;
    }

    pub fn set_settings(&mut self, settings: PointerSettings) {
        self.settings = settings;
    }
}
