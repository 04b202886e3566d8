//! Angle math and batched angle writes.
//!
//! Angles are degrees, clockwise in screen space (y grows downward), with
//! 0° meaning "pointing right". `angle_offset` shifts that baseline for arrow
//! artwork that rests at a different heading, e.g. 135° for an arrow drawn
//! pointing up-left.

use super::geometry::Point;
use super::pool::IndicatorPool;
use super::surface::RenderSurface;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationSettings {
    pub angle_offset: f64,
    /// Minimum change in degrees before a render write happens.
    pub epsilon: f64,
    pub max_batch: usize,
}

impl Default for OrientationSettings {
    fn default() -> Self {
        Self {
            angle_offset: 0.0,
            epsilon: 0.5,
            max_batch: 200,
        }
    }
}

pub fn angle_toward(anchor: Point, target: Point, offset: f64) -> f64 {
    (target.y - anchor.y).atan2(target.x - anchor.x).to_degrees() + offset
}

pub fn needs_write(current: f64, new: f64, epsilon: f64) -> bool {
    (new - current).abs() > epsilon
}

/// `total / 10`, at least one, at most `max_batch`.
pub fn batch_size(total: usize, max_batch: usize) -> usize {
    (total / 10).min(max_batch).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub visited: usize,
    pub written: usize,
}

#[derive(Debug, Default)]
pub struct OrientationEngine {
    settings: OrientationSettings,
    cursor: usize,
}

impl OrientationEngine {
    pub fn new(settings: OrientationSettings) -> Self {
        Self {
            settings,
            cursor: 0,
        }
    }

    pub fn settings(&self) -> &OrientationSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: OrientationSettings) {
        self.settings = settings;
    }

    pub fn batch_size(&self, total: usize) -> usize {
        batch_size(total, self.settings.max_batch)
    }

    /// Number of batches one full pass over `total` indicators takes.
    pub fn batches_for(&self, total: usize) -> usize {
        total.div_ceil(self.batch_size(total))
    }

    /// Index the next batch starts from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Turns up to `len` indicators, starting at the cursor and wrapping, to
    /// face `target`.
    pub fn run_batch<S>(
        &mut self,
        pool: &mut IndicatorPool<S::Handle>,
        surface: &mut S,
        target: Point,
        len: usize,
    ) -> BatchReport
    where
        S: RenderSurface,
    {
        let total = pool.len();
        if total == 0 {
            self.cursor = 0;
            return BatchReport::default();
        }

        let mut report = BatchReport::default();
        for step in 0..len.min(total) {
            let index = (self.cursor + step) % total;
            let Some(indicator) = pool.get_mut(index) else {
                continue;
            };
            report.visited += 1;

            let angle = angle_toward(indicator.anchor, target, self.settings.angle_offset);
            if needs_write(indicator.angle, angle, self.settings.epsilon) {
                indicator.angle = angle;
                surface.set_angle(indicator.handle, angle);
                report.written += 1;
            }
        }

        self.cursor = (self.cursor + report.visited) % total;
        report
    }
}
