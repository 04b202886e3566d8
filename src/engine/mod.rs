//! Toolkit-independent arrow field engine.
//!
//! [`Field`] owns the grid, the pointer smoothing and the frame cadence. It
//! talks to the outside world only through [`RenderSurface`] and
//! [`SizingSource`], and is driven by whoever owns the display callback.

pub mod field;
pub mod geometry;
pub mod orientation;
pub mod pointer;
pub mod pool;
pub mod scheduler;
pub mod surface;

pub use field::{Field, StartOutcome};
pub use geometry::{DensityPolicy, GridConfig, Point, Size, SizeClass};
pub use orientation::OrientationSettings;
pub use pointer::PointerSettings;
pub use scheduler::{FrameRequest, FrameSettings, FrameTick};
pub use surface::{RenderSurface, SizingSource, Sprite};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineSettings {
    pub density: DensityPolicy,
    pub pointer: PointerSettings,
    pub orientation: OrientationSettings,
    pub frame: FrameSettings,
}
