//! Boundaries between the engine and whatever puts pixels on screen.

use super::geometry::{Point, Size};

/// Initial placement of one indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sprite {
    pub center: Point,
    pub size: f64,
    pub angle: f64,
}

pub trait RenderSurface {
    type Handle: Copy + std::fmt::Debug;

    /// Registers all sprites in one go and returns their handles in order.
    fn insert_batch(&mut self, sprites: &[Sprite]) -> Vec<Self::Handle>;

    fn set_angle(&mut self, handle: Self::Handle, degrees: f64);

    /// Pointer glow position; `None` hides it.
    fn set_highlight(&mut self, at: Option<Point>);

    fn clear(&mut self);
}

pub trait SizingSource {
    /// `None` while the container does not exist yet (e.g. not realized).
    fn container_size(&self) -> Option<Size>;
}

impl SizingSource for Option<Size> {
    fn container_size(&self) -> Option<Size> {
        *self
    }
}
