use crate::config::Appearance;
use crate::engine::{Point, RenderSurface, Sprite};
use crate::gui::theme::ThemeColors;
use cairo::{Context, RadialGradient};

/// Shaft length as a share of the arrow size; the head takes the rest.
const SHAFT: f64 = 0.55;
const HEAD_HALF_WIDTH: f64 = 0.3;
const SHAFT_HALF_WIDTH: f64 = 0.08;

#[derive(Debug, Clone, Copy)]
struct Arrow {
    center: Point,
    size: f64,
    angle: f64,
}

impl Arrow {
    /// Outline pointing along +x, rotated by `angle`, in surface coordinates.
    fn outline(&self) -> [Point; 7] {
        let s = self.size;
        let (sin, cos) = self.angle.to_radians().sin_cos();
        let tail = -s / 2.0;
        let neck = tail + s * SHAFT;
        let tip = s / 2.0;
        let (sw, hw) = (s * SHAFT_HALF_WIDTH, s * HEAD_HALF_WIDTH);

        [
            (tail, -sw),
            (neck, -sw),
            (neck, -hw),
            (tip, 0.0),
            (neck, hw),
            (neck, sw),
            (tail, sw),
        ]
        .map(|(x, y)| {
            Point::new(
                self.center.x + x * cos - y * sin,
                self.center.y + x * sin + y * cos,
            )
        })
    }
}

/// Retained list of arrows drawn with cairo in one pass.
#[derive(Debug, Default)]
pub struct Canvas {
    arrows: Vec<Arrow>,
    highlight: Option<Point>,
    glow: bool,
    glow_radius: f64,
    dirty: bool,
}

impl Canvas {
    pub fn new(appearance: &Appearance) -> Self {
        let mut canvas = Self::default();
        canvas.set_appearance(appearance);
        canvas
    }

    pub fn set_appearance(&mut self, appearance: &Appearance) {
        self.glow = appearance.glow;
        self.glow_radius = appearance.glow_radius;
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.arrows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty()
    }

    /// Whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn draw(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        if self.glow {
            self.draw_glow(cr, colors)?;
        }
        self.draw_arrows(cr, colors)
    }

    fn draw_glow(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        let Some(at) = self.highlight else {
            return Ok(());
        };
        if self.glow_radius <= 0.0 {
            return Ok(());
        }

        let (r, g, b, a) = colors.glow.into_components();
        let gradient = RadialGradient::new(at.x, at.y, 0.0, at.x, at.y, self.glow_radius);
        gradient.add_color_stop_rgba(0.0, r, g, b, a);
        gradient.add_color_stop_rgba(1.0, r, g, b, 0.0);

        cr.set_source(&gradient)?;
        cr.arc(at.x, at.y, self.glow_radius, 0.0, std::f64::consts::TAU);
        cr.fill()
    }

    fn draw_arrows(&self, cr: &Context, colors: &ThemeColors) -> Result<(), cairo::Error> {
        if self.arrows.is_empty() {
            return Ok(());
        }

        for arrow in &self.arrows {
            let [first, rest @ ..] = arrow.outline();
            cr.move_to(first.x, first.y);
            for p in rest {
                cr.line_to(p.x, p.y);
            }
            cr.close_path();
        }

        let (r, g, b, a) = colors.arrow.into_components();
        cr.set_source_rgba(r, g, b, a);
        cr.fill()
    }
}

impl RenderSurface for Canvas {
    type Handle = usize;

    fn insert_batch(&mut self, sprites: &[Sprite]) -> Vec<usize> {
        let start = self.arrows.len();
        self.arrows.extend(sprites.iter().map(|s| Arrow {
            center: s.center,
            size: s.size,
            angle: s.angle,
        }));
        self.dirty = true;
        (start..self.arrows.len()).collect()
    }

    fn set_angle(&mut self, handle: usize, degrees: f64) {
        if let Some(arrow) = self.arrows.get_mut(handle) {
            arrow.angle = degrees;
            self.dirty = true;
        }
    }

    fn set_highlight(&mut self, at: Option<Point>) {
        if self.highlight != at {
            self.highlight = at;
            self.dirty |= self.glow;
        }
    }

    fn clear(&mut self) {
        self.arrows.clear();
        self.dirty = true;
    }
}
