use crate::config::LayerKind;
use crate::engine::{Size, SizingSource};
use crate::sys::wm::MonitorName;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::{Edge, KeyboardMode, Layer, LayerShell};

pub fn layer(kind: LayerKind) -> Layer {
    match kind {
        LayerKind::Background => Layer::Background,
        LayerKind::Bottom => Layer::Bottom,
        LayerKind::Top => Layer::Top,
        LayerKind::Overlay => Layer::Overlay,
    }
}

pub fn init_layer_shell(window: &gtk::ApplicationWindow, kind: LayerKind) {
    window.init_layer_shell();
    window.set_layer(layer(kind));
    window.set_namespace(Some("vane"));
    window.set_exclusive_zone(-1);
    for edge in [Edge::Left, Edge::Right, Edge::Top, Edge::Bottom] {
        window.set_anchor(edge, true);
    }
    window.set_keyboard_mode(KeyboardMode::None);
}

/// Empties the input region once the surface exists so clicks pass through.
pub fn set_click_through(window: &gtk::ApplicationWindow) {
    let apply = |window: &gtk::ApplicationWindow| {
        if let Some(surface) = window.surface() {
            surface.set_input_region(&cairo::Region::create());
        }
    };

    if window.is_realized() {
        apply(window);
    } else {
        window.connect_realize(move |w| apply(w));
    }
}

pub fn get_monitor_by_name(name: &MonitorName) -> Option<gdk::Monitor> {
    let display = gdk::Display::default()?;
    let monitors = display.monitors();
    (0..monitors.n_items()).find_map(|i| {
        monitors
            .item(i)
            .and_then(|item| item.downcast::<gdk::Monitor>().ok())
            .filter(|m| m.connector().is_some_and(|n| n.as_str() == **name))
    })
}

pub fn set_window_monitor(window: &gtk::ApplicationWindow, monitor_name: &MonitorName) {
    match get_monitor_by_name(monitor_name) {
        Some(monitor) => window.set_monitor(Some(&monitor)),
        None => log::warn!("Monitor {} not found, using compositor default", monitor_name),
    }
}

/// Reports the drawing area's allocation once it is on screen.
pub struct AreaSize<'a>(pub &'a gtk::DrawingArea);

impl SizingSource for AreaSize<'_> {
    fn container_size(&self) -> Option<Size> {
        self.0
            .is_mapped()
            .then(|| Size::new(self.0.width() as f64, self.0.height() as f64))
    }
}
