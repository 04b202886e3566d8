//! Drives a [`Field`] from the GTK frame clock.
//!
//! Frame work runs in a widget tick callback, queued orientation batches in a
//! default-idle source so they interleave with input and painting.

use crate::engine::{Field, FrameRequest, FrameTick};
use crate::gui::canvas::Canvas;
use gtk::glib;
use gtk::prelude::*;
use gtk4 as gtk;
use std::cell::RefCell;
use std::rc::Rc;

pub type SharedField = Rc<RefCell<Field<Canvas>>>;

pub fn now_ms() -> f64 {
    glib::monotonic_time() as f64 / 1000.0
}

pub struct FrameDriver {
    widget: gtk::DrawingArea,
    field: SharedField,
    tick: Rc<RefCell<Option<gtk::TickCallbackId>>>,
    batches: Rc<RefCell<Option<glib::SourceId>>>,
}

impl FrameDriver {
    pub fn new(widget: gtk::DrawingArea, field: SharedField) -> Self {
        Self {
            widget,
            field,
            tick: Rc::default(),
            batches: Rc::default(),
        }
    }

    pub fn apply(&self, request: FrameRequest) {
        match request {
            FrameRequest::Request => self.request_frame(),
            FrameRequest::Cancel => self.cancel(),
            FrameRequest::Keep => {}
        }
        self.redraw_if_dirty();
    }

    /// Removes the tick callback and any batch source.
    pub fn cancel(&self) {
        if let Some(id) = self.tick.borrow_mut().take() {
            id.remove();
        }
        if let Some(id) = self.batches.borrow_mut().take() {
            id.remove();
        }
    }

    pub fn redraw_if_dirty(&self) {
        if self.field.borrow_mut().surface_mut().take_dirty() {
            self.widget.queue_draw();
        }
    }

    fn request_frame(&self) {
        // a new request always replaces the old callback
        self.cancel();

        let field = self.field.clone();
        let tick_slot = self.tick.clone();
        let batches = self.batches.clone();

        let id = self.widget.add_tick_callback(move |widget, clock| {
            let now = clock.frame_time() as f64 / 1000.0;
            let tick = field.borrow_mut().on_frame(now);

            match tick {
                FrameTick::Run => {
                    let (dirty, pending) = {
                        let mut f = field.borrow_mut();
                        (f.surface_mut().take_dirty(), f.has_pending_batches())
                    };
                    if dirty {
                        widget.queue_draw();
                    }
                    if pending {
                        drain_batches(widget, &field, &batches);
                    }
                    glib::ControlFlow::Continue
                }
                FrameTick::Throttled => glib::ControlFlow::Continue,
                FrameTick::Suspended => {
                    tick_slot.borrow_mut().take();
                    glib::ControlFlow::Break
                }
            }
        });

        *self.tick.borrow_mut() = Some(id);
    }
}

fn drain_batches(
    widget: &gtk::DrawingArea,
    field: &SharedField,
    slot: &Rc<RefCell<Option<glib::SourceId>>>,
) {
    if slot.borrow().is_some() {
        return;
    }

    let widget = widget.clone();
    let field = field.clone();
    let slot_inner = slot.clone();

    let id = glib::idle_add_local(move || {
        let (more, dirty) = {
            let mut f = field.borrow_mut();
            let more = f.run_next_batch();
            (more, f.surface_mut().take_dirty())
        };
        if dirty {
            widget.queue_draw();
        }

        if more {
            glib::ControlFlow::Continue
        } else {
            slot_inner.borrow_mut().take();
            glib::ControlFlow::Break
        }
    });

    *slot.borrow_mut() = Some(id);
}
