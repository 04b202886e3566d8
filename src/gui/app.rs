use crate::config::{self, Config};
use crate::engine::{Field, Point, Size, StartOutcome};
use crate::events::AppEvent;
use crate::gui::canvas::Canvas;
use crate::gui::clock::{self, FrameDriver, SharedField};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window::{self, AreaSize};
use crate::sys::wm::MonitorName;
use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use gtk4_layer_shell::LayerShell;
use relm4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

pub struct AppModel {
    pub field: SharedField,
    pub clock: FrameDriver,
    pub config: Config,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
}

pub struct AppInit {
    pub config: Config,
    pub monitor: Option<MonitorName>,
    pub rx: async_channel::Receiver<AppEvent>,
}

#[derive(Debug)]
pub enum AppMsg {
    Start,
    Show,
    Hide,
    Toggle,
    Mapped(bool),
    Resize(i32, i32),
    PointerMove(Point),
    TouchMove(Option<Point>),
    CursorMove(Point),
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Show => AppMsg::Show,
            AppEvent::Hide => AppMsg::Hide,
            AppEvent::Toggle => AppMsg::Toggle,
            AppEvent::CursorMove(p) => AppMsg::CursorMove(p),
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

fn touch_point(event: &gdk::Event) -> Option<Option<Point>> {
    match event.event_type() {
        gdk::EventType::TouchBegin | gdk::EventType::TouchUpdate => {
            Some(event.position().map(|(x, y)| Point::new(x, y)))
        }
        _ => None,
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = AppInit;
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Vane"),
            add_css_class: "vane-window",
            set_decorated: false,

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "vane-field",

                connect_resize[sender] => move |_, w, h| {
                    sender.input(AppMsg::Resize(w, h));
                },
                connect_map[sender] => move |_| {
                    sender.input(AppMsg::Mapped(true));
                },
                connect_unmap[sender] => move |_| {
                    sender.input(AppMsg::Mapped(false));
                },

                add_controller = gtk::EventControllerMotion {
                    connect_motion[sender] => move |_, x, y| {
                        sender.input(AppMsg::PointerMove(Point::new(x, y)));
                    }
                },

                add_controller = gtk::EventControllerLegacy {
                    connect_event[sender] => move |_, event| {
                        if let Some(at) = touch_point(event) {
                            sender.input(AppMsg::TouchMove(at));
                        }
                        glib::Propagation::Proceed
                    }
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let AppInit {
            config,
            monitor,
            rx,
        } = init;

        theme::load_css();
        window::init_layer_shell(&root, config.appearance.layer);
        if let Some(name) = &monitor {
            window::set_window_monitor(&root, name);
        }
        if config.appearance.click_through {
            window::set_click_through(&root);
        }

        let field = Rc::new(RefCell::new(Field::new(
            config.engine_settings(),
            Canvas::new(&config.appearance),
        )));

        let model = AppModel {
            clock: FrameDriver::new(gtk::DrawingArea::default(), field.clone()),
            field,
            config,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.clock = FrameDriver::new(widgets.drawing_area.clone(), model.field.clone());

        let field_draw = model.field.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                if let Err(e) = field_draw.borrow().surface().draw(cr, &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        sender.input(AppMsg::Start);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Start => {
                let outcome = self
                    .field
                    .borrow_mut()
                    .start(&AreaSize(&self.drawing_area));
                match outcome {
                    StartOutcome::Started(request) => self.clock.apply(request),
                    // retried from the map handler
                    StartOutcome::Deferred => {}
                }
            }
            AppMsg::Show => self.root.set_visible(true),
            AppMsg::Hide => self.root.set_visible(false),
            AppMsg::Toggle => self.root.set_visible(!self.root.is_visible()),
            AppMsg::Mapped(visible) => {
                let request = self.field.borrow_mut().set_visible(visible);
                self.clock.apply(request);
                if visible && self.field.borrow().is_start_deferred() {
                    sender.input(AppMsg::Start);
                }
            }
            AppMsg::Resize(w, h) => {
                let request = self
                    .field
                    .borrow_mut()
                    .resize(Size::new(w as f64, h as f64));
                self.clock.apply(request);
            }
            AppMsg::PointerMove(at) | AppMsg::CursorMove(at) => {
                self.field.borrow_mut().on_pointer_move(at, clock::now_ms());
            }
            AppMsg::TouchMove(at) => {
                self.field.borrow_mut().on_touch_move(at, clock::now_ms());
                self.clock.redraw_if_dirty();
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    if new_config.appearance.layer != self.config.appearance.layer {
                        self.root
                            .set_layer(window::layer(new_config.appearance.layer));
                    }
                    let request = {
                        let mut field = self.field.borrow_mut();
                        field.surface_mut().set_appearance(&new_config.appearance);
                        field.reconfigure(new_config.engine_settings())
                    };
                    self.clock.apply(request);
                    self.config = new_config;
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
    }

    fn shutdown(&mut self, _widgets: &mut Self::Widgets, _output: relm4::Sender<Self::Output>) {
        let request = self.field.borrow_mut().stop();
        self.clock.apply(request);
        self.clock.cancel();
        log::debug!("Field stopped");
    }
}
