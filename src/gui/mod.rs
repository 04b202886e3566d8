pub mod app;
pub mod canvas;
pub mod clock;
pub mod theme;
pub mod window;
