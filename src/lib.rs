pub mod config;
pub mod engine;
pub mod events;
pub mod gui;
pub mod macros;
pub mod sys;
