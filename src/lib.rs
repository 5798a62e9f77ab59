//! Adventure engine core: event scheduler, object model, motion, routing
//! and the maze overlay, driven one tick at a time through `sim::step`.

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
pub mod ui;
