pub mod data;
pub mod event;
pub mod maze;
pub mod navigation;
pub mod save;
pub mod scheduler;
pub mod services;
pub mod step;
pub mod world;
