pub mod action;
pub mod boundary;
pub mod motion;
pub mod object;
pub mod route;
