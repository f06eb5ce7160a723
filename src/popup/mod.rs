// src/popup/mod.rs
pub mod controller;
pub mod view;

pub use controller::{Activation, PopupController, PopupSettings};
pub use view::{PopupView, StatusKind};
