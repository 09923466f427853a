// UI module - Slint window and event loop bridge
//
// This module contains:
// - UiBridge: Coordinates between the tokio runtime and the Slint event loop
// - GuiController: Wires the window's callbacks to the gallery shell and
//   renders gallery events

pub mod bridge;
pub mod controller;

pub use bridge::UiBridge;
pub use controller::GuiController;
