//! # padscope Library
//!
//! Live game controller tester: highlights the pressed buttons on a controller
//! model and draws stick and trigger indicators next to it.
//!
//! The pieces, from the device up:
//! - [`device`]: evdev device source and the shared input poller
//! - [`binder`]: button index to model node bindings and press thresholds
//! - [`display`]: stick, trigger and connection status surfaces
//! - [`scene`]: the controller model, its asset loader and the renderers
//! - [`frame`]: the per-frame driver and its cancellable loop

pub mod binder;
pub mod config;
pub mod device;
pub mod display;
pub mod error;
pub mod frame;
pub mod scene;
