//! # pt_progress
//!
//! Renders the progress of many concurrently running workers as stacked bars
//! that redraw in place, while letting those workers print ordinary lines
//! without tearing the display.
//!
//! * [`Session`] owns the registry of bars and the background loops (render
//!   loop, resize watcher) and, optionally, the process-wide termination slot.
//! * [`OutputGate`] is the one lock every terminal write goes through; clone
//!   it into worker threads to print with [`OutputGate::print_message`] or
//!   [`pt_println!`].
//! * [`SharedProgress`] is the percentage a worker updates; the session only
//!   reads it.
//!
//! Background loops run on the caller's tokio runtime.

#![deny(unused_imports)]

pub mod config;
pub mod errors;
mod fill;
mod gate;
pub mod registry;
pub mod renderer;
mod resize;
mod session;
mod shutdown;
mod signals;
pub mod terminal;

pub use config::{BarWidth, MonitorConfig, MonitorConfigBuilder, ResizeStrategy};
pub use errors::{OrExit, ProgressError, Result};
pub use fill::FillBuffer;
pub use gate::OutputGate;
pub use registry::{ProgressSource, RegistryStats, SharedProgress};
pub use renderer::BarRenderer;
pub use session::{Session, SessionState};
pub use terminal::{CrosstermProbe, GeometryProbe, ManualProbe, TerminalGeometry};
