//! Terminal handling module
//!
//! This module provides abstractions for terminal operations, including:
//! - Terminal size detection
//! - Geometry bookkeeping across resizes
//! - The escape sequences used to redraw in place
//! - A vt100-backed virtual terminal for tests

mod size;
mod geometry;
pub mod escape;
mod test_env;
pub mod test_helpers;

pub use size::{CrosstermProbe, GeometryProbe, ManualProbe, DEFAULT_SIZE};
pub(crate) use size::probe_or_default;
pub use geometry::TerminalGeometry;
pub use test_env::TestEnv;
