//! Frame persistence: colour-space conversion and the per-run image directory.

pub mod color;
pub mod recorder;

pub use color::*;
pub use recorder::*;
