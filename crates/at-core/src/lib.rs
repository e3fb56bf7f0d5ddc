/// Types, configuration, and shared structures for asciitile.
///
/// This crate contains the pixel and grid types, the error type, charset
/// helpers, and the loader/sink traits used across the workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use config::SessionConfig;
pub use error::CoreError;
pub use frame::{CharGrid, RasterImage, Sample};
