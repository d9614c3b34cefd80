//! R3D3: a view-projection vertex stage and the host plumbing around it.

pub mod app;
pub mod camera;
pub mod config;
pub mod error;
pub mod gpu;
pub mod headless;
pub mod interface;
pub mod logging;
pub mod mesh;
pub mod pipeline;
pub mod shader;
pub mod transform;
pub mod vertex;

pub use error::{Error, Result};
