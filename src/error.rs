// error.rs
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Bad shader version marker: {0}")]
    ShaderVersion(String),

    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("Shader interface mismatch: {0}")]
    Interface(String),

    #[error("Shader link failed: {0}")]
    Link(String),

    #[error("Failed to create pipeline: {0}")]
    Pipeline(String),

    #[error("No compatible GPU adapter available")]
    AdapterUnavailable,

    #[error("Failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("Surface is not supported by the selected adapter")]
    SurfaceUnsupported,

    #[error("Failed to read back render target: {0}")]
    Readback(String),
}
