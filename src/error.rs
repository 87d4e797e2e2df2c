//! Error types.

use thiserror::Error;

use crate::screen;

/// Run parameters rejected before any frame is rendered.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("view span must be positive and finite, got {0}")]
    Span(f32),

    #[error("view centre must be finite, got ({0}, {1})")]
    Center(f32, f32),

    #[error("frame count must be at least 1")]
    NoFrames,

    #[error("decay factor must lie in (0, 1], got {0}")]
    Decay(f32),

    #[error("image size must be non-zero, got {width}x{height}")]
    Size { width: u32, height: u32 },

    #[error("max iterations must be at least 1")]
    NoIterations,

    #[error("max iterations of {requested} exceeds the limit of {limit}")]
    TooManyIterations { requested: u32, limit: u32 },

    #[error("tile size must be non-zero, got {width}x{height}")]
    Tile { width: u32, height: u32 },

    #[error("invalid value for --{name}: {value}")]
    Argument { name: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("No GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// The device could not reserve memory for the pixel buffer.
#[derive(Debug, Error)]
pub enum AllocationError {
    #[error("device buffer of {requested} bytes exceeds the device limit of {limit} bytes")]
    TooLarge { requested: u64, limit: u64 },

    #[error("device out of memory: {0}")]
    OutOfMemory(String),
}

/// A device to host copy failed; the frame must not be shown.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("device buffer is {expected:?} but the host buffer is {actual:?}")]
    SizeMismatch {
        expected: screen::Size,
        actual: screen::Size,
    },

    #[error("Buffer mapping failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),

    #[error("device dropped the mapping callback")]
    Disconnected,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no display to open a window on")]
    NoDisplay,

    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error("surface reports no supported texture formats")]
    NoFormat,

    #[error("Failed to acquire surface texture: {0}")]
    Acquire(#[from] wgpu::SurfaceError),

    #[error("window was closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("palette must hold 256 RGB triples (768 bytes), got {0} bytes")]
    Length(usize),

    #[error("Failed to read palette: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Palette(#[from] PaletteError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("run cancelled after {completed} frames")]
    Cancelled { completed: usize },
}
