//! CPU renderers and the backend selection shared with the GPU path.

pub mod naive;
pub mod optimized;
pub mod tiled;

use std::{fmt, str::FromStr};

use log::{info, warn};

use crate::{
    bench::BenchConfig,
    error::{BenchError, RenderError},
    gpu::{self, GpuContext},
    pixel::PixelBuffer,
    view::View,
};

pub use naive::Naive;
pub use optimized::Optimized;
pub use tiled::{TileSize, Tiled};

/// Renders one complete frame of palette indices.
pub trait Renderer {
    fn name(&self) -> &'static str;

    /// Fill every byte of `pixels` for `view`.
    ///
    /// On error the buffer contents are unspecified and must not be
    /// presented.
    fn render(&mut self, view: &View, pixels: &mut PixelBuffer) -> Result<(), RenderError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Naive,
    Optimized,
    Tiled,
    Accelerated,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::Naive,
        Backend::Optimized,
        Backend::Tiled,
        Backend::Accelerated,
    ];

    /// Command-line names, in the order of [`Backend::ALL`].
    pub const NAMES: [&'static str; 4] = ["naive", "optimized", "tiled", "gpu"];

    pub fn create(self, config: &BenchConfig) -> Result<Box<dyn Renderer>, BenchError> {
        let renderer: Box<dyn Renderer> = match self {
            Backend::Naive => Box::new(Naive::new(config.max_iterations)),
            Backend::Optimized => Box::new(Optimized::new(config.max_iterations)),
            Backend::Tiled => Box::new(Tiled::new(config.max_iterations, config.tile)),
            Backend::Accelerated => {
                let context = GpuContext::init()?;
                Box::new(gpu::Accelerated::new(
                    context,
                    config.size,
                    config.max_iterations,
                )?)
            }
        };
        info!("using {} renderer", renderer.name());
        Ok(renderer)
    }

    /// Like [`Backend::create`], but an accelerator that cannot be brought
    /// up is replaced by the tiled CPU renderer instead of ending the run.
    pub fn create_or_fallback(self, config: &BenchConfig) -> Result<Box<dyn Renderer>, BenchError> {
        match self.create(config) {
            Err(error @ (BenchError::Gpu(_) | BenchError::Allocation(_))) => {
                warn!("{} backend unavailable ({}), falling back to tiled", self, error);
                Backend::Tiled.create(config)
            }
            result => result,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Backend::Naive => Self::NAMES[0],
            Backend::Optimized => Self::NAMES[1],
            Backend::Tiled => Self::NAMES[2],
            Backend::Accelerated => Self::NAMES[3],
        };
        f.write_str(name)
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|backend| backend.to_string() == s)
            .ok_or_else(|| format!("unknown backend {s:?}"))
    }
}
