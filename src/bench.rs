/*!
The zoom benchmark.

A [`Harness`] renders `frame_count` frames with one renderer, shrinking the
view span by `decay` after every frame, and times each render plus
presentation.
*/

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use log::{debug, info};

use crate::{
    error::{BenchError, ConfigError},
    escape,
    pixel::PixelBuffer,
    render::{Backend, Renderer, TileSize},
    screen,
    surface::Surface,
    view::View,
};

/// Run parameters. The defaults zoom into the seahorse valley at 720p.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchConfig {
    pub center: (f32, f32),
    pub initial_span: f32,
    pub decay: f32,
    pub frame_count: usize,
    pub max_iterations: u32,
    pub size: screen::Size,
    pub tile: TileSize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            center: (-0.727003, 0.19996),
            initial_span: 10.0,
            decay: 0.9975,
            frame_count: 5000,
            max_iterations: 256,
            size: screen::Size::new(1280, 720),
            tile: TileSize::default(),
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (x, y) = self.center;
        if !(x.is_finite() && y.is_finite()) {
            return Err(ConfigError::Center(x, y));
        }
        if !(self.initial_span.is_finite() && self.initial_span > 0.0) {
            return Err(ConfigError::Span(self.initial_span));
        }
        if !(self.decay > 0.0 && self.decay <= 1.0) {
            return Err(ConfigError::Decay(self.decay));
        }
        if self.frame_count == 0 {
            return Err(ConfigError::NoFrames);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if self.max_iterations > escape::MAX_ITERATIONS {
            return Err(ConfigError::TooManyIterations {
                requested: self.max_iterations,
                limit: escape::MAX_ITERATIONS,
            });
        }
        if self.size.width == 0 || self.size.height == 0 {
            return Err(ConfigError::Size {
                width: self.size.width,
                height: self.size.height,
            });
        }
        if self.tile.width == 0 || self.tile.height == 0 {
            return Err(ConfigError::Tile {
                width: self.tile.width,
                height: self.tile.height,
            });
        }
        Ok(())
    }

    pub fn initial_view(&self) -> View {
        View::new(self.center.0, self.center.1, self.initial_span)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    pub frame_index: usize,
    pub elapsed_seconds: f64,
    pub fps: f64,
}

impl FrameTiming {
    fn new(frame_index: usize, elapsed_seconds: f64) -> Self {
        Self {
            frame_index,
            elapsed_seconds,
            fps: 1.0 / elapsed_seconds,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BenchSummary {
    pub frames: usize,
    pub min_fps: f64,
    pub mean_fps: f64,
    pub final_span: f32,
}

#[derive(Clone, Debug)]
pub struct BenchReport {
    pub renderer: &'static str,
    pub timings: Vec<FrameTiming>,
    pub summary: BenchSummary,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.renderer)?;
        for timing in &self.timings {
            writeln!(f, "fps[{:04}] = {:.6}", timing.frame_index, timing.fps)?;
        }
        writeln!(f, "min fps = {:.6}", self.summary.min_fps)?;
        writeln!(f, "mean fps = {:.6}", self.summary.mean_fps)?;
        writeln!(f, "final frame size = {:.6e}", self.summary.final_span)
    }
}

pub struct Harness {
    config: BenchConfig,
    renderer: Box<dyn Renderer>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Harness {
    pub fn new(config: BenchConfig, renderer: Box<dyn Renderer>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            renderer,
            cancel: None,
        })
    }

    /// Validate `config`, then build `backend` from it so the renderer's
    /// frame size and iteration budget always agree with the run.
    ///
    /// An accelerator that cannot be brought up falls back to the tiled
    /// renderer.
    pub fn from_backend(config: BenchConfig, backend: Backend) -> Result<Self, BenchError> {
        config.validate()?;
        let renderer = backend.create_or_fallback(&config)?;
        Ok(Self::new(config, renderer)?)
    }

    /// Stop before the next frame once `flag` is set. A frame already being
    /// rendered always runs to completion.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Render every frame in sequence and present it.
    ///
    /// A renderer or surface failure ends the run; the failed frame is never
    /// presented.
    pub fn run(&mut self, surface: &mut dyn Surface) -> Result<BenchReport, BenchError> {
        let config = self.config;
        let mut pixels = PixelBuffer::new(config.size);
        let mut view = config.initial_view();
        let mut timings = Vec::with_capacity(config.frame_count);

        info!(
            "{} renderer: {} frames at {}x{}",
            self.renderer.name(),
            config.frame_count,
            config.size.width,
            config.size.height
        );

        for frame_index in 0..config.frame_count {
            if self
                .cancel
                .as_ref()
                .map_or(false, |flag| flag.load(Ordering::Relaxed))
            {
                return Err(BenchError::Cancelled {
                    completed: frame_index,
                });
            }

            let start = Instant::now();
            self.renderer.render(&view, &mut pixels)?;
            surface.present(&pixels)?;
            // Never report a zero duration, even below the clock's resolution.
            let elapsed = start.elapsed().as_secs_f64().max(1e-9);

            let timing = FrameTiming::new(frame_index, elapsed);
            debug!(
                "frame {frame_index}: span {:e}, {:.3} fps",
                view.span, timing.fps
            );
            timings.push(timing);
            view.zoom(config.decay);
        }

        let summary = summarise(&timings, view.span);
        info!(
            "min fps {:.3}, mean fps {:.3}",
            summary.min_fps, summary.mean_fps
        );
        Ok(BenchReport {
            renderer: self.renderer.name(),
            timings,
            summary,
        })
    }
}

fn summarise(timings: &[FrameTiming], final_span: f32) -> BenchSummary {
    let min_fps = timings
        .iter()
        .map(|timing| timing.fps)
        .fold(f64::INFINITY, f64::min);
    let total: f64 = timings.iter().map(|timing| timing.elapsed_seconds).sum();
    BenchSummary {
        frames: timings.len(),
        min_fps,
        mean_fps: timings.len() as f64 / total,
        final_span,
    }
}
