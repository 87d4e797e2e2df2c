/*!
Mandelbrot renderers and a zoom benchmark.

Every backend fills the same 8-bit palette-indexed [`pixel::PixelBuffer`]
from the same [`view::View`]; they differ only in how the work is
scheduled. The [`bench::Harness`] drives one backend through a fixed
zoom sequence and reports frames per second.
*/

pub mod bench;
pub mod colour;
pub mod error;
pub mod escape;
pub mod gpu;
pub mod pixel;
pub mod render;
pub mod screen;
pub mod surface;
pub mod view;
