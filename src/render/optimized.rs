use log::trace;

use crate::{
    error::RenderError,
    escape::{self, ESCAPE_RADIUS_SQ, INTERIOR},
    pixel::PixelBuffer,
    render::Renderer,
    view::{Mapper, View},
};

/**
Single-threaded renderer with the per-pixel arithmetic trimmed down.

- Column real parts are computed once per frame, row imaginary parts once
  per row, both through [`Mapper`] so the coordinates are bit-identical to
  the naive renderer's.
- The iteration keeps `x²` and `y²` around and uses them for both the
  escape test and the next step: three multiplications per iteration
  instead of five.
- Points inside the main cardioid or the period-2 bulb are known never to
  escape and skip iteration entirely.
*/
pub struct Optimized {
    max_iterations: u32,
    columns: Vec<f32>,
}

impl Optimized {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            max_iterations,
            columns: Vec::new(),
        }
    }
}

impl Renderer for Optimized {
    fn name(&self) -> &'static str {
        "optimized"
    }

    fn render(&mut self, view: &View, pixels: &mut PixelBuffer) -> Result<(), RenderError> {
        trace!("begin optimized render");

        let mapper = Mapper::new(view, pixels.size());
        self.columns.clear();
        self.columns
            .extend((0..pixels.size().width).map(|px| mapper.re(px)));

        for (py, row) in pixels.rows_mut().enumerate() {
            let ci = mapper.im(py as u32);
            for (cell, &cr) in row.iter_mut().zip(&self.columns) {
                *cell = evaluate(cr, ci, self.max_iterations);
            }
        }

        trace!("end optimized render");
        Ok(())
    }
}

#[inline]
fn evaluate(cr: f32, ci: f32, max_iterations: u32) -> u8 {
    if in_cardioid_or_bulb(cr, ci) {
        return INTERIOR;
    }

    let (mut x, mut y) = (0.0f32, 0.0f32);
    let (mut x2, mut y2) = (0.0f32, 0.0f32);
    for n in 1..=max_iterations {
        // (x + x) * y rounds exactly like x * y + y * x
        y = (x + x) * y + ci;
        x = x2 - y2 + cr;
        x2 = x * x;
        y2 = y * y;
        if x2 + y2 > ESCAPE_RADIUS_SQ {
            return escape::palette_index(n);
        }
    }
    INTERIOR
}

#[inline]
fn in_cardioid_or_bulb(cr: f32, ci: f32) -> bool {
    let ci2 = ci * ci;
    let shifted = cr - 0.25;
    let q = shifted * shifted + ci2;
    if q * (q + shifted) <= 0.25 * ci2 {
        return true;
    }
    let bulb = cr + 1.0;
    bulb * bulb + ci2 <= 0.0625
}
