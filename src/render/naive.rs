use log::trace;

use crate::{
    error::RenderError,
    escape,
    pixel::PixelBuffer,
    render::Renderer,
    view::{self, View},
};

/// Reference renderer: maps and evaluates each pixel independently in
/// row-major order.
pub struct Naive {
    max_iterations: u32,
}

impl Naive {
    pub fn new(max_iterations: u32) -> Self {
        Self { max_iterations }
    }
}

impl Renderer for Naive {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn render(&mut self, view: &View, pixels: &mut PixelBuffer) -> Result<(), RenderError> {
        trace!("begin naive render");

        let size = pixels.size();
        for (py, row) in pixels.rows_mut().enumerate() {
            for (px, cell) in row.iter_mut().enumerate() {
                let c = view::map_pixel(px as u32, py as u32, view, size.width, size.height);
                *cell = escape::evaluate(c, self.max_iterations);
            }
        }

        trace!("end naive render");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{escape::INTERIOR, screen};

    #[test]
    fn centre_of_main_cardioid_is_interior() {
        let mut pixels = PixelBuffer::new(screen::Size::new(64, 36));
        Naive::new(200)
            .render(&View::new(-0.5, 0.0, 3.5), &mut pixels)
            .unwrap();
        // (-0.5, 0) sits well inside the cardioid
        assert_eq!(pixels.get(32, 18), INTERIOR);
        // the left edge at re = -2.25 escapes
        assert_ne!(pixels.get(0, 18), INTERIOR);
    }

    #[test]
    fn overwrites_stale_contents() {
        let size = screen::Size::new(16, 9);
        let view = View::new(-0.5, 0.0, 3.5);
        let mut clean = PixelBuffer::new(size);
        let mut dirty = PixelBuffer::new(size);
        dirty.as_mut_slice().fill(0xAB);

        let mut renderer = Naive::new(64);
        renderer.render(&view, &mut clean).unwrap();
        renderer.render(&view, &mut dirty).unwrap();
        assert_eq!(clean, dirty);
    }
}
