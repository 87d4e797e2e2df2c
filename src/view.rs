//! Pixel grid to complex plane mapping.

use crate::{pixel::Complex, screen};

/// The visible window into the complex plane.
///
/// `span` is the width of the window; its height follows from the aspect
/// ratio of the pixel grid it is mapped onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub center_x: f32,
    pub center_y: f32,
    pub span: f32,
}

impl View {
    pub const fn new(center_x: f32, center_y: f32, span: f32) -> Self {
        Self {
            center_x,
            center_y,
            span,
        }
    }

    /// Shrink the span by `factor`, keeping the centre fixed.
    pub fn zoom(&mut self, factor: f32) {
        self.span *= factor;
    }
}

/**
A [`View`] bound to a pixel grid.

Both axes share one `step` (complex units per pixel), so the vertical extent
is `span * height / width` and the image is never stretched. Row 0 is the
top of the image: the imaginary part decreases as `py` grows.

`re` and `im` are the only place the mapping formula exists. Backends that
hoist per-row or per-column coordinates call them instead of stepping
incrementally, so every backend sees bit-identical coordinates.
*/
#[derive(Clone, Copy, Debug)]
pub struct Mapper {
    center_x: f32,
    center_y: f32,
    step: f32,
    half_width: f32,
    half_height: f32,
}

impl Mapper {
    pub fn new(view: &View, size: screen::Size) -> Self {
        Self {
            center_x: view.center_x,
            center_y: view.center_y,
            step: view.span / size.width as f32,
            half_width: size.width as f32 * 0.5,
            half_height: size.height as f32 * 0.5,
        }
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    #[inline]
    pub fn re(&self, px: u32) -> f32 {
        self.center_x + (px as f32 - self.half_width) * self.step
    }

    #[inline]
    pub fn im(&self, py: u32) -> f32 {
        self.center_y - (py as f32 - self.half_height) * self.step
    }

    #[inline]
    pub fn map(&self, px: u32, py: u32) -> Complex {
        Complex::new(self.re(px), self.im(py))
    }
}

/// Map pixel `(px, py)` of a `width × height` grid to the complex plane.
pub fn map_pixel(px: u32, py: u32, view: &View, width: u32, height: u32) -> Complex {
    debug_assert!(px < width && py < height);
    debug_assert!(view.span > 0.0);
    Mapper::new(view, screen::Size::new(width, height)).map(px, py)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERVIEW: View = View::new(-0.5, 0.0, 3.5);

    #[test]
    fn grid_centre_maps_to_view_centre() {
        let c = map_pixel(640, 360, &OVERVIEW, 1280, 720);
        assert_eq!(c, Complex::new(-0.5, 0.0));
    }

    #[test]
    fn mapping_is_deterministic() {
        let view = View::new(-0.727003, 0.19996, 0.0123);
        for (px, py) in [(0, 0), (17, 401), (1279, 719), (640, 1)] {
            let first = map_pixel(px, py, &view, 1280, 720);
            let second = map_pixel(px, py, &view, 1280, 720);
            assert_eq!(first.real.to_bits(), second.real.to_bits());
            assert_eq!(first.imaginary.to_bits(), second.imaginary.to_bits());
        }
    }

    #[test]
    fn horizontal_extent_is_the_span() {
        let left = map_pixel(0, 0, &OVERVIEW, 1280, 720);
        assert!((left.real + 2.25).abs() < 1e-5);
        let step = OVERVIEW.span / 1280.0;
        let right = map_pixel(1279, 0, &OVERVIEW, 1280, 720);
        assert!((right.real + step - 1.25).abs() < 1e-5);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        let mapper = Mapper::new(&OVERVIEW, screen::Size::new(1280, 720));
        let vertical = mapper.im(0) - mapper.im(720);
        assert!((vertical - 3.5 * 720.0 / 1280.0).abs() < 1e-5);
        assert!(mapper.im(0) > 0.0, "row 0 is the top of the image");
    }

    #[test]
    fn mapper_agrees_with_map_pixel() {
        let view = View::new(0.3, -0.1, 0.5);
        let mapper = Mapper::new(&view, screen::Size::new(97, 61));
        for py in 0..61 {
            for px in 0..97 {
                assert_eq!(mapper.map(px, py), map_pixel(px, py, &view, 97, 61));
            }
        }
    }

    #[test]
    fn zoom_keeps_centre() {
        let mut view = OVERVIEW;
        view.zoom(0.5);
        assert_eq!(view, View::new(-0.5, 0.0, 1.75));
    }
}
