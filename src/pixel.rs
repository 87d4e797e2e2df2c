use std::ops::{Add, Mul};
use std::slice::ChunksMut;

use bytemuck::{Pod, Zeroable};

use crate::screen;

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq)]
pub struct Complex {
    pub real: f32,
    pub imaginary: f32,
}

impl Complex {
    pub const ZERO: Self = Complex {
        real: 0.0,
        imaginary: 0.0,
    };

    pub const fn new(real: f32, imaginary: f32) -> Self {
        Self { real, imaginary }
    }

    pub fn norm_sqr(self) -> f32 {
        self.real * self.real + self.imaginary * self.imaginary
    }
}

impl Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            real: self.real + rhs.real,
            imaginary: self.imaginary + rhs.imaginary,
        }
    }
}

impl Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self {
            real: self.real * rhs.real - self.imaginary * rhs.imaginary,
            imaginary: self.real * rhs.imaginary + self.imaginary * rhs.real,
        }
    }
}

/// Row-major palette indices for one frame.
///
/// A renderer receives the buffer mutably for exactly one frame and must
/// have written every byte by the time it returns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    size: screen::Size,
    indices: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(size: screen::Size) -> Self {
        Self {
            size,
            indices: vec![0; size.pixel_count()],
        }
    }

    pub fn size(&self) -> screen::Size {
        self.size
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.indices
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.indices
    }

    pub fn rows_mut(&mut self) -> ChunksMut<'_, u8> {
        self.indices.chunks_mut(self.size.width as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.indices[y as usize * self.size.width as usize + x as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squaring_matches_expanded_form() {
        let z = Complex::new(1.5, -0.25);
        let squared = z * z;
        assert_eq!(squared.real, 1.5 * 1.5 - 0.25 * 0.25);
        assert_eq!(squared.imaginary, -0.75);
    }

    #[test]
    fn rows_cover_the_whole_buffer() {
        let mut pixels = PixelBuffer::new(screen::Size::new(5, 3));
        for (y, row) in pixels.rows_mut().enumerate() {
            assert_eq!(row.len(), 5);
            row.fill(y as u8);
        }
        assert_eq!(pixels.get(4, 2), 2);
        assert_eq!(pixels.as_slice().len(), 15);
    }
}
