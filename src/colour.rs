//! Palettes: palette index to display colour.

use std::{fs, path::Path};

use bytemuck::{Pod, Zeroable};
use log::{debug, trace};
use rayon::prelude::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::error::PaletteError;

#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// 256 colours. Index 0 colours the interior of the set, 1–255 the escape
/// gradient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    colours: [Rgb; 256],
}

impl Palette {
    pub const LEN: usize = 256;

    /// Parse a raw table of 256 `r, g, b` byte triples.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PaletteError> {
        if bytes.len() != Self::LEN * 3 {
            return Err(PaletteError::Length(bytes.len()));
        }
        let mut colours = [Rgb::default(); 256];
        colours.copy_from_slice(bytemuck::cast_slice(bytes));
        Ok(Self { colours })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PaletteError> {
        let path = path.as_ref();
        debug!("loading palette from {}", path.display());
        Self::from_bytes(&fs::read(path)?)
    }

    pub fn get(&self, index: u8) -> Rgb {
        self.colours[index as usize]
    }

    /// Expand palette indices into tightly packed RGBA bytes.
    pub fn expand(&self, indices: &[u8], rgba: &mut [u8]) {
        trace!("begin palette expand");
        debug_assert_eq!(indices.len() * 4, rgba.len());

        rgba.par_chunks_mut(4)
            .zip(indices.par_iter())
            .for_each(|(pixel, &index)| {
                let Rgb { r, g, b } = self.colours[index as usize];
                pixel.copy_from_slice(&[r, g, b, 0xFF]);
            });

        trace!("end palette expand");
    }
}

impl Default for Palette {
    /// Black interior; escaped points fade from deep blue through white to
    /// orange (Bernstein polynomial gradient).
    fn default() -> Self {
        let mut colours = [Rgb::default(); 256];
        for (index, colour) in colours.iter_mut().enumerate().skip(1) {
            let t = index as f32 / 255.0;
            let u = 1.0 - t;
            let channel = |value: f32| (value * 255.0).clamp(0.0, 255.0) as u8;
            *colour = Rgb {
                r: channel(9.0 * u * t * t * t),
                g: channel(15.0 * u * u * t * t),
                b: channel(8.5 * u * u * u * t),
            };
        }
        Self { colours }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_interior_is_black() {
        assert_eq!(Palette::default().get(0), Rgb { r: 0, g: 0, b: 0 });
        assert_ne!(Palette::default().get(128), Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn rejects_short_tables() {
        let error = Palette::from_bytes(&[0; 767]).unwrap_err();
        assert!(matches!(error, PaletteError::Length(767)));
    }

    #[test]
    fn parses_triples_in_order() {
        let bytes: Vec<u8> = (0..768).map(|i| (i % 251) as u8).collect();
        let palette = Palette::from_bytes(&bytes).unwrap();
        assert_eq!(palette.get(0), Rgb { r: 0, g: 1, b: 2 });
        assert_eq!(palette.get(1), Rgb { r: 3, g: 4, b: 5 });
    }

    #[test]
    fn expands_to_opaque_rgba() {
        let mut bytes = vec![0u8; 768];
        bytes[3..6].copy_from_slice(&[10, 20, 30]);
        let palette = Palette::from_bytes(&bytes).unwrap();

        let mut rgba = vec![0u8; 12];
        palette.expand(&[1, 0, 1], &mut rgba);
        assert_eq!(rgba, [10, 20, 30, 255, 0, 0, 0, 255, 10, 20, 30, 255]);
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("mandelbench-palette-{}.bin", std::process::id()));
        std::fs::write(&path, vec![7u8; 768]).unwrap();
        let palette = Palette::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(palette.get(255), Rgb { r: 7, g: 7, b: 7 });
    }
}
