/*!
Tile-by-tile renderer.

The frame is cut into `tile.width × tile.height` rectangles that are
rendered independently on the rayon pool. Before any work starts the
output buffer is split into row segments and each segment is handed to
exactly one [`Tile`]; the borrow checker then guarantees that no two
workers can touch the same byte, so no locking is needed.
*/

use log::trace;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};

use crate::{
    error::RenderError,
    escape,
    pixel::{Complex, PixelBuffer},
    render::Renderer,
    screen,
    view::{Mapper, View},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileSize {
    pub width: u32,
    pub height: u32,
}

impl Default for TileSize {
    /// 32×16 bytes: a tile's output is 512 bytes, eight cache lines.
    fn default() -> Self {
        Self {
            width: 32,
            height: 16,
        }
    }
}

/// A sub-rectangle of the frame with exclusive access to its rows.
///
/// Tiles on the right and bottom edges may be narrower or shorter than
/// [`TileSize`].
struct Tile<'a> {
    x: u32,
    y: u32,
    rows: Vec<&'a mut [u8]>,
}

fn split_tiles(pixels: &mut [u8], size: screen::Size, tile: TileSize) -> Vec<Tile<'_>> {
    let width = size.width as usize;
    if width == 0 || pixels.is_empty() {
        return Vec::new();
    }
    // A tile never extends past the frame, so a huge tile is one full-frame tile.
    let tile_width = tile.width.clamp(1, size.width.max(1)) as usize;
    let tile_height = tile.height.clamp(1, size.height.max(1)) as usize;
    let tiles_across = (width + tile_width - 1) / tile_width;
    let mut tiles = Vec::new();

    for (band_index, band) in pixels.chunks_mut(width * tile_height).enumerate() {
        let y = (band_index * tile_height) as u32;
        let mut band_tiles: Vec<Tile> = (0..tiles_across)
            .map(|column| Tile {
                x: (column * tile_width) as u32,
                y,
                rows: Vec::with_capacity(tile_height),
            })
            .collect();

        for row in band.chunks_mut(width) {
            for (tile, segment) in band_tiles.iter_mut().zip(row.chunks_mut(tile_width)) {
                tile.rows.push(segment);
            }
        }

        tiles.extend(band_tiles);
    }

    tiles
}

fn render_tile(tile: Tile, mapper: &Mapper, max_iterations: u32) {
    let Tile { x, y, mut rows } = tile;
    let width = rows.first().map_or(0, |row| row.len()) as u32;
    let columns: Vec<f32> = (x..x + width).map(|px| mapper.re(px)).collect();

    for (dy, row) in rows.iter_mut().enumerate() {
        let im = mapper.im(y + dy as u32);
        for (cell, &re) in row.iter_mut().zip(&columns) {
            *cell = escape::evaluate(Complex::new(re, im), max_iterations);
        }
    }
}

pub struct Tiled {
    max_iterations: u32,
    tile: TileSize,
}

impl Tiled {
    pub fn new(max_iterations: u32, tile: TileSize) -> Self {
        Self {
            max_iterations,
            tile,
        }
    }
}

impl Renderer for Tiled {
    fn name(&self) -> &'static str {
        "tiled"
    }

    fn render(&mut self, view: &View, pixels: &mut PixelBuffer) -> Result<(), RenderError> {
        trace!("begin tiled render");

        let size = pixels.size();
        let mapper = Mapper::new(view, size);
        let max_iterations = self.max_iterations;

        split_tiles(pixels.as_mut_slice(), size, self.tile)
            .into_par_iter()
            .for_each(|tile| render_tile(tile, &mapper, max_iterations));

        trace!("end tiled render");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coverage(size: screen::Size, tile: TileSize) -> Vec<u32> {
        let mut counts = vec![0u32; size.pixel_count()];
        let mut owners = vec![0u8; size.pixel_count()];
        let tiles = split_tiles(&mut owners, size, tile);
        for tile in &tiles {
            for (dy, row) in tile.rows.iter().enumerate() {
                for dx in 0..row.len() {
                    let index = (tile.y as usize + dy) * size.width as usize + tile.x as usize + dx;
                    counts[index] += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn tiles_cover_every_pixel_once() {
        let cases = [
            (screen::Size::new(64, 32), TileSize::default()),
            (screen::Size::new(70, 37), TileSize::default()),
            (screen::Size::new(13, 7), TileSize { width: 5, height: 3 }),
            (screen::Size::new(8, 4), TileSize { width: 64, height: 64 }),
            (screen::Size::new(3, 3), TileSize { width: 1, height: 1 }),
            (screen::Size::new(64, 36), TileSize { width: u32::MAX, height: u32::MAX }),
        ];
        for (size, tile) in cases {
            assert!(
                coverage(size, tile).iter().all(|&count| count == 1),
                "{size:?} with {tile:?}"
            );
        }
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let size = screen::Size::new(70, 37);
        let mut pixels = vec![0u8; size.pixel_count()];
        let tiles = split_tiles(&mut pixels, size, TileSize::default());

        // 3 tiles across, 3 bands down
        assert_eq!(tiles.len(), 9);
        let last = tiles.last().unwrap();
        assert_eq!((last.x, last.y), (64, 32));
        assert_eq!(last.rows.len(), 5);
        assert!(last.rows.iter().all(|row| row.len() == 6));
    }

    #[test]
    fn writes_every_byte() {
        let size = screen::Size::new(45, 23);
        let mut pixels = PixelBuffer::new(size);
        pixels.as_mut_slice().fill(0xEE);
        Tiled::new(300, TileSize { width: 8, height: 4 })
            .render(&View::new(0.0, 0.0, 0.01), &mut pixels)
            .unwrap();
        // the whole view lies in the main cardioid
        assert!(pixels.as_slice().iter().all(|&index| index == escape::INTERIOR));
    }

    #[test]
    fn oversized_tiles_still_write_every_byte() {
        let size = screen::Size::new(64, 36);
        for tile in [
            TileSize { width: u32::MAX, height: 16 },
            TileSize { width: 16, height: u32::MAX },
        ] {
            let mut pixels = PixelBuffer::new(size);
            pixels.as_mut_slice().fill(0xEE);
            Tiled::new(300, tile)
                .render(&View::new(0.0, 0.0, 0.01), &mut pixels)
                .unwrap();
            assert!(
                pixels.as_slice().iter().all(|&index| index == escape::INTERIOR),
                "{tile:?}"
            );
        }
    }
}
