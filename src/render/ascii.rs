use super::{RenderError, TileRenderer};
use crate::models::Tile;
use itertools::Itertools;
use tracing::debug;

pub const MAX_ASCII_ZOOM: u32 = 10;

/// Text map of one zoom level: `#` for requested tiles, `*` for highlighted
/// ones and `.` for the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiMap {
    pub zoom: u32,
}

impl TileRenderer for AsciiMap {
    type Output = String;

    fn render(&self, tiles: &[Tile], highlight: &[Tile]) -> Result<String, RenderError> {
        if self.zoom > MAX_ASCII_ZOOM {
            return Err(RenderError::ZoomTooLarge {
                zoom: self.zoom,
                max: MAX_ASCII_ZOOM,
            });
        }
        let width = 1usize << self.zoom;
        let mut grid = vec![vec!['.'; width]; width];
        self.mark(&mut grid, tiles, '#');
        self.mark(&mut grid, highlight, '*');

        Ok(grid.iter().map(|row| row.iter().join(" ")).join("\n"))
    }
}

impl AsciiMap {
    fn mark(&self, grid: &mut [Vec<char>], tiles: &[Tile], symbol: char) {
        let width = grid.len();
        let cell = |v: i64| usize::try_from(v).ok().filter(|v| *v < width);

        for tile in tiles.iter().filter(|t| t.z == self.zoom) {
            match (cell(tile.x), cell(tile.y)) {
                (Some(x), Some(y)) => grid[y][x] = symbol,
                _ => debug!(%tile, zoom = self.zoom, "Tile outside of map"),
            }
        }
    }
}
