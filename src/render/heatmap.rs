use super::{RenderError, TileRenderer};
use crate::models::Tile;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Fill opacity of the lowest zoom level, added again for every level above.
pub const OPACITY_STEP: u8 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Fill { alpha: u8 },
    Outline,
}

/// Rectangle in image pixels, corners inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub z: u32,
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub paint: Paint,
}

/// Overlay of requested tiles on a `width` x `height` world basemap. Higher
/// zoom levels are drawn later and more opaque.
///
/// Only the shapes are computed; compositing them over a basemap image is up
/// to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapOverlay {
    pub width: u32,
    pub height: u32,
}

impl HeatmapOverlay {
    fn cell_size(&self, zoom: u32) -> Option<(i64, i64)> {
        let tiles_per_side = 1u64.checked_shl(zoom)?;
        let cell_w = u64::from(self.width) / tiles_per_side;
        let cell_h = u64::from(self.height) / tiles_per_side;
        (cell_w > 0 && cell_h > 0).then(|| (cell_w as i64, cell_h as i64))
    }
}

fn shape(tile: &Tile, (cell_w, cell_h): (i64, i64), paint: Paint) -> Shape {
    let left = tile.x.saturating_mul(cell_w);
    let top = tile.y.saturating_mul(cell_h);
    Shape {
        z: tile.z,
        left,
        top,
        right: left.saturating_add(cell_w),
        bottom: top.saturating_add(cell_h),
        paint,
    }
}

impl TileRenderer for HeatmapOverlay {
    type Output = Vec<Shape>;

    fn render(&self, tiles: &[Tile], highlight: &[Tile]) -> Result<Vec<Shape>, RenderError> {
        let mut by_zoom: BTreeMap<u32, BTreeSet<&Tile>> = BTreeMap::new();
        for tile in tiles {
            by_zoom.entry(tile.z).or_default().insert(tile);
        }

        let mut shapes = Vec::new();
        let mut alpha = OPACITY_STEP;
        for (zoom, requested) in by_zoom {
            let cell = match self.cell_size(zoom) {
                Some(cell) => cell,
                None => {
                    debug!(zoom, "Tiles smaller than a pixel, stopping");
                    break;
                }
            };

            shapes.extend(
                requested
                    .into_iter()
                    .map(|tile| shape(tile, cell, Paint::Fill { alpha })),
            );
            shapes.extend(
                highlight
                    .iter()
                    .filter(|tile| tile.z == zoom)
                    .map(|tile| shape(tile, cell, Paint::Outline)),
            );
            alpha = alpha.saturating_add(OPACITY_STEP);
        }

        Ok(shapes)
    }
}
