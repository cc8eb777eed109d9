use crate::errors::Error;
use crate::models::{Event, Tile};
use crate::stats::{layergroup_tiles, most_requested_tiles};
use derive_more::Display;

mod ascii;
pub use ascii::{AsciiMap, MAX_ASCII_ZOOM};
mod heatmap;
pub use heatmap::{HeatmapOverlay, Paint, Shape, OPACITY_STEP};

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[display(fmt = "Zoom level {} is too large to draw (max {})", zoom, max)]
    ZoomTooLarge { zoom: u32, max: u32 },
}

impl std::error::Error for RenderError {}

/// Draws requested tiles, outlining the `highlight` ones.
pub trait TileRenderer {
    type Output;

    fn render(&self, tiles: &[Tile], highlight: &[Tile]) -> Result<Self::Output, RenderError>;
}

/// Renders every tile requested for `layergroup` with its most requested
/// tiles highlighted.
#[tracing::instrument(skip(renderer, events))]
pub fn render_layergroup<R>(renderer: &R, events: &[Event], layergroup: &str) -> Result<R::Output, Error>
where
    R: TileRenderer,
{
    let highlight = most_requested_tiles(events, layergroup)?;
    let tiles = layergroup_tiles(events, layergroup);
    Ok(renderer.render(&tiles, &highlight)?)
}
