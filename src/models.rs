use chrono::{DateTime, Utc};
use derive_more::{Display, From};

/// Tile address: `x`/`y` are signed, `z` is the zoom level.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug, Display, From)]
#[display(fmt = "({}, {}, {})", x, y, z)]
pub struct Tile {
    pub x: i64,
    pub y: i64,
    pub z: u32,
}

/// One tile (or tile metadata) request taken from a single log line.
#[derive(Clone, PartialEq, Debug)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub ip_address: String,
    pub user: String,
    pub named_map_template: Option<String>,
    pub layergroup: String,
    pub layergroup_timestamp: DateTime<Utc>,
    pub z: u32,
    pub x: i64,
    pub y: i64,
    /// File extension, e.g. `png` or `grid.json`
    pub r#type: String,
}

impl Event {
    pub fn tile(&self) -> Tile {
        Tile {
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }
}
