use crate::models::{Event, Tile};
use chrono::{DateTime, Timelike, Utc};
use derive_more::Display;
use itertools::Itertools;
use rand::seq::IteratorRandom;
use rayon::prelude::*;
use std::collections::BTreeSet;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[display(fmt = "No events to aggregate")]
    EmptyInput,
    #[display(fmt = "No events for layergroup '{}'", _0)]
    NoLayergroupEvents(String),
}

impl std::error::Error for StatsError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomShare {
    pub z: u32,
    /// Share of all events requested at this zoom, `0.0..=1.0`
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedLayergroup {
    pub layergroup: String,
    pub timestamps: Vec<String>,
}

/// Events with the given file extension, in log order.
pub fn filter_by_type(events: &[Event], r#type: &str) -> Vec<Event> {
    events
        .par_iter()
        .filter(|e| e.r#type == r#type)
        .cloned()
        .collect()
}

/// Rendered tile requests, leaving out grids and other metadata.
pub fn tiles(events: &[Event]) -> Vec<Event> {
    filter_by_type(events, "png")
}

pub fn distinct_layergroups(events: &[Event]) -> BTreeSet<&str> {
    events.iter().map(|e| e.layergroup.as_str()).collect()
}

pub fn distinct_ip_addresses(events: &[Event]) -> BTreeSet<&str> {
    events.iter().map(|e| e.ip_address.as_str()).collect()
}

pub fn random_layergroup(events: &[Event]) -> Option<&str> {
    distinct_layergroups(events)
        .into_iter()
        .choose(&mut rand::rng())
}

pub fn random_ip_address(events: &[Event]) -> Option<&str> {
    distinct_ip_addresses(events)
        .into_iter()
        .choose(&mut rand::rng())
}

/// Share of requests per zoom level, ascending by zoom. Only zoom levels
/// present in `events` are listed.
pub fn zoom_distribution(events: &[Event]) -> Result<Vec<ZoomShare>, StatsError> {
    if events.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let total = events.len() as f64;
    Ok(events
        .iter()
        .map(|e| e.z)
        .counts()
        .into_iter()
        .sorted_by_key(|(z, _)| *z)
        .map(|(z, count)| ZoomShare {
            z,
            fraction: count as f64 / total,
        })
        .collect())
}

/// Layergroups seen with more than one layergroup timestamp, by layergroup
/// name. Timestamps are listed oldest first.
pub fn edited_layergroups(events: &[Event]) -> Vec<EditedLayergroup> {
    events
        .iter()
        .map(|e| (e.layergroup.as_str(), e.layergroup_timestamp))
        .into_group_map()
        .into_iter()
        .filter_map(|(layergroup, timestamps)| {
            let timestamps = timestamps.into_iter().collect::<BTreeSet<DateTime<Utc>>>();
            (timestamps.len() > 1).then(|| EditedLayergroup {
                layergroup: layergroup.to_owned(),
                timestamps: timestamps.iter().map(format_timestamp).collect(),
            })
        })
        .sorted_by(|a, b| a.layergroup.cmp(&b.layergroup))
        .collect()
}

// `2015-06-01 10:00:00`, with microseconds only when there are any
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    if timestamp.nanosecond() == 0 {
        timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Tiles of one layergroup, in log order.
pub fn layergroup_tiles(events: &[Event], layergroup: &str) -> Vec<Tile> {
    events
        .iter()
        .filter(|e| e.layergroup == layergroup)
        .map(Event::tile)
        .collect()
}

/// Every tile of `layergroup` requested as often as its most requested tile,
/// in tile order.
pub fn most_requested_tiles(events: &[Event], layergroup: &str) -> Result<Vec<Tile>, StatsError> {
    let frequencies = layergroup_tiles(events, layergroup).into_iter().counts();
    let max_frequency = frequencies
        .values()
        .max()
        .copied()
        .ok_or_else(|| StatsError::NoLayergroupEvents(layergroup.to_owned()))?;

    Ok(frequencies
        .into_iter()
        .filter(|(_, frequency)| *frequency == max_frequency)
        .map(|(tile, _)| tile)
        .sorted()
        .collect())
}

pub fn events_by_ip<'a>(events: &'a [Event], ip_address: &str) -> Vec<&'a Event> {
    events
        .iter()
        .filter(|e| e.ip_address == ip_address)
        .collect()
}
