//! Event builders shared by unit tests.

use crate::models::Event;
use chrono::{DateTime, TimeZone, Utc};

pub fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_433_152_800 + seconds, 0).unwrap()
}

pub fn event(layergroup: &str, (x, y, z): (i64, i64, u32)) -> Event {
    Event {
        time: at(0),
        ip_address: "10.0.0.1".to_owned(),
        user: "alice".to_owned(),
        named_map_template: None,
        layergroup: layergroup.to_owned(),
        layergroup_timestamp: at(0),
        z,
        x,
        y,
        r#type: "png".to_owned(),
    }
}

pub fn with_ip(ip: &str, tile: (i64, i64, u32)) -> Event {
    Event {
        ip_address: ip.to_owned(),
        ..event("0123abcd", tile)
    }
}
