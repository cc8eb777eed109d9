//! Statistics over the access log of a map tile service.
//!
//! Lines are parsed into [`Event`]s by [`parser::parse`], collected in an
//! [`EventStore`], and aggregated by the read-only functions in [`stats`]
//! and [`activity`].

pub mod activity;
pub mod config;
mod errors;
pub mod models;
pub mod parser;
pub mod render;
pub mod stats;
mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use errors::Error;
pub use models::{Event, Tile};
pub use parser::{parse, ParseError, ParseErrorKind};
pub use stats::StatsError;
pub use store::EventStore;
