use crate::errors::Error;
use crate::models::Event;
use crate::parser::{parse, ParseError};
use derive_more::Deref;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use tracing::{debug, info};

/// Parsed events in log order. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    /// Parses every line, in parallel, keeping log order.
    ///
    /// The first malformed line (in log order) fails the whole store.
    pub fn from_lines<S>(lines: &[S]) -> Result<EventStore, ParseError>
    where
        S: AsRef<str> + Sync,
    {
        let parsed = lines
            .par_iter()
            .map(|line| parse(line.as_ref()))
            .collect::<Vec<_>>();

        let events = parsed
            .into_iter()
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            lines = lines.len(),
            events = events.len(),
            skipped = lines.len() - events.len(),
            "Parsed log lines"
        );
        Ok(EventStore { events })
    }

    /// Reads and parses a whole log file.
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read<P>(path: P) -> Result<EventStore, Error>
    where
        P: AsRef<Path>,
    {
        let lines = read_lines(path)?.collect::<io::Result<Vec<_>>>()?;
        let store = EventStore::from_lines(&lines)?;
        info!(lines = lines.len(), events = store.len(), "Read tile log");
        Ok(store)
    }
}

// Returns an Iterator to the Reader of the lines of the file.
fn read_lines<P>(filename: P) -> io::Result<io::Lines<io::BufReader<File>>>
where
    P: AsRef<Path>,
{
    let file = File::open(filename)?;
    Ok(io::BufReader::new(file).lines())
}
