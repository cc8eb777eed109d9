use crate::models::Event;
use crate::stats::events_by_ip;
use derive_more::Display;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Zoom {
    #[display(fmt = "Zoom in")]
    In,
    #[display(fmt = "Zoom out")]
    Out,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PanX {
    #[display(fmt = "Pan left")]
    Left,
    #[display(fmt = "Pan right")]
    Right,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PanY {
    #[display(fmt = "Pan up")]
    Up,
    #[display(fmt = "Pan down")]
    Down,
}

/// Movement between two consecutive requests. `None` on an axis means no
/// change along it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub zoom: Option<Zoom>,
    pub pan_x: Option<PanX>,
    pub pan_y: Option<PanY>,
}

pub fn classify_transition(prev: &Event, curr: &Event) -> Transition {
    Transition {
        zoom: match curr.z.cmp(&prev.z) {
            Ordering::Greater => Some(Zoom::In),
            Ordering::Less => Some(Zoom::Out),
            Ordering::Equal => None,
        },
        pan_x: match curr.x.cmp(&prev.x) {
            Ordering::Greater => Some(PanX::Right),
            Ordering::Less => Some(PanX::Left),
            Ordering::Equal => None,
        },
        pan_y: match curr.y.cmp(&prev.y) {
            Ordering::Greater => Some(PanY::Up),
            Ordering::Less => Some(PanY::Down),
            Ordering::Equal => None,
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityStep<'a> {
    pub event: &'a Event,
    /// Relative to the previous step; `None` for the first one
    pub transition: Option<Transition>,
}

impl fmt::Display for ActivityStep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.event;
        write!(f, "Time: {} X: {}, Y: {}    Z: {}", e.time, e.x, e.y, e.z)?;
        if let Some(transition) = &self.transition {
            if let Some(zoom) = transition.zoom {
                write!(f, "\n   {}", zoom)?;
            }
            if let Some(pan_x) = transition.pan_x {
                write!(f, "\n   {}", pan_x)?;
            }
            if let Some(pan_y) = transition.pan_y {
                write!(f, "\n   {}", pan_y)?;
            }
        }
        Ok(())
    }
}

/// Requests of one source in log order, each classified against the one
/// before it.
pub fn user_activity<'a>(events: &'a [Event], ip_address: &str) -> Vec<ActivityStep<'a>> {
    let requests = events_by_ip(events, ip_address);
    let first = requests.first().map(|&event| ActivityStep {
        event,
        transition: None,
    });
    first
        .into_iter()
        .chain(requests.windows(2).map(|pair| ActivityStep {
            event: pair[1],
            transition: Some(classify_transition(pair[0], pair[1])),
        }))
        .collect()
}
