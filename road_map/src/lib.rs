//! A transportation network: nodes joined by links, each link a polyline with road attributes.
//!
//! `RoadMap` owns everything and reads/writes the RMF binary format. `RoadMapEdit` wraps a map
//! with selection, displayed road width, and topology editing (splitting links, merging nodes,
//! deleting).

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod edit;
mod error;
mod map;
mod objects;
mod projection;
mod rmf;

use std::fmt;

use slotmap::Key;

pub use crate::config::{LinkDefaults, MapConfig, ReadFilter};
pub use crate::edit::{LinkSides, RoadMapEdit};
pub use crate::error::TopologyError;
pub use crate::map::{MapStats, RoadMap};
pub use crate::objects::link::{
    Link, SurfaceType, FLAG_FORWARD, FLAG_MARGIN, FLAG_PARKING, FLAG_REVERSE, FLAG_SIDEWALK,
};
pub use crate::objects::node::{
    IntersectionType, LightStatus, LinkConnect, Node, VisualIntersectionType,
};
pub use crate::projection::Projection;
pub use crate::rmf::{read_map, read_version, write_map, FormatVersion};

slotmap::new_key_type! {
    /// Handle to a node owned by a `RoadMap`. Stays invalid after the node is removed.
    pub struct NodeID;
    /// Handle to a link owned by a `RoadMap`.
    pub struct LinkID;
}

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node {:?}", self.data())
    }
}

impl fmt::Display for LinkID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Link {:?}", self.data())
    }
}
