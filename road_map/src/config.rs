use serde::{Deserialize, Serialize};

use crate::{Link, SurfaceType};

/// Tunable parameters for a map and its editing session. Every field has a default, so a config
/// file only needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Attributes given to new links, and to links read from files that predate per-link widths.
    pub link_defaults: LinkDefaults,
    /// Adjacent segment normals with a dot product at least this large are treated as colinear
    /// when offsetting a link's sides.
    pub colinear_dot: f64,
    /// Caps how far a sharp corner's offset can stretch, as a multiple of the width.
    pub max_miter: f64,
    /// When extending a selection along a road, stop at a junction if the straightest
    /// continuation turns by more than this many degrees.
    pub extend_max_deviation: f64,
}

impl Default for MapConfig {
    fn default() -> MapConfig {
        MapConfig {
            link_defaults: LinkDefaults::default(),
            colinear_dot: 0.97,
            max_miter: 4.0,
            extend_max_deviation: 30.0,
        }
    }
}

/// Widths are in meters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkDefaults {
    pub lanes: i32,
    pub lane_width: f32,
    pub sidewalk_width: f32,
    pub curb_height: f32,
    pub margin_width: f32,
    pub parking_width: f32,
}

impl Default for LinkDefaults {
    fn default() -> LinkDefaults {
        LinkDefaults {
            lanes: 2,
            lane_width: 3.3,
            sidewalk_width: 1.5,
            curb_height: 0.15,
            margin_width: 1.6,
            parking_width: 2.5,
        }
    }
}

/// Which classes of links to keep while reading a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadFilter {
    /// Links with a highway number
    pub highway: bool,
    pub paved: bool,
    /// Gravel, trails, two-track and dirt
    pub dirt: bool,
}

impl ReadFilter {
    pub fn all() -> ReadFilter {
        ReadFilter {
            highway: true,
            paved: true,
            dirt: true,
        }
    }

    pub fn accepts(&self, link: &Link) -> bool {
        if !self.highway && link.is_highway() {
            return false;
        }
        match link.surface {
            SurfaceType::Paved => self.paved,
            SurfaceType::Gravel | SurfaceType::Trail | SurfaceType::TwoTrack | SurfaceType::Dirt => {
                self.dirt
            }
            SurfaceType::None | SurfaceType::Railroad | SurfaceType::Stone => true,
        }
    }
}

impl Default for ReadFilter {
    fn default() -> ReadFilter {
        ReadFilter::all()
    }
}
