//! Planar geometry used by the road network: points, angles, axis-aligned bounds, segments and
//! polylines. Coordinates are whatever the map's projection says they are; nothing here assumes
//! meters except the helpers in `gps`.

#[macro_use]
extern crate anyhow;

mod angle;
mod bounds;
mod gps;
mod line;
mod polyline;
mod pt;

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::gps::{meters_per_degree_lat, meters_per_degree_lon, METERS_PER_DEGREE_LAT};
pub use crate::line::Line;
pub use crate::polyline::{LinearCoords, PolyLine};
pub use crate::pt::Pt2D;

/// Two points closer than this are considered the same location.
pub const EPSILON_DIST: f64 = 1e-9;
