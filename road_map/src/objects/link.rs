use serde::{Deserialize, Serialize};

use geom::{Bounds, LinearCoords, PolyLine, Pt2D};

use crate::{LinkDefaults, LinkSides, NodeID};

// Bits of `Link::flags`. These values are stored in RMF files.
pub const FLAG_SIDEWALK: u32 = 0x0800;
pub const FLAG_PARKING: u32 = 0x0400;
pub const FLAG_MARGIN: u32 = 0x0200;
pub const FLAG_FORWARD: u32 = 0x0080;
pub const FLAG_REVERSE: u32 = 0x0040;

/// The discriminants are the RMF encoding.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SurfaceType {
    None = 0,
    Gravel = 1,
    Trail = 2,
    TwoTrack = 3,
    Dirt = 4,
    Paved = 5,
    Railroad = 6,
    Stone = 7,
}

impl SurfaceType {
    pub fn from_i32(x: i32) -> Option<SurfaceType> {
        match x {
            0 => Some(SurfaceType::None),
            1 => Some(SurfaceType::Gravel),
            2 => Some(SurfaceType::Trail),
            3 => Some(SurfaceType::TwoTrack),
            4 => Some(SurfaceType::Dirt),
            5 => Some(SurfaceType::Paved),
            6 => Some(SurfaceType::Railroad),
            7 => Some(SurfaceType::Stone),
            _ => None,
        }
    }
}

/// An edge of the network: a polyline from `src` (node 0) to `dst` (node 1), plus what kind of
/// road it is.
///
/// Equality only compares road attributes (width, lanes, surface, highway number and flags), never
/// geometry or endpoints, so it answers "were this link's attributes edited?"
#[derive(Clone, Debug, Serialize)]
pub struct Link {
    /// Only meaningful while reading or right after writing a file.
    pub id: i32,
    center: PolyLine,
    /// Meters
    pub width: f32,
    pub lanes: i32,
    pub surface: SurfaceType,
    /// -1 if this isn't part of a numbered highway
    pub highway: i32,
    flags: u32,
    pub sidewalk_width: f32,
    pub curb_height: f32,
    pub margin_width: f32,
    pub lane_width: f32,
    pub parking_width: f32,
    src: NodeID,
    dst: NodeID,

    #[serde(skip)]
    extent: Bounds,
    #[serde(skip)]
    length: f64,
    #[serde(skip)]
    pub selected: bool,
    /// Displayed edges, computed lazily and dropped whenever geometry or flags change.
    #[serde(skip)]
    pub(crate) sides: Option<LinkSides>,
}

impl PartialEq for Link {
    fn eq(&self, other: &Link) -> bool {
        self.width == other.width
            && self.lanes == other.lanes
            && self.surface == other.surface
            && self.highway == other.highway
            && self.flags == other.flags
    }
}

impl Link {
    /// A two-way paved road with default widths. The caller is responsible for attaching it to
    /// both nodes; see `RoadMap::new_link`.
    pub fn new(src: NodeID, dst: NodeID, center: PolyLine, defaults: &LinkDefaults) -> Link {
        let mut link = Link {
            id: 0,
            center,
            width: defaults.lanes as f32 * defaults.lane_width,
            lanes: defaults.lanes,
            surface: SurfaceType::Paved,
            highway: -1,
            flags: FLAG_FORWARD | FLAG_REVERSE,
            sidewalk_width: defaults.sidewalk_width,
            curb_height: defaults.curb_height,
            margin_width: defaults.margin_width,
            lane_width: defaults.lane_width,
            parking_width: defaults.parking_width,
            src,
            dst,
            extent: Bounds::new(),
            length: 0.0,
            selected: false,
            sides: None,
        };
        link.dirtied();
        link
    }

    pub fn src(&self) -> NodeID {
        self.src
    }

    pub fn dst(&self) -> NodeID {
        self.dst
    }

    /// The node at the start or end.
    pub fn node(&self, is_start: bool) -> NodeID {
        if is_start {
            self.src
        } else {
            self.dst
        }
    }

    pub(crate) fn set_node(&mut self, is_start: bool, node: NodeID) {
        if is_start {
            self.src = node;
        } else {
            self.dst = node;
        }
    }

    /// The node at the other end, or None if `node` isn't an endpoint. A loop returns itself.
    pub fn other_node(&self, node: NodeID) -> Option<NodeID> {
        if self.src == node {
            Some(self.dst)
        } else if self.dst == node {
            Some(self.src)
        } else {
            None
        }
    }

    pub fn is_loop(&self) -> bool {
        self.src == self.dst
    }

    pub fn is_highway(&self) -> bool {
        self.highway > 0
    }

    pub fn center(&self) -> &PolyLine {
        &self.center
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        self.center.points()
    }

    /// Replace the geometry. Cached extent, length and sides are refreshed.
    pub fn set_points(&mut self, center: PolyLine) {
        self.center = center;
        self.dirtied();
    }

    /// Must be called after anything that changes the geometry or flags.
    pub fn dirtied(&mut self) {
        self.compute_extent();
        self.length = self.center.length();
        self.sides = None;
    }

    pub fn compute_extent(&mut self) {
        self.extent = self.center.get_bounds();
    }

    pub fn extent(&self) -> Bounds {
        self.extent
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// The first or last point.
    pub fn end_point(&self, is_start: bool) -> Pt2D {
        if is_start {
            self.center.first_pt()
        } else {
            self.center.last_pt()
        }
    }

    /// The second point from the start, or the second-to-last point. This is what the link looks
    /// like from its node.
    pub fn next_to_end(&self, is_start: bool) -> Pt2D {
        let pts = self.center.points();
        if is_start {
            pts[1]
        } else {
            pts[pts.len() - 2]
        }
    }

    pub fn flags(&self) -> u32 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u32) {
        self.flags = flags;
        self.sides = None;
    }

    pub fn get_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }

    pub fn set_flag(&mut self, flag: u32, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
        self.sides = None;
    }

    /// Total width in meters: the lanes, plus parking and margins on both sides, plus sidewalks if
    /// requested.
    pub fn estimate_width(&self, include_sidewalk: bool) -> f32 {
        let mut width = self.lanes as f32 * self.lane_width;
        if self.get_flag(FLAG_PARKING) {
            width += 2.0 * self.parking_width;
        }
        if self.get_flag(FLAG_MARGIN) {
            width += 2.0 * self.margin_width;
        }
        if include_sidewalk && self.get_flag(FLAG_SIDEWALK) {
            width += 2.0 * self.sidewalk_width;
        }
        width
    }

    /// Meters from the center line to the displayed left edge.
    pub fn left_width(&self) -> f32 {
        self.half_width()
    }

    /// Meters from the center line to the displayed right edge.
    pub fn right_width(&self) -> f32 {
        self.half_width()
    }

    // Flags don't distinguish sides yet, so both edges are symmetric.
    fn half_width(&self) -> f32 {
        self.estimate_width(true) / 2.0
    }

    pub fn linear_coords(&self, pt: Pt2D, allow_ends: bool) -> LinearCoords {
        self.center.linear_coords(pt, allow_ends)
    }

    pub fn distance_to_point(&self, pt: Pt2D, allow_ends: bool) -> f64 {
        self.center.dist_to_pt(pt, allow_ends)
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn link(pts: Vec<Pt2D>) -> Link {
        let mut nodes: SlotMap<NodeID, ()> = SlotMap::with_key();
        Link::new(
            nodes.insert(()),
            nodes.insert(()),
            PolyLine::must_new(pts),
            &LinkDefaults::default(),
        )
    }

    #[test]
    fn distance_to_straight_link() {
        let l = link(vec![Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)]);
        assert_eq!(l.length(), 10.0);
        assert!((l.distance_to_point(Pt2D::new(5.0, 3.0), true) - 3.0).abs() < 1e-9);
        let lc = l.linear_coords(Pt2D::new(5.0, 3.0), true);
        assert!((lc.a - 5.0).abs() < 1e-9);
        assert!((lc.b - 3.0).abs() < 1e-9);
        assert_eq!(lc.segment, 0);
        assert!((lc.fraction - 0.5).abs() < 1e-9);
    }

    #[test]
    fn width_estimate() {
        let mut l = link(vec![Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)]);
        l.lanes = 2;
        l.lane_width = 3.0;
        l.parking_width = 2.0;
        l.margin_width = 1.0;
        l.sidewalk_width = 1.5;
        assert_eq!(l.estimate_width(true), 6.0);

        l.set_flag(FLAG_PARKING, true);
        assert_eq!(l.estimate_width(false), 10.0);
        l.set_flag(FLAG_MARGIN, true);
        assert_eq!(l.estimate_width(false), 12.0);
        l.set_flag(FLAG_SIDEWALK, true);
        assert_eq!(l.estimate_width(false), 12.0);
        assert_eq!(l.estimate_width(true), 15.0);
        assert_eq!(l.left_width(), 7.5);
        assert_eq!(l.right_width(), 7.5);
    }

    #[test]
    fn flags() {
        let mut l = link(vec![Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)]);
        assert!(l.get_flag(FLAG_FORWARD));
        assert!(l.get_flag(FLAG_REVERSE));
        l.set_flag(FLAG_REVERSE, false);
        assert_eq!(l.flags(), FLAG_FORWARD);
        assert!(!l.get_flag(FLAG_SIDEWALK));
    }

    #[test]
    fn equality_ignores_geometry() {
        let a = link(vec![Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)]);
        let mut b = link(vec![Pt2D::new(5.0, 5.0), Pt2D::new(7.0, 1.0), Pt2D::new(9.0, 9.0)]);
        assert_eq!(a, b);

        b.set_flag(FLAG_SIDEWALK, true);
        assert_ne!(a, b);
        b.set_flag(FLAG_SIDEWALK, false);
        b.highway = 5;
        assert_ne!(a, b);
    }

    #[test]
    fn set_points_refreshes_caches() {
        let mut l = link(vec![Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0)]);
        l.set_points(PolyLine::must_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(0.0, 3.0),
            Pt2D::new(4.0, 3.0),
        ]));
        assert_eq!(l.length(), 7.0);
        assert_eq!(l.extent().max_x, 4.0);
        assert_eq!(l.extent().max_y, 3.0);
        assert_eq!(l.next_to_end(true), Pt2D::new(0.0, 3.0));
        assert_eq!(l.next_to_end(false), Pt2D::new(0.0, 3.0));
    }
}
