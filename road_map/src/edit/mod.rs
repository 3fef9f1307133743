//! An editing session over a `RoadMap`: selection, the displayed width of links, and topology
//! edits. Selection flags and cached sides live on the nodes and links themselves but never reach
//! RMF files.

mod extend;
mod selection;
mod sides;
mod topology;

use std::ops::{Deref, DerefMut};

use crate::RoadMap;
pub use sides::LinkSides;

pub struct RoadMapEdit {
    map: RoadMap,
}

impl RoadMapEdit {
    pub fn new(map: RoadMap) -> RoadMapEdit {
        RoadMapEdit { map }
    }

    pub fn into_inner(self) -> RoadMap {
        self.map
    }
}

impl Deref for RoadMapEdit {
    type Target = RoadMap;

    fn deref(&self) -> &RoadMap {
        &self.map
    }
}

impl DerefMut for RoadMapEdit {
    fn deref_mut(&mut self) -> &mut RoadMap {
        &mut self.map
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use geom::{PolyLine, Pt2D};

    use crate::{LinkID, NodeID, RoadMap};

    pub fn pl(pts: &[(f64, f64)]) -> PolyLine {
        PolyLine::must_new(pts.iter().map(|(x, y)| Pt2D::new(*x, *y)).collect())
    }

    pub fn node(map: &mut RoadMap, x: f64, y: f64) -> NodeID {
        map.new_node(Pt2D::new(x, y))
    }

    /// A straight link between two existing nodes.
    pub fn straight(map: &mut RoadMap, src: NodeID, dst: NodeID) -> LinkID {
        let (a, b) = (map.get_n(src).pos, map.get_n(dst).pos);
        map.new_link(src, dst, PolyLine::must_new(vec![a, b])).unwrap()
    }
}
