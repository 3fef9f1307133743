use geom::{meters_per_degree_lon, PolyLine, Pt2D, METERS_PER_DEGREE_LAT};

use crate::edit::RoadMapEdit;
use crate::{Link, LinkID};

/// The displayed edges of a link, offset to either side of its center line by the link's width.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkSides {
    pub left: PolyLine,
    pub right: PolyLine,
}

impl RoadMapEdit {
    /// Computed on first use and cached on the link until its geometry, flags or widths change.
    pub fn link_sides(&mut self, id: LinkID) -> Option<&LinkSides> {
        let geographic = self.map.projection.is_geographic();
        let colinear_dot = self.map.config.colinear_dot;
        let max_miter = self.map.config.max_miter;
        let link = self.map.links.get_mut(id)?;
        if link.sides.is_none() {
            link.sides = Some(compute_sides(link, geographic, colinear_dot, max_miter));
        }
        link.sides.as_ref()
    }

    /// Forget every cached side, such as after changing the projection.
    pub fn invalidate_sides(&mut self) {
        for link in self.map.links.values_mut() {
            link.sides = None;
        }
    }
}

fn compute_sides(link: &Link, geographic: bool, colinear_dot: f64, max_miter: f64) -> LinkSides {
    let center = link.center();
    // Meters to map units. Links are short enough that the latitude of one end will do.
    let (scale_x, scale_y) = if geographic {
        let lat = center.first_pt().y();
        (1.0 / meters_per_degree_lon(lat), 1.0 / METERS_PER_DEGREE_LAT)
    } else {
        (1.0, 1.0)
    };
    let left_width = link.left_width() as f64;
    let right_width = link.right_width() as f64;

    let mut left = Vec::with_capacity(center.len());
    let mut right = Vec::with_capacity(center.len());
    for (pt, dir) in center
        .points()
        .iter()
        .zip(center.miter_offsets(colinear_dot, max_miter))
    {
        let unit = Pt2D::new(dir.x() * scale_x, dir.y() * scale_y);
        left.push(*pt + unit * left_width);
        right.push(*pt - unit * right_width);
    }
    LinkSides {
        left: PolyLine::must_new(left),
        right: PolyLine::must_new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::test_util::*;
    use crate::{Projection, RoadMap, FLAG_SIDEWALK};

    fn close(a: Pt2D, b: Pt2D) -> bool {
        a.approx_eq(b, 1e-6)
    }

    #[test]
    fn straight_link_sides() {
        let mut map = RoadMap::default();
        let a = node(&mut map, 0.0, 0.0);
        let b = node(&mut map, 10.0, 0.0);
        let l = straight(&mut map, a, b);
        {
            let link = map.link_mut(l).unwrap();
            link.lanes = 2;
            link.lane_width = 3.0;
            link.set_flags(crate::FLAG_FORWARD | crate::FLAG_REVERSE);
        }
        let mut edit = RoadMapEdit::new(map);
        let sides = edit.link_sides(l).unwrap().clone();
        // Half of 2 lanes * 3m on each side
        assert!(close(sides.left.first_pt(), Pt2D::new(0.0, 3.0)));
        assert!(close(sides.left.last_pt(), Pt2D::new(10.0, 3.0)));
        assert!(close(sides.right.first_pt(), Pt2D::new(0.0, -3.0)));
        assert!(close(sides.right.last_pt(), Pt2D::new(10.0, -3.0)));
    }

    #[test]
    fn corner_keeps_edges_parallel() {
        let mut map = RoadMap::default();
        let a = node(&mut map, 0.0, 0.0);
        let b = node(&mut map, 10.0, 10.0);
        let l = map
            .new_link(a, b, pl(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]))
            .unwrap();
        {
            let link = map.link_mut(l).unwrap();
            link.lanes = 1;
            link.lane_width = 2.0;
            link.set_flags(crate::FLAG_FORWARD);
        }
        let mut edit = RoadMapEdit::new(map);
        let sides = edit.link_sides(l).unwrap();
        // A left turn: the inside corner is pulled in to stay 1m from both segments
        assert!(close(sides.left.points()[1], Pt2D::new(9.0, 1.0)));
        assert!(close(sides.right.points()[1], Pt2D::new(11.0, -1.0)));
    }

    #[test]
    fn cache_is_dropped_on_changes() {
        let mut map = RoadMap::default();
        let a = node(&mut map, 0.0, 0.0);
        let b = node(&mut map, 10.0, 0.0);
        let l = straight(&mut map, a, b);
        let mut edit = RoadMapEdit::new(map);
        let before = edit.link_sides(l).unwrap().clone();

        edit.link_mut(l).unwrap().set_flag(FLAG_SIDEWALK, true);
        assert!(edit.get_l(l).sides.is_none());
        let wider = edit.link_sides(l).unwrap().clone();
        assert!(wider.left.first_pt().y() > before.left.first_pt().y());

        edit.move_node(b, Pt2D::new(10.0, 5.0)).unwrap();
        assert!(edit.get_l(l).sides.is_none());
        let moved = edit.link_sides(l).unwrap();
        assert!(moved.left.last_pt().y() > 5.0);
    }

    #[test]
    fn geographic_widths_become_degrees() {
        let mut map = RoadMap::default();
        map.projection = Projection::Legacy {
            utm: false,
            zone: 0,
            datum: 0,
        };
        let a = node(&mut map, 0.0, 0.0);
        let b = node(&mut map, 0.01, 0.0);
        let l = straight(&mut map, a, b);
        let half = map.get_l(l).left_width() as f64;
        let mut edit = RoadMapEdit::new(map);
        let sides = edit.link_sides(l).unwrap();
        let expected = half / METERS_PER_DEGREE_LAT;
        assert!((sides.left.first_pt().y() - expected).abs() < 1e-12);
    }

    #[test]
    fn missing_link() {
        let mut map = RoadMap::default();
        let a = node(&mut map, 0.0, 0.0);
        let b = node(&mut map, 10.0, 0.0);
        let l = straight(&mut map, a, b);
        map.remove_link(l).unwrap();
        assert!(RoadMapEdit::new(map).link_sides(l).is_none());
    }
}
