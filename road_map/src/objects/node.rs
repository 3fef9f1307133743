use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use geom::{Angle, Pt2D};

use crate::{Link, LinkID};

/// Traffic control where one link meets a node. The discriminants are the RMF encoding.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum IntersectionType {
    None = 0,
    Light = 1,
    StopSign = 2,
}

impl IntersectionType {
    pub fn from_i32(x: i32) -> Option<IntersectionType> {
        match x {
            0 => Some(IntersectionType::None),
            1 => Some(IntersectionType::Light),
            2 => Some(IntersectionType::StopSign),
            _ => None,
        }
    }
}

/// The discriminants are the RMF encoding, so the order matters.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum LightStatus {
    Invalid = 0,
    Red = 1,
    Yellow = 2,
    Green = 3,
}

impl LightStatus {
    pub fn from_i32(x: i32) -> Option<LightStatus> {
        match x {
            0 => Some(LightStatus::Invalid),
            1 => Some(LightStatus::Red),
            2 => Some(LightStatus::Yellow),
            3 => Some(LightStatus::Green),
            _ => None,
        }
    }
}

/// How a whole intersection looks, summarizing the control on each of its links.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum VisualIntersectionType {
    /// Nothing attached
    Unknown,
    Uncontrolled,
    AllLights,
    /// Some links have lights, others don't
    Lights,
    AllStopSigns,
    /// Some links have stop signs, none have lights
    StopSigns,
}

/// One end of one link, attached to a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinkConnect {
    pub link: LinkID,
    /// Is the node at the start (first point) of the link?
    pub is_start: bool,
    pub intersection: IntersectionType,
    pub light: LightStatus,
    /// Radians in [0, 2pi) from the node towards the link. Only meaningful after
    /// `determine_link_angles`.
    #[serde(skip)]
    pub angle: f64,
}

/// A vertex of the network. Connections are ordered; several operations refer to them by index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Only meaningful while reading or right after writing a file.
    pub id: i32,
    pub pos: Pt2D,
    connections: Vec<LinkConnect>,
    #[serde(skip)]
    pub selected: bool,
}

impl Node {
    pub fn new(pos: Pt2D) -> Node {
        Node {
            id: 0,
            pos,
            connections: Vec::new(),
            selected: false,
        }
    }

    pub fn connections(&self) -> &[LinkConnect] {
        &self.connections
    }

    pub fn num_links(&self) -> usize {
        self.connections.len()
    }

    /// No links attached; `RoadMap::remove_unused_nodes` will delete this.
    pub fn is_unused(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn get_link(&self, idx: usize) -> Option<LinkID> {
        self.connections.get(idx).map(|c| c.link)
    }

    /// Attach one end of a link. Attaching the same end twice returns the existing connection.
    pub(crate) fn add_link(&mut self, link: LinkID, is_start: bool) -> usize {
        if let Some(idx) = self.connection_index(link, is_start) {
            return idx;
        }
        self.connections.push(LinkConnect {
            link,
            is_start,
            intersection: IntersectionType::None,
            light: LightStatus::Invalid,
            angle: 0.0,
        });
        self.connections.len() - 1
    }

    /// Returns false if that end of the link wasn't attached here.
    pub(crate) fn detach_link(&mut self, link: LinkID, is_start: bool) -> bool {
        if let Some(idx) = self.connection_index(link, is_start) {
            self.connections.remove(idx);
            true
        } else {
            false
        }
    }

    pub(crate) fn take_connections(&mut self) -> Vec<LinkConnect> {
        std::mem::take(&mut self.connections)
    }

    pub(crate) fn connection_mut(&mut self, idx: usize) -> Option<&mut LinkConnect> {
        self.connections.get_mut(idx)
    }

    pub fn connection_index(&self, link: LinkID, is_start: bool) -> Option<usize> {
        self.connections
            .iter()
            .position(|c| c.link == link && c.is_start == is_start)
    }

    /// The first connection to either end of a link.
    pub fn connection_to(&self, link: LinkID) -> Option<usize> {
        self.connections.iter().position(|c| c.link == link)
    }

    /// Recalculates every connection's angle, from this node towards the neighboring vertex of the
    /// link.
    pub fn determine_link_angles(&mut self, links: &SlotMap<LinkID, Link>) {
        let pos = self.pos;
        for c in &mut self.connections {
            if let Some(link) = links.get(c.link) {
                c.angle = pos.angle_to(link.next_to_end(c.is_start)).normalized_radians();
            }
        }
    }

    /// Orders connections counter-clockwise, starting from the positive x axis. Ties keep their
    /// previous order.
    pub fn sort_links_by_angle(&mut self, links: &SlotMap<LinkID, Link>) {
        self.determine_link_angles(links);
        self.connections.sort_by(|a, b| a.angle.total_cmp(&b.angle));
    }

    /// The cached angle of a connection.
    pub fn link_angle(&self, idx: usize) -> Option<f64> {
        self.connections.get(idx).map(|c| c.angle)
    }

    /// Returns false for an out-of-range index.
    pub fn set_intersect_type(&mut self, idx: usize, intersection: IntersectionType) -> bool {
        match self.connections.get_mut(idx) {
            Some(c) => {
                c.intersection = intersection;
                true
            }
            None => false,
        }
    }

    pub fn get_intersect_type(&self, idx: usize) -> IntersectionType {
        self.connections
            .get(idx)
            .map(|c| c.intersection)
            .unwrap_or(IntersectionType::None)
    }

    pub fn set_light_status(&mut self, idx: usize, light: LightStatus) -> bool {
        match self.connections.get_mut(idx) {
            Some(c) => {
                c.light = light;
                true
            }
            None => false,
        }
    }

    pub fn get_light_status(&self, idx: usize) -> LightStatus {
        self.connections
            .get(idx)
            .map(|c| c.light)
            .unwrap_or(LightStatus::Invalid)
    }

    pub fn has_lights(&self) -> bool {
        self.connections
            .iter()
            .any(|c| c.intersection == IntersectionType::Light)
    }

    pub fn is_controlled(&self) -> bool {
        self.connections
            .iter()
            .any(|c| c.intersection != IntersectionType::None)
    }

    pub fn visual_intersection_type(&self) -> VisualIntersectionType {
        if self.connections.is_empty() {
            return VisualIntersectionType::Unknown;
        }
        let count = |it: IntersectionType| {
            self.connections
                .iter()
                .filter(|c| c.intersection == it)
                .count()
        };
        let lights = count(IntersectionType::Light);
        let stop_signs = count(IntersectionType::StopSign);
        let total = self.connections.len();

        if lights == total {
            VisualIntersectionType::AllLights
        } else if lights > 0 {
            VisualIntersectionType::Lights
        } else if stop_signs == total {
            VisualIntersectionType::AllStopSigns
        } else if stop_signs > 0 {
            VisualIntersectionType::StopSigns
        } else {
            VisualIntersectionType::Uncontrolled
        }
    }

    /// If any link here has a light, every link gets one. Three- and four-way intersections then
    /// get a two-phase assignment: the pair of links closest to directly opposite each other is
    /// red, the rest are green. Two-way and dead-end nodes keep their existing colors.
    pub fn adjust_for_lights(&mut self, links: &SlotMap<LinkID, Link>) {
        if !self.has_lights() {
            return;
        }
        for c in &mut self.connections {
            c.intersection = IntersectionType::Light;
        }

        let degree = self.connections.len();
        if degree < 3 {
            return;
        }
        for c in &mut self.connections {
            c.light = LightStatus::Green;
        }
        if degree > 4 {
            return;
        }

        self.sort_links_by_angle(links);
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..degree {
            for j in (i + 1)..degree {
                let separation = Angle::new_rads(self.connections[i].angle)
                    .separation(Angle::new_rads(self.connections[j].angle));
                let off_by = (PI - separation).abs();
                if best.map(|(_, _, prev)| off_by < prev).unwrap_or(true) {
                    best = Some((i, j, off_by));
                }
            }
        }
        if let Some((i, j, _)) = best {
            self.connections[i].light = LightStatus::Red;
            self.connections[j].light = LightStatus::Red;
        }
    }
}

#[cfg(test)]
mod tests {
    use geom::PolyLine;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    use super::*;
    use crate::{LinkDefaults, NodeID};

    /// A node at the origin with one straight link heading out at each angle.
    fn star(degrees: &[f64]) -> (Node, SlotMap<LinkID, Link>) {
        let rads: Vec<f64> = degrees.iter().map(|deg| deg.to_radians()).collect();
        star_rads(&rads)
    }

    fn star_rads(rads: &[f64]) -> (Node, SlotMap<LinkID, Link>) {
        let mut nodes: SlotMap<NodeID, ()> = SlotMap::with_key();
        let center = nodes.insert(());
        let mut links = SlotMap::with_key();
        let mut node = Node::new(Pt2D::ZERO);
        for rad in rads {
            let (sin, cos) = rad.sin_cos();
            let far = nodes.insert(());
            let id = links.insert(Link::new(
                center,
                far,
                PolyLine::must_new(vec![Pt2D::ZERO, Pt2D::new(10.0 * cos, 10.0 * sin)]),
                &LinkDefaults::default(),
            ));
            node.add_link(id, true);
        }
        (node, links)
    }

    #[test]
    fn add_and_detach() {
        let (mut node, links) = star(&[0.0, 90.0]);
        let ids: Vec<LinkID> = links.keys().collect();
        assert_eq!(node.num_links(), 2);
        assert_eq!(node.add_link(ids[0], true), 0);
        assert_eq!(node.num_links(), 2);

        // Wrong end
        assert!(!node.detach_link(ids[0], false));
        assert!(node.detach_link(ids[0], true));
        assert_eq!(node.num_links(), 1);
        assert_eq!(node.get_link(0), Some(ids[1]));
        assert_eq!(node.get_link(5), None);
    }

    #[test]
    fn angles_are_normalized() {
        let (mut node, links) = star(&[270.0, 45.0, 180.0]);
        node.determine_link_angles(&links);
        assert!((node.link_angle(0).unwrap() - 1.5 * PI).abs() < 1e-9);
        node.sort_links_by_angle(&links);
        let sorted: Vec<f64> = (0..3)
            .map(|i| node.link_angle(i).unwrap().to_degrees().round())
            .collect();
        assert_eq!(sorted, vec![45.0, 180.0, 270.0]);
        assert_eq!(node.link_angle(3), None);
    }

    #[test]
    fn out_of_range_control_is_ignored() {
        let (mut node, _) = star(&[0.0]);
        assert!(!node.set_intersect_type(1, IntersectionType::Light));
        assert_eq!(node.get_intersect_type(1), IntersectionType::None);
        assert!(!node.set_light_status(3, LightStatus::Red));
        assert_eq!(node.get_light_status(3), LightStatus::Invalid);
    }

    #[test]
    fn visual_type() {
        let (mut node, _) = star(&[0.0, 120.0, 240.0]);
        assert_eq!(
            node.visual_intersection_type(),
            VisualIntersectionType::Uncontrolled
        );
        assert!(!node.is_controlled());

        node.set_intersect_type(0, IntersectionType::StopSign);
        assert_eq!(
            node.visual_intersection_type(),
            VisualIntersectionType::StopSigns
        );
        node.set_intersect_type(1, IntersectionType::StopSign);
        node.set_intersect_type(2, IntersectionType::StopSign);
        assert_eq!(
            node.visual_intersection_type(),
            VisualIntersectionType::AllStopSigns
        );
        node.set_intersect_type(1, IntersectionType::Light);
        assert_eq!(node.visual_intersection_type(), VisualIntersectionType::Lights);
        assert!(node.has_lights());

        assert_eq!(
            Node::new(Pt2D::ZERO).visual_intersection_type(),
            VisualIntersectionType::Unknown
        );
    }

    #[test]
    fn four_way_lights_pair_the_most_opposite_links() {
        let (mut node, links) = star(&[90.0, 0.0, 180.0, 80.0]);
        node.set_intersect_type(0, IntersectionType::Light);
        node.adjust_for_lights(&links);

        assert_eq!(
            node.visual_intersection_type(),
            VisualIntersectionType::AllLights
        );
        for c in node.connections() {
            let deg = c.angle.to_degrees().round();
            let expected = if deg == 0.0 || deg == 180.0 {
                LightStatus::Red
            } else {
                LightStatus::Green
            };
            assert_eq!(c.light, expected, "link at {} degrees", deg);
        }
    }

    #[test]
    fn three_way_lights() {
        // A T junction; the through road is red
        let (mut node, links) = star(&[350.0, 90.0, 175.0]);
        node.set_intersect_type(2, IntersectionType::Light);
        node.adjust_for_lights(&links);
        let reds: Vec<f64> = node
            .connections()
            .iter()
            .filter(|c| c.light == LightStatus::Red)
            .map(|c| c.angle.to_degrees().round())
            .collect();
        assert_eq!(reds, vec![175.0, 350.0]);
    }

    #[test]
    fn two_way_lights_keep_their_colors() {
        let (mut node, links) = star(&[0.0, 180.0]);
        node.set_intersect_type(1, IntersectionType::Light);
        node.set_light_status(0, LightStatus::Yellow);
        node.adjust_for_lights(&links);
        assert_eq!(node.get_intersect_type(0), IntersectionType::Light);
        assert_eq!(node.get_light_status(0), LightStatus::Yellow);
        assert_eq!(node.get_light_status(1), LightStatus::Invalid);
    }

    #[test]
    fn no_lights_no_changes() {
        let (mut node, links) = star(&[0.0, 90.0, 180.0, 270.0]);
        node.set_intersect_type(0, IntersectionType::StopSign);
        node.adjust_for_lights(&links);
        assert_eq!(node.get_intersect_type(0), IntersectionType::StopSign);
        assert_eq!(node.get_intersect_type(1), IntersectionType::None);
        assert!(node
            .connections()
            .iter()
            .all(|c| c.light == LightStatus::Invalid));
    }

    /// Compare the red pair against every possible pair.
    fn check_light_pairing(node: &Node) {
        let conns = node.connections();
        let off_by = |i: usize, j: usize| {
            let separation =
                Angle::new_rads(conns[i].angle).separation(Angle::new_rads(conns[j].angle));
            (PI - separation).abs()
        };
        let mut best = f64::MAX;
        for i in 0..conns.len() {
            for j in (i + 1)..conns.len() {
                best = best.min(off_by(i, j));
            }
        }

        let reds: Vec<usize> = (0..conns.len())
            .filter(|i| conns[*i].light == LightStatus::Red)
            .collect();
        assert_eq!(reds.len(), 2, "{:?}", conns);
        assert!(off_by(reds[0], reds[1]) - best <= 1e-12, "{:?}", conns);
        for c in conns {
            assert_eq!(c.intersection, IntersectionType::Light);
            assert!(c.light == LightStatus::Red || c.light == LightStatus::Green);
        }
    }

    #[test]
    fn random_lights_pair_the_most_opposite_links() {
        let mut rng = XorShiftRng::from_seed([42; 16]);
        for _ in 0..500 {
            let degree = rng.gen_range(3..=4);
            let rads: Vec<f64> = (0..degree).map(|_| rng.gen_range(0.0..2.0 * PI)).collect();
            let (mut node, links) = star_rads(&rads);
            node.set_intersect_type(rng.gen_range(0..degree), IntersectionType::Light);
            node.adjust_for_lights(&links);
            check_light_pairing(&node);
        }
    }

    #[test]
    fn nearly_opposite_pairs() {
        for ulps in 1..=4 {
            let above = f64::from_bits(PI.to_bits() + ulps);
            let below = f64::from_bits(PI.to_bits() - ulps);
            for rads in [
                vec![0.3, 0.3 + above, 2.0],
                vec![0.3, 0.3 + below, 2.0],
                vec![0.3, 0.3 + above, 2.0, 2.0 + below],
                vec![0.3, 0.3 + below, 2.0, 2.0 + above],
            ] {
                let (mut node, links) = star_rads(&rads);
                node.set_intersect_type(0, IntersectionType::Light);
                node.adjust_for_lights(&links);
                check_light_pairing(&node);
            }
        }
    }
}
