use std::collections::BTreeMap;

use serde::Serialize;
use slotmap::SlotMap;

use geom::{Bounds, PolyLine, Pt2D, EPSILON_DIST};

use crate::{
    IntersectionType, Link, LinkID, MapConfig, Node, NodeID, Projection, SurfaceType,
    TopologyError,
};

/// Owns every node and link of a network.
///
/// Invariant: every live link's `src` and `dst` are live nodes, and each of those nodes has exactly
/// one connection for that end of the link. `check_consistency` verifies this.
#[derive(Clone, Debug, Serialize)]
pub struct RoadMap {
    pub(crate) nodes: SlotMap<NodeID, Node>,
    pub(crate) links: SlotMap<LinkID, Link>,
    pub projection: Projection,

    #[serde(skip)]
    pub config: MapConfig,
    #[serde(skip)]
    extent: Bounds,
    #[serde(skip)]
    extent_valid: bool,
}

/// Summary counts, for tools that describe a map.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MapStats {
    pub nodes: usize,
    pub links: usize,
    pub nodes_with_lights: usize,
    pub nodes_with_stop_signs: usize,
    pub highway_links: usize,
    pub total_length: f64,
    pub links_per_surface: BTreeMap<SurfaceType, usize>,
}

impl Default for RoadMap {
    fn default() -> RoadMap {
        RoadMap::new(MapConfig::default())
    }
}

impl RoadMap {
    pub fn new(config: MapConfig) -> RoadMap {
        RoadMap {
            nodes: SlotMap::with_key(),
            links: SlotMap::with_key(),
            projection: Projection::default(),
            config,
            extent: Bounds::zero(),
            extent_valid: false,
        }
    }

    /// Delete every node and link. The projection and config survive.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.invalidate_extent();
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = (NodeID, &Node)> {
        self.nodes.iter()
    }

    pub fn all_links(&self) -> impl Iterator<Item = (LinkID, &Link)> {
        self.links.iter()
    }

    pub fn node(&self, id: NodeID) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: LinkID) -> Option<&Link> {
        self.links.get(id)
    }

    /// Panics if the node is gone. Only for IDs just obtained from this map.
    pub fn get_n(&self, id: NodeID) -> &Node {
        &self.nodes[id]
    }

    /// Panics if the link is gone. Only for IDs just obtained from this map.
    pub fn get_l(&self, id: LinkID) -> &Link {
        &self.links[id]
    }

    /// Position, selection and per-connection control can be changed freely; attachments can't.
    pub fn node_mut(&mut self, id: NodeID) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Attributes can be changed freely. The map's extent and the link's sides are recomputed
    /// afterwards.
    pub fn link_mut(&mut self, id: LinkID) -> Option<&mut Link> {
        self.extent_valid = false;
        let link = self.links.get_mut(id)?;
        link.sides = None;
        Some(link)
    }

    pub fn new_node(&mut self, pos: Pt2D) -> NodeID {
        self.invalidate_extent();
        self.nodes.insert(Node::new(pos))
    }

    /// Create a link with default attributes and attach it to both nodes.
    pub fn new_link(
        &mut self,
        src: NodeID,
        dst: NodeID,
        center: PolyLine,
    ) -> Result<LinkID, TopologyError> {
        let link = Link::new(src, dst, center, &self.config.link_defaults);
        self.insert_link(link)
    }

    /// Take ownership of a link built elsewhere and attach it to its nodes.
    pub fn insert_link(&mut self, link: Link) -> Result<LinkID, TopologyError> {
        for node in [link.src(), link.dst()] {
            if !self.nodes.contains_key(node) {
                return Err(TopologyError::UnknownNode(node));
            }
        }
        let (src, dst) = (link.src(), link.dst());
        let id = self.links.insert(link);
        self.nodes[src].add_link(id, true);
        self.nodes[dst].add_link(id, false);
        self.invalidate_extent();
        Ok(id)
    }

    /// Detach a link from both of its nodes, then delete it. The nodes stay, even if they're now
    /// unused.
    pub fn remove_link(&mut self, id: LinkID) -> Result<Link, TopologyError> {
        let link = self
            .links
            .remove(id)
            .ok_or(TopologyError::UnknownLink(id))?;
        if let Some(node) = self.nodes.get_mut(link.src()) {
            node.detach_link(id, true);
        }
        if let Some(node) = self.nodes.get_mut(link.dst()) {
            node.detach_link(id, false);
        }
        self.invalidate_extent();
        Ok(link)
    }

    /// Only nodes with nothing attached can be removed.
    pub fn remove_node(&mut self, id: NodeID) -> Result<Node, TopologyError> {
        let node = self.nodes.get(id).ok_or(TopologyError::UnknownNode(id))?;
        if !node.is_unused() {
            return Err(TopologyError::NodeInUse(id, node.num_links()));
        }
        self.invalidate_extent();
        self.nodes.remove(id).ok_or(TopologyError::UnknownNode(id))
    }

    /// Returns the number of nodes removed.
    pub fn remove_unused_nodes(&mut self) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|_, node| !node.is_unused());
        let removed = before - self.nodes.len();
        if removed > 0 {
            self.invalidate_extent();
        }
        removed
    }

    pub fn find_node_by_id(&self, id: i32) -> Option<NodeID> {
        self.nodes
            .iter()
            .find(|(_, node)| node.id == id)
            .map(|(id, _)| id)
    }

    pub fn find_link_by_id(&self, id: i32) -> Option<LinkID> {
        self.links
            .iter()
            .find(|(_, link)| link.id == id)
            .map(|(id, _)| id)
    }

    /// Which connection of a node leads to the link with some file ID?
    pub fn find_connection_by_link_id(&self, node: NodeID, link_id: i32) -> Option<usize> {
        self.nodes.get(node)?.connections().iter().position(|c| {
            self.links
                .get(c.link)
                .map(|link| link.id == link_id)
                .unwrap_or(false)
        })
    }

    /// The closest node within `epsilon` of a point.
    pub fn find_node_at_point(&self, pt: Pt2D, epsilon: f64) -> Option<NodeID> {
        let search = Bounds::around(pt, epsilon);
        let mut best: Option<(NodeID, f64)> = None;
        for (id, node) in &self.nodes {
            if !search.contains(node.pos) {
                continue;
            }
            let dist = node.pos.dist_to(pt);
            if dist <= epsilon && best.map(|(_, prev)| dist < prev).unwrap_or(true) {
                best = Some((id, dist));
            }
        }
        best.map(|(id, _)| id)
    }

    /// The closest link within `epsilon` of a point.
    pub fn find_closest_link(&self, pt: Pt2D, epsilon: f64) -> Option<LinkID> {
        let mut best: Option<(LinkID, f64)> = None;
        for (id, link) in &self.links {
            let mut search = link.extent();
            search.grow(epsilon);
            if !search.contains(pt) {
                continue;
            }
            let dist = link.distance_to_point(pt, true);
            if dist <= epsilon && best.map(|(_, prev)| dist < prev).unwrap_or(true) {
                best = Some((id, dist));
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn invalidate_extent(&mut self) {
        self.extent_valid = false;
    }

    /// The smallest rectangle around every link's points, or a zero rectangle for a map without
    /// links.
    pub fn get_map_extent(&mut self) -> Bounds {
        if !self.extent_valid {
            self.compute_extents();
        }
        self.extent
    }

    pub fn compute_extents(&mut self) {
        let mut extent = Bounds::new();
        for link in self.links.values_mut() {
            link.compute_extent();
            extent.union(link.extent());
        }
        self.extent = if extent.is_empty() {
            Bounds::zero()
        } else {
            extent
        };
        self.extent_valid = true;
    }

    pub fn determine_link_angles(&mut self, node: NodeID) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.determine_link_angles(&self.links);
        }
    }

    pub fn sort_links_by_angle(&mut self, node: NodeID) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.sort_links_by_angle(&self.links);
        }
    }

    pub fn adjust_for_lights(&mut self, node: NodeID) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.adjust_for_lights(&self.links);
        }
    }

    /// Move a node, dragging the matching end of every attached link along.
    pub fn move_node(&mut self, id: NodeID, pos: Pt2D) -> Result<(), TopologyError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or(TopologyError::UnknownNode(id))?;
        node.pos = pos;
        let attached: Vec<LinkID> = node.connections().iter().map(|c| c.link).collect();
        for link in attached {
            self.enforce_link_endpoints(link);
        }
        self.invalidate_extent();
        Ok(())
    }

    /// Snap a link's first and last points onto its nodes.
    pub fn enforce_link_endpoints(&mut self, id: LinkID) {
        let link = match self.links.get_mut(id) {
            Some(link) => link,
            None => return,
        };
        let mut center = link.center().clone();
        for is_start in [true, false] {
            if let Some(node) = self.nodes.get(link.node(is_start)) {
                center = center.with_end_pt(is_start, node.pos);
            }
        }
        link.set_points(center);
        self.extent_valid = false;
    }

    /// Translate everything.
    pub fn offset(&mut self, dx: f64, dy: f64) {
        for node in self.nodes.values_mut() {
            node.pos = node.pos.offset(dx, dy);
        }
        for link in self.links.values_mut() {
            let moved = link
                .points()
                .iter()
                .map(|pt| pt.offset(dx, dy))
                .collect::<Vec<_>>();
            link.set_points(PolyLine::must_new(moved));
        }
        self.invalidate_extent();
    }

    /// Removes repeated consecutive points from every link. Returns how many points were removed.
    /// Links that would collapse to a single point are left alone; see `remove_degenerate_links`.
    pub fn clean_link_points(&mut self) -> usize {
        let mut removed = 0;
        for link in self.links.values_mut() {
            if let Some((clean, count)) = link.center().dedup(EPSILON_DIST) {
                if count > 0 {
                    link.set_points(clean);
                    removed += count;
                }
            }
        }
        if removed > 0 {
            self.invalidate_extent();
        }
        removed
    }

    /// Removes links that start and end at the same node without going anywhere. Returns how many
    /// were removed.
    pub fn remove_degenerate_links(&mut self) -> usize {
        let degenerate: Vec<LinkID> = self
            .links
            .iter()
            .filter(|(_, link)| {
                link.is_loop()
                    && link
                        .center()
                        .dedup(EPSILON_DIST)
                        .map(|(pl, _)| pl.len() <= 2)
                        .unwrap_or(true)
            })
            .map(|(id, _)| id)
            .collect();
        let mut removed = 0;
        for id in degenerate {
            if self.remove_link(id).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    pub fn stats(&self) -> MapStats {
        let mut stats = MapStats {
            nodes: self.nodes.len(),
            links: self.links.len(),
            ..Default::default()
        };
        for node in self.nodes.values() {
            if node.has_lights() {
                stats.nodes_with_lights += 1;
            } else if node
                .connections()
                .iter()
                .any(|c| c.intersection == IntersectionType::StopSign)
            {
                stats.nodes_with_stop_signs += 1;
            }
        }
        for link in self.links.values() {
            *stats.links_per_surface.entry(link.surface).or_insert(0) += 1;
            if link.is_highway() {
                stats.highway_links += 1;
            }
            stats.total_length += link.length();
        }
        stats
    }

    /// Verify that links and nodes agree about who's attached to whom.
    pub fn check_consistency(&self) -> anyhow::Result<()> {
        for (id, link) in &self.links {
            for is_start in [true, false] {
                let node_id = link.node(is_start);
                let node = match self.nodes.get(node_id) {
                    Some(node) => node,
                    None => bail!("{} refers to missing {}", id, node_id),
                };
                let matches = node
                    .connections()
                    .iter()
                    .filter(|c| c.link == id && c.is_start == is_start)
                    .count();
                if matches != 1 {
                    bail!(
                        "{} has {} connections to {} (is_start {})",
                        node_id,
                        matches,
                        id,
                        is_start
                    );
                }
            }
        }
        for (id, node) in &self.nodes {
            for c in node.connections() {
                match self.links.get(c.link) {
                    Some(link) if link.node(c.is_start) == id => {}
                    _ => bail!("{} has a stale connection to {}", id, c.link),
                }
            }
        }
        Ok(())
    }
}
