use geom::{Bounds, Pt2D};

use crate::edit::RoadMapEdit;
use crate::{IntersectionType, LightStatus, LinkID, NodeID, TopologyError};

impl RoadMapEdit {
    /// Replace a link with two halves meeting at `node`: points `[0, idx]` go from the original
    /// start to `node`, and `[idx, end]` from `node` to the original end. Both halves copy every
    /// attribute, and the original ends keep their traffic control. `idx` has to be an interior
    /// vertex. The caller decides where `node` is; usually it's at that vertex.
    pub fn split_link_at_index(
        &mut self,
        link: LinkID,
        idx: usize,
        node: NodeID,
    ) -> Result<(LinkID, LinkID), TopologyError> {
        let orig = self
            .map
            .links
            .get(link)
            .ok_or(TopologyError::UnknownLink(link))?;
        if !self.map.nodes.contains_key(node) {
            return Err(TopologyError::UnknownNode(node));
        }
        let (first, second) = orig
            .center()
            .split_at_index(idx)
            .map_err(|err| TopologyError::InvalidArgument(err.to_string()))?;

        let mut before = orig.clone();
        before.set_node(false, node);
        before.set_points(first);
        let mut after = orig.clone();
        after.set_node(true, node);
        after.set_points(second);

        let (src, dst) = (orig.src(), orig.dst());
        let src_control = self.control_at(src, link, true);
        let dst_control = self.control_at(dst, link, false);

        self.map.remove_link(link)?;
        let before = self.map.insert_link(before)?;
        let after = self.map.insert_link(after)?;
        self.restore_control(src, before, true, src_control);
        self.restore_control(dst, after, false, dst_control);

        debug!("Split {} at vertex {} into {} and {}", link, idx, before, after);
        Ok((before, after))
    }

    /// Like `split_link_at_index`, creating the middle node at that vertex.
    pub fn split_link_at_vertex(
        &mut self,
        link: LinkID,
        idx: usize,
    ) -> Result<(NodeID, LinkID, LinkID), TopologyError> {
        let pts = self
            .map
            .links
            .get(link)
            .ok_or(TopologyError::UnknownLink(link))?
            .points();
        if idx == 0 || idx + 1 >= pts.len() {
            return Err(TopologyError::InvalidArgument(format!(
                "{} has {} points; can't split at {}",
                link,
                pts.len(),
                idx
            )));
        }
        let pos = pts[idx];
        let node = self.map.new_node(pos);
        let (before, after) = self.split_link_at_index(link, idx, node)?;
        Ok((node, before, after))
    }

    /// Move every connection from `old` to `new`, keeping each one's traffic control. `old` is left
    /// with nothing attached. If any of the moved connections had a light, lights at `new` are
    /// reassigned. Link geometry isn't touched.
    pub fn replace_node(&mut self, old: NodeID, new: NodeID) -> Result<(), TopologyError> {
        if old == new {
            return Err(TopologyError::InvalidArgument(format!(
                "can't replace {} with itself",
                old
            )));
        }
        for id in [old, new] {
            if !self.map.nodes.contains_key(id) {
                return Err(TopologyError::UnknownNode(id));
            }
        }

        let moved = self.map.nodes[old].take_connections();
        let had_lights = moved
            .iter()
            .any(|c| c.intersection == IntersectionType::Light);
        for c in moved {
            if let Some(link) = self.map.links.get_mut(c.link) {
                link.set_node(c.is_start, new);
            }
            let n = &mut self.map.nodes[new];
            let idx = n.add_link(c.link, c.is_start);
            n.set_intersect_type(idx, c.intersection);
            n.set_light_status(idx, c.light);
        }
        if had_lights {
            self.map.adjust_for_lights(new);
        }
        self.map.invalidate_extent();
        Ok(())
    }

    /// Collapse every selected node into one new node at their average position. Links running
    /// between two of the merged nodes disappear, the rest are stretched to reach the new node,
    /// and the old nodes are removed. Needs at least two selected nodes.
    pub fn merge_selected_nodes(&mut self) -> Result<NodeID, TopologyError> {
        let selected = self.selected_nodes();
        if selected.len() < 2 {
            return Err(TopologyError::InvalidArgument(format!(
                "merging needs at least 2 selected nodes, not {}",
                selected.len()
            )));
        }
        let positions: Vec<Pt2D> = selected.iter().map(|id| self.map.nodes[*id].pos).collect();
        let existing_loops: Vec<LinkID> = selected
            .iter()
            .flat_map(|id| self.map.nodes[*id].connections())
            .map(|c| c.link)
            .filter(|link| self.map.links.get(*link).map(|l| l.is_loop()).unwrap_or(false))
            .collect();

        let merged = self.map.new_node(Pt2D::center(&positions));
        for id in &selected {
            self.replace_node(*id, merged)?;
        }

        let mut attached: Vec<LinkID> = self.map.nodes[merged]
            .connections()
            .iter()
            .map(|c| c.link)
            .collect();
        attached.sort();
        attached.dedup();
        let mut collapsed = 0;
        for link in attached {
            if self.map.links[link].is_loop() && !existing_loops.contains(&link) {
                self.map.remove_link(link)?;
                collapsed += 1;
            } else {
                self.map.enforce_link_endpoints(link);
            }
        }
        // Each replace_node only saw part of the junction
        if self.map.nodes[merged].has_lights() {
            self.map.adjust_for_lights(merged);
        }
        for id in &selected {
            self.map.remove_node(*id)?;
        }
        self.map.nodes[merged].selected = true;

        debug!(
            "Merged {} nodes into {}, removing {} links between them",
            selected.len(),
            merged,
            collapsed
        );
        Ok(merged)
    }

    /// Remove every selected link, detaching it from its nodes. Returns the extent of each removed
    /// link, for redrawing just those areas.
    pub fn delete_selected(&mut self) -> Vec<Bounds> {
        let mut extents = Vec::new();
        for id in self.selected_links() {
            if let Ok(link) = self.map.remove_link(id) {
                extents.push(link.extent());
            }
        }
        debug!("Deleted {} selected links", extents.len());
        extents
    }

    fn control_at(
        &self,
        node: NodeID,
        link: LinkID,
        is_start: bool,
    ) -> Option<(IntersectionType, LightStatus)> {
        let n = self.map.nodes.get(node)?;
        let idx = n.connection_index(link, is_start)?;
        Some((n.get_intersect_type(idx), n.get_light_status(idx)))
    }

    fn restore_control(
        &mut self,
        node: NodeID,
        link: LinkID,
        is_start: bool,
        control: Option<(IntersectionType, LightStatus)>,
    ) {
        let (intersection, light) = match control {
            Some(pair) => pair,
            None => return,
        };
        if let Some(n) = self.map.nodes.get_mut(node) {
            if let Some(idx) = n.connection_index(link, is_start) {
                n.set_intersect_type(idx, intersection);
                n.set_light_status(idx, light);
            }
        }
    }
}
