use geom::{Bounds, Pt2D};

use crate::edit::RoadMapEdit;
use crate::{LinkID, NodeID};

impl RoadMapEdit {
    /// Toggle the closest node within `epsilon`. Returns the node, if any was close enough.
    pub fn select_node(&mut self, pt: Pt2D, epsilon: f64) -> Option<NodeID> {
        let id = self.map.find_node_at_point(pt, epsilon)?;
        let node = &mut self.map.nodes[id];
        node.selected = !node.selected;
        Some(id)
    }

    /// Toggle the closest link within `epsilon`.
    pub fn select_link(&mut self, pt: Pt2D, epsilon: f64) -> Option<LinkID> {
        let id = self.map.find_closest_link(pt, epsilon)?;
        let link = &mut self.map.links[id];
        link.selected = !link.selected;
        Some(id)
    }

    /// Set the selection of every node inside `area`. Returns how many nodes matched.
    pub fn select_nodes(&mut self, area: &Bounds, select: bool) -> usize {
        let mut count = 0;
        for node in self.map.nodes.values_mut() {
            if area.contains(node.pos) {
                node.selected = select;
                count += 1;
            }
        }
        count
    }

    /// Set the selection of every link lying entirely inside `area`.
    pub fn select_links(&mut self, area: &Bounds, select: bool) -> usize {
        let mut count = 0;
        for link in self.map.links.values_mut() {
            if area.contains_bounds(&link.extent()) {
                link.selected = select;
                count += 1;
            }
        }
        count
    }

    /// Like `select_links`, but a link only needs one vertex inside `area`.
    pub fn cross_select_links(&mut self, area: &Bounds, select: bool) -> usize {
        let mut count = 0;
        for link in self.map.links.values_mut() {
            if link.points().iter().any(|pt| area.contains(*pt)) {
                link.selected = select;
                count += 1;
            }
        }
        count
    }

    /// Add every link with some highway number to the selection.
    pub fn select_highway(&mut self, number: i32) -> usize {
        let mut count = 0;
        for link in self.map.links.values_mut() {
            if link.highway == number {
                link.selected = true;
                count += 1;
            }
        }
        count
    }

    pub fn deselect_all(&mut self) {
        for node in self.map.nodes.values_mut() {
            node.selected = false;
        }
        for link in self.map.links.values_mut() {
            link.selected = false;
        }
    }

    pub fn invert_selection(&mut self) {
        for node in self.map.nodes.values_mut() {
            node.selected = !node.selected;
        }
        for link in self.map.links.values_mut() {
            link.selected = !link.selected;
        }
    }

    pub fn num_selected_nodes(&self) -> usize {
        self.map.nodes.values().filter(|n| n.selected).count()
    }

    pub fn num_selected_links(&self) -> usize {
        self.map.links.values().filter(|l| l.selected).count()
    }

    pub fn selected_nodes(&self) -> Vec<NodeID> {
        self.map
            .nodes
            .iter()
            .filter(|(_, n)| n.selected)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn selected_links(&self) -> Vec<LinkID> {
        self.map
            .links
            .iter()
            .filter(|(_, l)| l.selected)
            .map(|(id, _)| id)
            .collect()
    }
}
