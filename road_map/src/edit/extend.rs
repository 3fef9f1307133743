use geom::Angle;

use crate::edit::RoadMapEdit;
use crate::{LinkID, NodeID};

impl RoadMapEdit {
    /// Select a link, then keep selecting the straightest continuation from both of its ends,
    /// following a road through junctions. Returns how many links were newly selected.
    ///
    /// At each node, a link with the same highway number always wins. Otherwise the link turning
    /// the least is taken, as long as it's the same kind of road (highway or not) and, at a real
    /// junction, turns by no more than `MapConfig::extend_max_deviation`. Walking stops at dead
    /// ends and at links that are already selected.
    pub fn select_and_extend_link(&mut self, start: LinkID) -> usize {
        if !self.map.links.contains_key(start) {
            return 0;
        }
        let mut count = 0;
        if !self.map.links[start].selected {
            self.map.links[start].selected = true;
            count += 1;
        }

        for from_start in [true, false] {
            let mut current = start;
            let mut at_start = from_start;
            loop {
                let node = self.map.links[current].node(at_start);
                let (next, next_is_start) =
                    match self.straightest_continuation(current, at_start, node) {
                        Some(pair) => pair,
                        None => break,
                    };
                let link = &mut self.map.links[next];
                if link.selected {
                    break;
                }
                link.selected = true;
                count += 1;
                current = next;
                // Continue from the far end of the new link
                at_start = !next_is_start;
            }
        }
        debug!("Extended selection from {} by {} links", start, count);
        count
    }

    /// Which link continues `current` through `node` most naturally, and which end of it touches
    /// the node?
    fn straightest_continuation(
        &self,
        current: LinkID,
        at_start: bool,
        node: NodeID,
    ) -> Option<(LinkID, bool)> {
        let links = &self.map.links;
        let node = self.map.nodes.get(node)?;
        let incoming = links.get(current)?;
        let heading = node
            .pos
            .angle_to(incoming.next_to_end(at_start))
            .opposite();

        let mut same_number: Option<(LinkID, bool, f64)> = None;
        let mut best: Option<(LinkID, bool, f64)> = None;
        for c in node.connections() {
            if c.link == current {
                continue;
            }
            let candidate = match links.get(c.link) {
                Some(link) => link,
                None => continue,
            };
            let deviation = node
                .pos
                .angle_to(candidate.next_to_end(c.is_start))
                .separation(heading);
            let better = |prev: &Option<(LinkID, bool, f64)>| {
                prev.map(|(_, _, dev)| deviation < dev).unwrap_or(true)
            };

            if incoming.highway > 0 && candidate.highway == incoming.highway && better(&same_number)
            {
                same_number = Some((c.link, c.is_start, deviation));
            }
            if candidate.is_highway() == incoming.is_highway() && better(&best) {
                best = Some((c.link, c.is_start, deviation));
            }
        }

        if let Some((link, is_start, _)) = same_number {
            return Some((link, is_start));
        }
        let (link, is_start, deviation) = best?;
        if node.num_links() > 2
            && deviation > Angle::degrees(self.map.config.extend_max_deviation).normalized_radians()
        {
            return None;
        }
        Some((link, is_start))
    }
}

#[cfg(test)]
mod tests {
    use geom::Pt2D;

    use super::*;
    use crate::edit::test_util::*;
    use crate::RoadMap;

    /// Links fanning out from a center node at (0, 0), each ending at its own node. The first one
    /// comes in from the west.
    fn junction(degrees: &[f64]) -> (RoadMap, Vec<LinkID>) {
        let mut map = RoadMap::default();
        let center = node(&mut map, 0.0, 0.0);
        let west = node(&mut map, -10.0, 0.0);
        let mut links = vec![straight(&mut map, west, center)];
        for deg in degrees {
            let (sin, cos) = deg.to_radians().sin_cos();
            let far = map.new_node(Pt2D::new(10.0 * cos, 10.0 * sin));
            links.push(straight(&mut map, center, far));
        }
        (map, links)
    }

    #[test]
    fn follows_a_chain() {
        let mut map = RoadMap::default();
        let nodes: Vec<NodeID> = (0..5).map(|i| node(&mut map, i as f64 * 10.0, 0.0)).collect();
        let links: Vec<LinkID> = nodes
            .windows(2)
            .map(|pair| straight(&mut map, pair[0], pair[1]))
            .collect();
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[2]), 4);
        assert_eq!(edit.num_selected_links(), 4);
        // Nothing new the second time
        assert_eq!(edit.select_and_extend_link(links[0]), 0);
    }

    #[test]
    fn sharp_turns_only_stop_at_junctions() {
        // Degree 2: even a right angle continues
        let (map, links) = junction(&[90.0]);
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 2);

        // Degree 3: straight ahead wins over the side street
        let (map, links) = junction(&[10.0, 90.0]);
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 2);
        assert!(edit.get_l(links[1]).selected);
        assert!(!edit.get_l(links[2]).selected);

        // Degree 3, nothing within 30 degrees of straight
        let (map, links) = junction(&[60.0, -60.0]);
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 1);
    }

    #[test]
    fn highway_numbers() {
        // The same number wins even around a sharp bend at a junction
        let (mut map, links) = junction(&[0.0, 80.0]);
        map.link_mut(links[0]).unwrap().highway = 7;
        map.link_mut(links[1]).unwrap().highway = 9;
        map.link_mut(links[2]).unwrap().highway = 7;
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 2);
        assert!(edit.get_l(links[2]).selected);
        assert!(!edit.get_l(links[1]).selected);

        // Without a matching number, another highway is fine
        let (mut map, links) = junction(&[0.0, 80.0]);
        map.link_mut(links[0]).unwrap().highway = 7;
        map.link_mut(links[1]).unwrap().highway = 9;
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 2);
        assert!(edit.get_l(links[1]).selected);
    }

    #[test]
    fn highways_and_local_roads_dont_mix() {
        // A highway meeting only a local road at a bend stops
        let (mut map, links) = junction(&[0.0]);
        map.link_mut(links[0]).unwrap().highway = 7;
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 1);

        // A local road skips a straight-ahead highway for a local road within the threshold
        let (mut map, links) = junction(&[0.0, 20.0]);
        map.link_mut(links[1]).unwrap().highway = 7;
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(links[0]), 2);
        assert!(edit.get_l(links[2]).selected);
        assert!(!edit.get_l(links[1]).selected);
    }

    #[test]
    fn loops_terminate() {
        let mut map = RoadMap::default();
        let a = node(&mut map, 0.0, 0.0);
        let b = node(&mut map, 10.0, 0.0);
        let c = node(&mut map, 5.0, 10.0);
        let ab = straight(&mut map, a, b);
        straight(&mut map, b, c);
        straight(&mut map, c, a);
        let mut edit = RoadMapEdit::new(map);
        assert_eq!(edit.select_and_extend_link(ab), 3);
    }
}
