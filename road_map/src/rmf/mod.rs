//! The RMF ("road map file") binary format. All numbers are little-endian. Versions 1.7 through
//! 2.0 can be read; 2.0 is always written.
//!
//! Layout, after the 11-byte `RMFFile<version>` header: projection, extent, node and link counts,
//! `Nodes:` and one record per node, `Roads:` and one record per link, `Traffic:` and the control
//! of every node's connections, then an `End RMF` trailer. Nodes and links refer to each other by
//! ID. The writer numbers densely from 1; the reader keys on whatever IDs the node records carry.

mod reader;
mod version;
mod writer;

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, BufWriter, Read, Write};

use anyhow::{Context, Result};

use geom::PolyLine;

use crate::{Link, MapConfig, NodeID, ReadFilter, RoadMap};
use reader::RmfReader;
pub use version::FormatVersion;
pub use writer::write_map;

const NODES_MARKER: &[u8] = b"Nodes:\0";
const ROADS_MARKER: &[u8] = b"Roads:\0";
const TRAFFIC_MARKER: &[u8] = b"Traffic:\0";
const END_MARKER: &[u8] = b"End RMF\0";

// Counts come from the file, so don't trust them for allocation.
const PREALLOCATE_LIMIT: usize = 1 << 16;

/// Parse a whole RMF stream into a new map. Links rejected by `filter` are skipped, though their
/// nodes are kept.
pub fn read_map<R: Read>(input: R, filter: ReadFilter, config: MapConfig) -> Result<RoadMap> {
    let mut r = RmfReader::new(input)?;
    let version = r.version;
    let mut map = RoadMap::new(config);

    map.projection = r.projection().context("reading the projection")?;
    // The extent is always recalculated from the links
    r.extent().context("reading the extent")?;
    let num_nodes = r.count("node")?;
    let num_links = r.count("link")?;

    r.marker(NODES_MARKER)?;
    // Keyed by the ID stored in each node record
    let mut nodes: BTreeMap<i32, NodeID> = BTreeMap::new();
    for _ in 0..num_nodes {
        let id = r.i32()?;
        let pos = r.coord()?;
        if nodes.contains_key(&id) {
            bail!("node {} appears twice", id);
        }
        let node = map.new_node(pos);
        map.nodes[node].id = id;
        nodes.insert(id, node);
    }
    let lookup = |file_id: i32| -> Result<NodeID> {
        nodes
            .get(&file_id)
            .cloned()
            .ok_or_else(|| anyhow!("reference to node {}, which wasn't read", file_id))
    };

    r.marker(ROADS_MARKER)?;
    // File IDs of links the filter rejected
    let mut skipped = BTreeSet::new();
    for _ in 0..num_links {
        let id = r.i32()?;
        let highway = r.i32()?;
        let width = r.f32()?;
        let lanes = r.i32()?;
        let surface = r.surface()?;
        let mut flags = r.link_flags()?;
        let widths = r.link_widths(&map.config.link_defaults)?;
        let num_pts = r.count("point")?;
        let mut pts = Vec::with_capacity(num_pts.min(PREALLOCATE_LIMIT));
        for _ in 0..num_pts {
            pts.push(r.coord()?);
        }
        let center = PolyLine::new(pts).with_context(|| format!("link {}", id))?;
        let src = lookup(r.i32()?).with_context(|| format!("link {}", id))?;
        let dst = lookup(r.i32()?).with_context(|| format!("link {}", id))?;

        if flags & (crate::FLAG_FORWARD | crate::FLAG_REVERSE) == 0 {
            warn!("Link {} has no direction flags; making it two-way", id);
            flags |= crate::FLAG_FORWARD | crate::FLAG_REVERSE;
        }

        let mut link = Link::new(src, dst, center, &map.config.link_defaults);
        link.id = id;
        link.highway = highway;
        link.width = width;
        link.lanes = lanes;
        link.surface = surface;
        link.set_flags(flags);
        link.sidewalk_width = widths.sidewalk;
        link.curb_height = widths.curb_height;
        link.margin_width = widths.margin;
        link.lane_width = widths.lane;
        link.parking_width = widths.parking;

        if !filter.accepts(&link) {
            skipped.insert(id);
            continue;
        }
        map.insert_link(link)?;
    }

    r.marker(TRAFFIC_MARKER)?;
    for _ in 0..num_nodes {
        let node = lookup(r.i32()?).context("traffic section")?;
        let _reserved = r.i32()?;
        let num_entries = r.count("traffic entry")?;
        let mut claimed: Vec<usize> = Vec::new();
        for _ in 0..num_entries {
            let link_id = r.i32()?;
            let intersection = r.intersection_type()?;
            let light = r.light_status()?;
            if skipped.contains(&link_id) {
                continue;
            }

            // A loop is attached twice; give each entry its own connection.
            let idx = map.nodes[node].connections().iter().enumerate().position(|(idx, c)| {
                !claimed.contains(&idx)
                    && map.links.get(c.link).map(|l| l.id == link_id).unwrap_or(false)
            });
            match idx {
                Some(idx) => {
                    claimed.push(idx);
                    let n = &mut map.nodes[node];
                    n.set_intersect_type(idx, intersection);
                    n.set_light_status(idx, light);
                }
                None => {
                    warn!(
                        "Traffic control for link {} at node {}, but it's not attached there",
                        link_id, map.nodes[node].id
                    );
                }
            }
        }
    }

    // Older tools sometimes left off the trailer; everything before it is still usable.
    if r.marker(END_MARKER).is_err() {
        warn!("RMF file is missing its End RMF trailer; it may be truncated");
    }

    info!(
        "Read RMF {}: {} nodes, {} links ({} filtered out)",
        version,
        map.num_nodes(),
        map.num_links(),
        skipped.len()
    );
    map.compute_extents();
    Ok(map)
}

/// Just check the header of an RMF stream.
pub fn read_version<R: Read>(input: R) -> Result<FormatVersion> {
    Ok(RmfReader::new(input)?.version)
}

impl RoadMap {
    /// Load a map from an RMF file.
    pub fn load_rmf(path: &str, filter: ReadFilter, config: MapConfig) -> Result<RoadMap> {
        let file = fs_err::File::open(path)?;
        read_map(BufReader::new(file), filter, config).with_context(|| format!("reading {}", path))
    }

    /// Replace this map's contents with an RMF file. On failure, the map is left empty.
    pub fn read_rmf(&mut self, path: &str, filter: ReadFilter) -> Result<()> {
        self.clear();
        let loaded = RoadMap::load_rmf(path, filter, self.config.clone())?;
        *self = loaded;
        Ok(())
    }

    /// Write this map as RMF 2.0. Node and link IDs are renumbered from 1 as a side effect. Fails
    /// for a map without nodes.
    pub fn write_rmf(&mut self, path: &str) -> Result<()> {
        if self.num_nodes() == 0 {
            bail!("Not writing {}; the map has no nodes", path);
        }
        let file = fs_err::File::create(path)?;
        let mut out = BufWriter::new(file);
        write_map(self, &mut out).with_context(|| format!("writing {}", path))?;
        out.flush()?;
        info!(
            "Wrote {}: {} nodes, {} links",
            path,
            self.num_nodes(),
            self.num_links()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use geom::Pt2D;

    use super::*;
    use crate::{
        IntersectionType, LightStatus, Projection, SurfaceType, FLAG_FORWARD, FLAG_PARKING,
        FLAG_SIDEWALK,
    };

    fn pl(pts: &[(f64, f64)]) -> PolyLine {
        PolyLine::must_new(pts.iter().map(|(x, y)| Pt2D::new(*x, *y)).collect())
    }

    fn sample_map() -> RoadMap {
        let mut map = RoadMap::default();
        map.projection = Projection::Wkt("PROJCS[\"test\"]".to_string());
        let a = map.new_node(Pt2D::new(0.125, 0.5));
        let b = map.new_node(Pt2D::new(100.0, 0.0));
        let c = map.new_node(Pt2D::new(100.0, 75.3));
        let l1 = map
            .new_link(a, b, pl(&[(0.125, 0.5), (50.0, -1.0 / 3.0), (100.0, 0.0)]))
            .unwrap();
        let l2 = map.new_link(b, c, pl(&[(100.0, 0.0), (100.0, 75.3)])).unwrap();
        {
            let link = map.link_mut(l1).unwrap();
            link.highway = 520;
            link.lanes = 4;
            link.width = 14.5;
            link.surface = SurfaceType::Paved;
            link.set_flags(FLAG_FORWARD | FLAG_SIDEWALK | FLAG_PARKING);
            link.sidewalk_width = 2.25;
            link.curb_height = 0.2;
            link.margin_width = 0.75;
            link.lane_width = 3.5;
            link.parking_width = 2.0;
        }
        map.link_mut(l2).unwrap().surface = SurfaceType::Gravel;
        let node = map.node_mut(b).unwrap();
        node.set_intersect_type(0, IntersectionType::Light);
        node.set_light_status(0, LightStatus::Red);
        node.set_intersect_type(1, IntersectionType::StopSign);
        map
    }

    fn to_bytes(map: &mut RoadMap) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_map(map, &mut bytes).unwrap();
        bytes
    }

    #[test]
    fn round_trip_in_memory() {
        let mut map = sample_map();
        let bytes = to_bytes(&mut map);
        assert_eq!(&bytes[..11], b"RMFFile2.0\0");
        assert!(bytes.ends_with(b"End RMF\0"));

        let copy = read_map(&bytes[..], ReadFilter::all(), MapConfig::default()).unwrap();
        copy.check_consistency().unwrap();
        assert_eq!(copy.num_nodes(), 3);
        assert_eq!(copy.num_links(), 2);
        assert_eq!(copy.projection, map.projection);

        for (_, orig) in map.all_nodes() {
            let id = copy.find_node_by_id(orig.id).unwrap();
            assert_eq!(copy.get_n(id).pos, orig.pos);
            assert_eq!(copy.get_n(id).connections().len(), orig.connections().len());
        }
        for (_, orig) in map.all_links() {
            let link = copy.get_l(copy.find_link_by_id(orig.id).unwrap());
            assert_eq!(link, orig);
            assert_eq!(link.points(), orig.points());
            assert_eq!(link.sidewalk_width, orig.sidewalk_width);
            assert_eq!(link.curb_height, orig.curb_height);
            assert_eq!(link.margin_width, orig.margin_width);
            assert_eq!(link.lane_width, orig.lane_width);
            assert_eq!(link.parking_width, orig.parking_width);
            assert_eq!(copy.get_n(link.src()).id, map.get_n(orig.src()).id);
            assert_eq!(copy.get_n(link.dst()).id, map.get_n(orig.dst()).id);
        }

        let b = copy.find_node_by_id(2).unwrap();
        let node = copy.get_n(b);
        assert_eq!(node.get_intersect_type(0), IntersectionType::Light);
        assert_eq!(node.get_light_status(0), LightStatus::Red);
        assert_eq!(node.get_intersect_type(1), IntersectionType::StopSign);
    }

    #[test]
    fn writing_renumbers_from_one() {
        let mut map = sample_map();
        to_bytes(&mut map);
        let mut node_ids: Vec<i32> = map.all_nodes().map(|(_, n)| n.id).collect();
        node_ids.sort();
        assert_eq!(node_ids, vec![1, 2, 3]);
        let mut link_ids: Vec<i32> = map.all_links().map(|(_, l)| l.id).collect();
        link_ids.sort();
        assert_eq!(link_ids, vec![1, 2]);
    }

    #[test]
    fn filters() {
        let mut map = sample_map();
        let bytes = to_bytes(&mut map);
        let no_highways = ReadFilter {
            highway: false,
            ..ReadFilter::all()
        };
        let copy = read_map(&bytes[..], no_highways, MapConfig::default()).unwrap();
        assert_eq!(copy.num_links(), 1);
        assert_eq!(copy.num_nodes(), 3);
        copy.check_consistency().unwrap();

        let no_dirt = ReadFilter {
            dirt: false,
            ..ReadFilter::all()
        };
        let copy = read_map(&bytes[..], no_dirt, MapConfig::default()).unwrap();
        assert_eq!(copy.num_links(), 1);
        assert!(copy.get_l(copy.all_links().next().unwrap().0).is_highway());

        let nothing = ReadFilter {
            highway: false,
            paved: false,
            dirt: false,
        };
        let copy = read_map(&bytes[..], nothing, MapConfig::default()).unwrap();
        assert_eq!(copy.num_links(), 0);
    }

    #[test]
    fn structural_errors() {
        let mut map = sample_map();
        let bytes = to_bytes(&mut map);

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(read_map(&bad_magic[..], ReadFilter::all(), MapConfig::default()).is_err());

        let mut future = bytes.clone();
        future[..11].copy_from_slice(b"RMFFile3.0\0");
        let err = read_map(&future[..], ReadFilter::all(), MapConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unsupported"));

        // Chop the file in the middle of the links
        let truncated = &bytes[..bytes.len() / 2];
        assert!(read_map(truncated, ReadFilter::all(), MapConfig::default()).is_err());
    }

    #[test]
    fn missing_trailer_is_tolerated() {
        let mut map = sample_map();
        let bytes = to_bytes(&mut map);
        let without = &bytes[..bytes.len() - END_MARKER.len()];
        let copy = read_map(without, ReadFilter::all(), MapConfig::default()).unwrap();
        assert_eq!(copy.num_links(), 2);
    }

    #[test]
    fn empty_maps_arent_written() {
        let mut map = RoadMap::default();
        let path = std::env::temp_dir().join("road_map_empty.rmf");
        assert!(map.write_rmf(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn failed_read_leaves_map_empty() {
        let mut map = sample_map();
        assert!(map
            .read_rmf("/definitely/not/a/real/file.rmf", ReadFilter::all())
            .is_err());
        assert_eq!(map.num_nodes(), 0);
        assert_eq!(map.num_links(), 0);
    }
}
