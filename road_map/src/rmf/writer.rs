use std::io::Write;

use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};

use geom::Pt2D;

use super::{FormatVersion, END_MARKER, NODES_MARKER, ROADS_MARKER, TRAFFIC_MARKER};
use crate::{LinkID, NodeID, RoadMap};

/// Serialize a map as RMF 2.0. Nodes and then links are renumbered 1, 2, 3... first, so the
/// written references are always dense.
pub fn write_map<W: Write>(map: &mut RoadMap, out: &mut W) -> Result<()> {
    if map.num_nodes() == 0 {
        bail!("can't write a map with no nodes");
    }
    renumber(map);
    let extent = map.get_map_extent();

    out.write_all(&FormatVersion::CURRENT.header())?;
    let wkt = map.projection.to_wkt();
    out.write_i32::<LittleEndian>(len_i32(wkt.len())?)?;
    out.write_all(wkt.as_bytes())?;
    for x in [extent.min_x, extent.max_x, extent.min_y, extent.max_y] {
        out.write_f64::<LittleEndian>(x)?;
    }
    out.write_i32::<LittleEndian>(len_i32(map.num_nodes())?)?;
    out.write_i32::<LittleEndian>(len_i32(map.num_links())?)?;

    out.write_all(NODES_MARKER)?;
    for node in map.nodes.values() {
        out.write_i32::<LittleEndian>(node.id)?;
        write_pt(out, node.pos)?;
    }

    out.write_all(ROADS_MARKER)?;
    for link in map.links.values() {
        out.write_i32::<LittleEndian>(link.id)?;
        out.write_i32::<LittleEndian>(link.highway)?;
        out.write_f32::<LittleEndian>(link.width)?;
        out.write_i32::<LittleEndian>(link.lanes)?;
        out.write_i32::<LittleEndian>(link.surface as i32)?;
        out.write_i32::<LittleEndian>(link.flags() as i32)?;
        for x in [
            link.sidewalk_width,
            link.curb_height,
            link.margin_width,
            link.lane_width,
            link.parking_width,
        ] {
            out.write_f32::<LittleEndian>(x)?;
        }
        out.write_i32::<LittleEndian>(len_i32(link.points().len())?)?;
        for pt in link.points() {
            write_pt(out, *pt)?;
        }
        out.write_i32::<LittleEndian>(map.nodes[link.src()].id)?;
        out.write_i32::<LittleEndian>(map.nodes[link.dst()].id)?;
    }

    out.write_all(TRAFFIC_MARKER)?;
    for node in map.nodes.values() {
        out.write_i32::<LittleEndian>(node.id)?;
        // Reserved
        out.write_i32::<LittleEndian>(0)?;
        out.write_i32::<LittleEndian>(len_i32(node.connections().len())?)?;
        for c in node.connections() {
            out.write_i32::<LittleEndian>(map.links[c.link].id)?;
            out.write_i32::<LittleEndian>(c.intersection as i32)?;
            out.write_i32::<LittleEndian>(c.light as i32)?;
        }
    }

    out.write_all(END_MARKER)?;
    Ok(())
}

fn renumber(map: &mut RoadMap) {
    let nodes: Vec<NodeID> = map.nodes.keys().collect();
    for (idx, id) in nodes.into_iter().enumerate() {
        map.nodes[id].id = idx as i32 + 1;
    }
    let links: Vec<LinkID> = map.links.keys().collect();
    for (idx, id) in links.into_iter().enumerate() {
        map.links[id].id = idx as i32 + 1;
    }
}

fn write_pt<W: Write>(out: &mut W, pt: Pt2D) -> Result<()> {
    out.write_f64::<LittleEndian>(pt.x())?;
    out.write_f64::<LittleEndian>(pt.y())?;
    Ok(())
}

fn len_i32(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| anyhow!("{} is too many to store", len))
}
