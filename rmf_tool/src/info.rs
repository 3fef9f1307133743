use std::io::BufReader;

use anyhow::Result;

use road_map::{read_version, MapConfig, ReadFilter, RoadMap};

pub fn run(path: &str, config: MapConfig) -> Result<()> {
    let version = read_version(BufReader::new(fs_err::File::open(path)?))?;
    let mut map = RoadMap::load_rmf(path, ReadFilter::all(), config)?;
    let extent = map.get_map_extent();
    let stats = map.stats();

    println!("{} (RMF {})", abstutil::basename(path), version);
    if map.projection.is_geographic() {
        println!("  Coordinates are longitude and latitude");
    }
    println!("  Projection: {}", map.projection.to_wkt());
    println!(
        "  Extent: x from {} to {}, y from {} to {}",
        extent.min_x, extent.max_x, extent.min_y, extent.max_y
    );
    println!(
        "  {} nodes, {} with lights, {} with stop signs",
        abstutil::prettyprint_usize(stats.nodes),
        abstutil::prettyprint_usize(stats.nodes_with_lights),
        abstutil::prettyprint_usize(stats.nodes_with_stop_signs)
    );
    println!(
        "  {} links, {} of them highways, {:.1} total length",
        abstutil::prettyprint_usize(stats.links),
        abstutil::prettyprint_usize(stats.highway_links),
        stats.total_length
    );
    for (surface, count) in &stats.links_per_surface {
        println!("    {:?}: {}", surface, abstutil::prettyprint_usize(*count));
    }
    Ok(())
}
