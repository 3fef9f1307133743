//! Command-line tools for inspecting and batch-editing RMF road map files.

#[macro_use]
extern crate log;

mod info;

use anyhow::Result;
use structopt::StructOpt;

use road_map::{MapConfig, ReadFilter, RoadMap};

#[derive(StructOpt)]
#[structopt(name = "rmf_tool", about = "Inspect and batch-edit RMF road maps")]
struct Args {
    /// A JSON file overriding some of the default map settings
    #[structopt(long)]
    config: Option<String>,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Describe an RMF file: version, projection, extent and what's in it
    Info {
        #[structopt()]
        path: String,
    },
    /// Print an RMF file as JSON
    DumpJSON {
        #[structopt()]
        path: String,
    },
    /// Remove repeated points, links that go nowhere, and nodes with nothing attached
    Clean {
        #[structopt(long)]
        input: String,
        #[structopt(long)]
        output: String,
    },
    /// Copy an RMF file, leaving out some kinds of links
    Filter {
        #[structopt(long)]
        input: String,
        #[structopt(long)]
        output: String,
        /// Leave out links with a highway number
        #[structopt(long)]
        no_highway: bool,
        /// Leave out paved links
        #[structopt(long)]
        no_paved: bool,
        /// Leave out gravel, trails, two-track and dirt links
        #[structopt(long)]
        no_dirt: bool,
    },
    /// At every intersection with a light, put every link on the light and reassign the phases
    Signalize {
        #[structopt(long)]
        input: String,
        #[structopt(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    let args = Args::from_args();

    // The JSON dump goes to STDOUT, so keep it clean
    if !matches!(args.cmd, Command::DumpJSON { .. }) {
        abstutil::logger::setup();
    }

    let config: MapConfig = match args.config {
        Some(ref path) => abstutil::read_json(path)?,
        None => MapConfig::default(),
    };

    match args.cmd {
        Command::Info { path } => info::run(&path, config)?,
        Command::DumpJSON { path } => {
            let map = RoadMap::load_rmf(&path, ReadFilter::all(), config)?;
            println!("{}", abstutil::to_json(&map)?);
        }
        Command::Clean { input, output } => clean(&input, &output, config)?,
        Command::Filter {
            input,
            output,
            no_highway,
            no_paved,
            no_dirt,
        } => {
            let filter = ReadFilter {
                highway: !no_highway,
                paved: !no_paved,
                dirt: !no_dirt,
            };
            let mut map = RoadMap::load_rmf(&input, filter, config)?;
            let unused = map.remove_unused_nodes();
            info!("Removed {} nodes left without links", unused);
            map.write_rmf(&output)?;
        }
        Command::Signalize { input, output } => signalize(&input, &output, config)?,
    }
    Ok(())
}

fn clean(input: &str, output: &str, config: MapConfig) -> Result<()> {
    let mut map = RoadMap::load_rmf(input, ReadFilter::all(), config)?;
    let points = map.clean_link_points();
    let links = map.remove_degenerate_links();
    let nodes = map.remove_unused_nodes();
    info!(
        "Cleaned {}: {} repeated points, {} degenerate links, {} unused nodes",
        abstutil::basename(input),
        abstutil::prettyprint_usize(points),
        abstutil::prettyprint_usize(links),
        abstutil::prettyprint_usize(nodes)
    );
    map.write_rmf(output)
}

fn signalize(input: &str, output: &str, config: MapConfig) -> Result<()> {
    let mut map = RoadMap::load_rmf(input, ReadFilter::all(), config)?;
    let with_lights: Vec<_> = map
        .all_nodes()
        .filter(|(_, n)| n.has_lights())
        .map(|(id, _)| id)
        .collect();
    for id in &with_lights {
        map.adjust_for_lights(*id);
    }
    info!(
        "Reassigned lights at {} intersections",
        abstutil::prettyprint_usize(with_lights.len())
    );
    map.write_rmf(output)
}
