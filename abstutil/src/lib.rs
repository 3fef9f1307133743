//! Small utilities shared by the road network crates and tools: logging setup, JSON file I/O, and
//! pretty-printing.

mod io;
pub mod logger;
mod utils;

pub use crate::io::{read_json, to_json, write_json};
pub use crate::utils::{basename, prettyprint_usize};
