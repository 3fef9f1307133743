pub mod link;
pub mod node;
