use crate::{LinkID, NodeID};

/// A topology edit was asked to do something that would break the node/link graph. Nothing is
/// modified when one of these is returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("{0} doesn't exist")]
    UnknownNode(NodeID),
    #[error("{0} doesn't exist")]
    UnknownLink(LinkID),
    #[error("{0} still has {1} links attached")]
    NodeInUse(NodeID, usize),
}
