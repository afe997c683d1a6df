//! Link graph and relationship tracking.

mod link_graph;
pub mod resolution;

pub use link_graph::{
    BrokenLink, Connectivity, Direction, Edge, HubEntry, Hop, LinkGraph, Stub,
};
pub(crate) use link_graph::ratio;
pub use resolution::{PathIndex, Resolution};
