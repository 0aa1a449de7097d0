//! Physical topology: hop counts between FPGAs, shortest link paths, and the
//! traffic routed across each link.
//!
//! The [`AdjacencyMatrix`] is rebuilt once per mapping run and answers
//! reachability questions for scoring. Actual routes are found with
//! [`shortest_link_path`] and recorded in a [`RouteTable`] so they can be
//! released again when a group is unmapped.

mod adjacency;
mod path;
mod routes;

pub use adjacency::{AdjacencyMatrix, NO_PATH};
pub use path::{apply_connection_to_path, link_load, remove_connection_from_path, shortest_link_path};
pub use routes::{commit_group_routes, release_group_routes, RouteTable, UNROUTABLE_CONNECTION};
