//! Runs the process as a service: binds an HTTP listener and wires it to
//! the retain pipeline's storage. Request handling for recall/search is
//! owned elsewhere — this crate only needs to stay up and report health.

pub mod api;
pub mod utils;

mod server;
pub use server::server;
