#![deny(warnings)]
#![recursion_limit = "256"]

// Library crate for gdrive-mcp

pub mod config;
pub mod drive;
pub mod error;
pub mod events;
pub mod rpc;
pub mod server;
pub mod tools;
pub mod transport;
