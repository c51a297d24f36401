//! Minimal HTTP proxy exposing a fixed set of Xano Metadata API tools.
//!
//! - `GET /tools` lists the supported tools.
//! - `POST /tools/{tool_name}` forwards one call to the upstream and relays its JSON.

pub mod config;
pub mod error;
pub mod server;
pub mod tools;
pub mod upstream;
