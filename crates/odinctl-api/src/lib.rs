// odinctl-api: Async Rust client for the ODIN control server adapter API
//
// Thin typed layer over the server's JSON endpoints: the `/api` version
// handshake, the adapter listing, and per-adapter parameter trees.

pub mod adapter;
pub mod client;
pub mod error;
pub mod models;
pub mod system;
pub mod transport;

pub use client::OdinClient;
pub use error::Error;
pub use models::{AdapterTree, ApiVersion, BackgroundTask};
pub use transport::TransportConfig;
