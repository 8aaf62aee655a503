//! offline-proxy: offline-first caching proxy with versioned cache tiers.
//!
//! Sits between a hosted web application and the network, intercepts GET
//! requests, classifies each into a resource class, and serves every class
//! with its own consistency strategy:
//!   documents → network-first, API reads → stale-while-revalidate,
//!   static assets → cache-first, everything else → network-first
//!
//! Cache tiers are keyed by a per-instance version tag; a new generation
//! evicts its predecessors' tiers wholesale at activation. The crate also
//! handles push-notification filtering/display and click routing to open
//! application windows, and exposes the whole thing as a standalone HTTP
//! service for local use.

pub mod cache;
pub mod client;
pub mod config;
pub mod net;
pub mod notify;
pub mod proxy;
pub mod server;
