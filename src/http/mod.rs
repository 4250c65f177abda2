//! HTTP transport over the handler registry
//!
//! Resolves request paths to registered RPC methods and exposes the registry
//! contents for documentation tooling.

pub mod handlers;
