//! Networking modules for the dashboard JSON endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! `gateway` defines the remote-data seam, `api` implements it over HTTP and
//! owns endpoint paths and response decoding, and `types` defines the wire
//! schema.

pub mod api;
pub mod gateway;
pub mod types;
