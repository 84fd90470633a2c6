//! Storage abstractions for service layer
//!
//! Reusable file-backed stores persisting small maps as JSON.

pub mod json_map_store;
