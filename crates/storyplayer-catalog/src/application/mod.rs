//! Application layer for the catalog.

pub mod adapter;
pub mod loader;
pub mod source;
