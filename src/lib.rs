//! Catalog seeding library - shared modules for the catalog-seed binary.

pub mod config;
pub mod emit;
pub mod ids;
pub mod metadata;
pub mod sanitize;
pub mod storage;
