//! Eurovision dataset tools - shared modules for all binaries.

pub mod config;
pub mod csv_io;
pub mod dupes;
pub mod error;
pub mod ids;
pub mod models;
pub mod progress;
pub mod safety;
pub mod split;
pub mod youtube;
