//! Configuration for the Shredder pipeline.

pub mod config;

pub use config::Config;
