//! Kernel module - server dependencies.

pub mod deps;

pub use deps::ServerDeps;
