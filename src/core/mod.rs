// src/core/mod.rs

//! The central module containing the core logic and data structures of indexfence.

pub mod auth;
pub mod engine;
pub mod errors;
pub mod gate;
pub mod ipgate;
pub mod matcher;
pub mod path;
pub mod request;

pub use errors::FenceError;
pub use gate::{AuthGate, Decision};
