// src/core/auth/mod.rs

//! Users, credential snapshots, and the persistent user store.

pub mod admin;
pub mod registry;
pub mod store;
pub mod user;
