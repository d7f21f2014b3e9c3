//! Core spatial types shared by the treasure hunt crates.
//!
//! This crate provides the foundational types used across the workspace:
//! - Transform and pose composition
//! - Component types attached to spawned collectibles

pub mod components;
pub mod transform;

pub use components::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec3};
