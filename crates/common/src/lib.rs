//! Shared types used across the order platform crates.

pub mod types;

pub use types::{OrderId, Version};
