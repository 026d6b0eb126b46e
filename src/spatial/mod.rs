//! Collision queries against the layer stack.

mod collision;

pub use collision::{query_collisions, CollisionRecord};
