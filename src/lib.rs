#![warn(missing_docs)]

//! Tiled TMX loader, layered renderer and collision queries for Macroquad.
//!
//! ```no_run
//! use macroquad::prelude::*;
//! use macroquad_tmx::Map;
//!
//! # async fn frame() -> Result<(), macroquad_tmx::MapError> {
//! let map = Map::load_file("assets/sample_map.tmx")?;
//! let camera = Camera2D::from_display_rect(Rect::new(0.0, 0.0, 640.0, 360.0));
//! set_camera(&camera);
//! map.draw(Some(&camera), None);
//! # Ok(())
//! # }
//! ```

mod error;
mod layer;
mod loader;
mod map;
mod properties;
pub mod render;
mod spatial;
mod tile;
mod tileset;

pub use error::MapError;
pub use layer::{
    Drawable, DrawableFn, Layer, LayerData, LayerDrawFn, LayerType, MapObject, ObjectLayer,
    ObjectShape, TileLayer, VirtualLayer,
};
pub use loader::{LoaderContext, TextProvider, TextureProvider};
pub use map::{LayerKey, Map};
pub use properties::{Properties, PropertyValue};
pub use render::{MacroquadCanvas, TileCanvas};
pub use spatial::{query_collisions, CollisionRecord};
pub use tile::{TileCell, TileFlags, FLIP_D, FLIP_H, FLIP_V};
pub use tileset::{atlas_rects, TileSheet};
