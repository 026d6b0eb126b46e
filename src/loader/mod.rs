//! TMX/TSX decoding into a [`Map`](crate::Map).

mod context;
pub(crate) mod tmx_loader;
mod xml;

pub use context::{LoaderContext, TextProvider, TextureProvider};
