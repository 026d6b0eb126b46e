use crate::error::MapError;
use crate::layer::Layer;
use crate::loader::{tmx_loader, LoaderContext};
use crate::properties::Properties;
use crate::render::{self, MacroquadCanvas, TileCanvas};
use crate::spatial::{self, CollisionRecord};
use crate::tileset::TileSheet;
use macroquad::prelude::*;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::Path;

/// Lookup key for [`Map::find_layer`]: a layer id or an exact name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKey<'a> {
    /// Match on [`Layer::id`].
    Id(i32),
    /// Match on [`Layer::name`].
    Name(&'a str),
}

impl From<i32> for LayerKey<'_> {
    fn from(id: i32) -> Self {
        LayerKey::Id(id)
    }
}

impl<'a> From<&'a str> for LayerKey<'a> {
    fn from(name: &'a str) -> Self {
        LayerKey::Name(name)
    }
}

impl LayerKey<'_> {
    fn matches(&self, layer: &Layer) -> bool {
        match *self {
            LayerKey::Id(id) => layer.id == id,
            LayerKey::Name(name) => layer.name == name,
        }
    }
}

/// A loaded level: tile sheets keyed by their first id, and layers in
/// back-to-front draw order.
///
/// `T` is the texture handle type produced by the loader's texture provider.
pub struct Map<T = Texture2D> {
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Cell size in pixels.
    pub tile_size: Vec2,
    /// Map-level custom properties.
    pub properties: Properties,
    /// Tile sheets keyed by first tile id.
    pub sheets: BTreeMap<u16, TileSheet<T>>,
    /// The order of this list is the draw order.
    pub layers: Vec<Layer>,
    tiles_drawn: Cell<usize>,
}

impl<T> Default for Map<T> {
    fn default() -> Self {
        Map {
            width: 0,
            height: 0,
            tile_size: Vec2::ZERO,
            properties: Properties::new(),
            sheets: BTreeMap::new(),
            layers: Vec::new(),
            tiles_drawn: Cell::new(0),
        }
    }
}

impl Map<Texture2D> {
    /// Loads a TMX file with the built-in file and texture loaders.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let mut map = Map::new();
        map.load(path, &LoaderContext::default())?;
        Ok(map)
    }

    /// Draws every visible layer with macroquad. Returns the number of
    /// tiles blitted.
    pub fn draw(&self, camera: Option<&Camera2D>, viewport: Option<Vec2>) -> usize {
        self.draw_with(&mut MacroquadCanvas, camera, viewport)
    }
}

impl<T> Map<T> {
    /// An empty map; fill it with [`load`](Self::load).
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a TMX file, replacing whatever the map held.
    ///
    /// Relative tileset and image paths resolve against the map's directory.
    /// On failure the map is left empty.
    pub fn load(&mut self, path: impl AsRef<Path>, ctx: &LoaderContext<T>) -> Result<(), MapError> {
        self.clear();
        let result = tmx_loader::load_map_file(path.as_ref(), ctx, self);
        if result.is_err() {
            self.clear();
        }
        result
    }

    /// Loads a TMX document held in memory. Relative paths resolve against
    /// the working directory.
    pub fn load_from_str(&mut self, content: &str, ctx: &LoaderContext<T>) -> Result<(), MapError> {
        self.clear();
        let result = tmx_loader::load_map_str(content, ctx, self);
        if result.is_err() {
            self.clear();
        }
        result
    }

    fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.tile_size = Vec2::ZERO;
        self.properties = Properties::new();
        self.sheets.clear();
        self.layers.clear();
    }

    /// Drops all layers and sheets.
    ///
    /// With `release_textures` the sheet textures are dropped along with the
    /// sheets; otherwise they are handed back, ordered by first tile id.
    pub fn unload(&mut self, release_textures: bool) -> Vec<T> {
        self.layers.clear();
        let sheets = std::mem::take(&mut self.sheets);
        if release_textures {
            return Vec::new();
        }
        sheets.into_values().map(|s| s.texture).collect()
    }

    /// Sheet owning tile `id`, by full scan.
    pub fn sheet_for(&self, id: u16) -> Option<&TileSheet<T>> {
        self.sheets.values().find(|s| s.has_id(id))
    }

    /// Inserts `layer` before the first layer with id `before_id` and
    /// returns it for configuration.
    ///
    /// When no layer has that id, or when it is the very first layer, the
    /// new layer is appended to the end of the draw order instead.
    pub fn insert_layer(&mut self, layer: Layer, before_id: i32) -> &mut Layer {
        let pos = match self.layers.iter().position(|l| l.id == before_id) {
            Some(i) if i > 0 => i,
            _ => self.layers.len(),
        };
        self.layers.insert(pos, layer);
        &mut self.layers[pos]
    }

    /// Builds a virtual layer with a fresh id and inserts it like
    /// [`insert_layer`](Self::insert_layer).
    pub fn insert_virtual_layer(&mut self, name: impl Into<String>, before_id: i32) -> &mut Layer {
        let id = self.next_layer_id();
        self.insert_layer(Layer::virtual_layer(name, id), before_id)
    }

    /// One past the highest layer id in use.
    pub fn next_layer_id(&self) -> i32 {
        self.layers.iter().map(|l| l.id).max().map_or(1, |id| id + 1)
    }

    /// Removes the first layer with id `layer_id`.
    pub fn remove_layer(&mut self, layer_id: i32) -> bool {
        match self.layers.iter().position(|l| l.id == layer_id) {
            Some(i) => {
                self.layers.remove(i);
                true
            }
            None => false,
        }
    }

    /// First layer matching `key`, which is either an id or a name.
    pub fn find_layer<'k>(&self, key: impl Into<LayerKey<'k>>) -> Option<&Layer> {
        let key = key.into();
        self.layers.iter().find(|l| key.matches(l))
    }

    /// Mutable form of [`find_layer`](Self::find_layer).
    pub fn find_layer_mut<'k>(&mut self, key: impl Into<LayerKey<'k>>) -> Option<&mut Layer> {
        let key = key.into();
        self.layers.iter_mut().find(|l| key.matches(l))
    }

    /// Collects everything in collision-flagged layers touching `rect` into
    /// `results` (cleared first). Returns the number of matches.
    pub fn query_collisions(&self, rect: Rect, results: &mut Vec<CollisionRecord>) -> usize {
        spatial::query_collisions(&self.layers, rect, results)
    }

    /// Draws every visible layer onto `canvas`. Returns the number of tiles
    /// blitted, also available afterwards from [`tiles_drawn`](Self::tiles_drawn).
    pub fn draw_with<C>(
        &self,
        canvas: &mut C,
        camera: Option<&Camera2D>,
        viewport: Option<Vec2>,
    ) -> usize
    where
        C: TileCanvas<Texture = T>,
    {
        self.tiles_drawn.set(0);
        let drawn = render::draw_map(self, canvas, camera, viewport);
        self.tiles_drawn.set(drawn);
        drawn
    }

    /// Tiles blitted by the most recent draw.
    pub fn tiles_drawn(&self) -> usize {
        self.tiles_drawn.get()
    }
}
