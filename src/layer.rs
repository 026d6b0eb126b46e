use crate::properties::Properties;
use crate::tile::TileCell;
use macroquad::prelude::*;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Discriminator for the three layer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum LayerType {
    Tile,
    Object,
    Virtual,
}

/// A host object drawn between tile rows.
///
/// The anchor decides which row band the drawable belongs to.
pub trait Drawable {
    /// World-space Y used to pick the row band.
    fn anchor_y(&self) -> f32;
}

impl<D: Drawable> Drawable for RefCell<D> {
    fn anchor_y(&self) -> f32 {
        self.borrow().anchor_y()
    }
}

/// Called once per drawable whose anchor falls in the row just drawn, with
/// the row's horizontal pixel extent.
pub type DrawableFn = Box<dyn Fn(&Layer, &dyn Drawable, f32, f32)>;

/// Called once per frame for object and virtual layers with the active
/// camera and viewport size.
pub type LayerDrawFn = Box<dyn Fn(&Layer, Option<&Camera2D>, Vec2)>;

/// One entry of a map's draw order.
pub struct Layer {
    /// Name from the editor; not necessarily unique.
    pub name: String,
    /// Unique within a map; unrelated to draw position.
    pub id: i32,
    /// Hidden layers are not drawn but still collide.
    pub visible: bool,
    /// Opt-in for [`Map::query_collisions`](crate::Map::query_collisions).
    pub check_for_collisions: bool,
    /// Custom properties from the editor.
    pub properties: Properties,
    /// Kind-specific payload.
    pub data: LayerData,
}

/// Payload of a [`Layer`], one variant per [`LayerType`].
#[allow(missing_docs)]
pub enum LayerData {
    Tile(TileLayer),
    Object(ObjectLayer),
    Virtual(VirtualLayer),
}

#[allow(missing_docs)]
impl Layer {
    fn with_data(name: impl Into<String>, id: i32, data: LayerData) -> Self {
        Layer {
            name: name.into(),
            id,
            visible: true,
            check_for_collisions: false,
            properties: Properties::new(),
            data,
        }
    }

    pub fn tile(name: impl Into<String>, id: i32, tiles: TileLayer) -> Self {
        Self::with_data(name, id, LayerData::Tile(tiles))
    }

    pub fn object(name: impl Into<String>, id: i32, objects: ObjectLayer) -> Self {
        Self::with_data(name, id, LayerData::Object(objects))
    }

    /// A host layer with no map data of its own.
    pub fn virtual_layer(name: impl Into<String>, id: i32) -> Self {
        Self::with_data(name, id, LayerData::Virtual(VirtualLayer::default()))
    }

    pub fn layer_type(&self) -> LayerType {
        match self.data {
            LayerData::Tile(_) => LayerType::Tile,
            LayerData::Object(_) => LayerType::Object,
            LayerData::Virtual(_) => LayerType::Virtual,
        }
    }

    pub fn as_tile(&self) -> Option<&TileLayer> {
        match &self.data {
            LayerData::Tile(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_tile_mut(&mut self) -> Option<&mut TileLayer> {
        match &mut self.data {
            LayerData::Tile(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectLayer> {
        match &self.data {
            LayerData::Object(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ObjectLayer> {
        match &mut self.data {
            LayerData::Object(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_virtual_mut(&mut self) -> Option<&mut VirtualLayer> {
        match &mut self.data {
            LayerData::Virtual(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("type", &self.layer_type())
            .field("visible", &self.visible)
            .field("check_for_collisions", &self.check_for_collisions)
            .finish_non_exhaustive()
    }
}

/// A dense row-major grid of cells.
#[derive(Default)]
pub struct TileLayer {
    /// Width in cells, always the map's.
    pub width: u32,
    /// Height in cells, always the map's.
    pub height: u32,
    /// Cell size in pixels.
    pub tile_size: Vec2,
    /// `width * height` cells when decoded; may be empty or short.
    pub cells: Vec<TileCell>,
    drawables: Vec<Weak<dyn Drawable>>,
    /// Draws the registered drawables; without it they are skipped.
    pub drawable_fn: Option<DrawableFn>,
}

impl TileLayer {
    /// A layer with no cells yet.
    pub fn new(width: u32, height: u32, tile_size: Vec2) -> Self {
        TileLayer {
            width,
            height,
            tile_size,
            ..Default::default()
        }
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Bounds-checked cell lookup. Also `None` when the layer decoded fewer
    /// cells than its grid holds.
    pub fn cell(&self, x: i32, y: i32) -> Option<&TileCell> {
        self.index(x, y).and_then(|i| self.cells.get(i))
    }

    /// Tile index at `(x, y)` when the cell exists and is not empty.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<u16> {
        self.cell(x, y).filter(|c| !c.is_empty()).map(|c| c.index)
    }

    /// Overwrites one cell; false when `(x, y)` is outside the decoded grid.
    pub fn set_cell(&mut self, x: i32, y: i32, cell: TileCell) -> bool {
        match self.index(x, y).and_then(|i| self.cells.get_mut(i)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// World-space rectangle of cell `(x, y)`.
    pub fn cell_rect(&self, x: i32, y: i32) -> Rect {
        Rect::new(
            x as f32 * self.tile_size.x,
            y as f32 * self.tile_size.y,
            self.tile_size.x,
            self.tile_size.y,
        )
    }

    /// Registers a host drawable. Only a weak handle is kept: the drawable
    /// stops being drawn once the host drops it.
    pub fn add_drawable<D: Drawable + 'static>(&mut self, item: &Rc<D>) {
        let weak: Weak<D> = Rc::downgrade(item);
        self.drawables.push(weak);
    }

    /// Unregisters every handle to `item`, pruning dead ones on the way.
    pub fn remove_drawable<D: Drawable + 'static>(&mut self, item: &Rc<D>) {
        let target: Weak<D> = Rc::downgrade(item);
        let target: Weak<dyn Drawable> = target;
        self.drawables
            .retain(|w| w.strong_count() > 0 && !Weak::ptr_eq(w, &target));
    }

    /// Drawables still alive.
    pub fn drawables(&self) -> impl Iterator<Item = Rc<dyn Drawable>> + '_ {
        self.drawables.iter().filter_map(Weak::upgrade)
    }

    /// True while any handle, live or dead, is registered.
    pub fn has_drawables(&self) -> bool {
        !self.drawables.is_empty()
    }
}

/// Shapes an object can take.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectShape {
    /// The generic, collidable kind.
    Rectangle,
    /// Position only; `bounds` has no size.
    Point,
    /// Inscribed in `bounds`.
    Ellipse,
    /// Points relative to the object origin; no geometry support.
    Polygon(Vec<Vec2>),
    /// Open path, relative like [`Polygon`](Self::Polygon).
    Polyline(Vec<Vec2>),
    /// A text label of `font_size` pixels.
    #[allow(missing_docs)]
    Text { text: String, font_size: u32 },
}

/// An object placed in an object layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    /// Unique within the map.
    pub id: u32,
    /// Display name; may be empty.
    pub name: String,
    /// User class, read from `class` or the older `type` attribute.
    pub class: String,
    /// Position and size in pixels.
    pub bounds: Rect,
    /// Degrees clockwise.
    pub rotation: f32,
    /// Editor visibility; nothing here reads it.
    pub visible: bool,
    /// Tile drawn by a tile object.
    pub tile: Option<TileCell>,
    /// Only rectangles take part in collision queries.
    pub shape: ObjectShape,
    /// Custom properties from the editor.
    pub properties: Properties,
}

impl MapObject {
    /// A visible, unnamed rectangle object.
    pub fn rectangle(id: u32, bounds: Rect) -> Self {
        MapObject {
            id,
            name: String::new(),
            class: String::new(),
            bounds,
            rotation: 0.0,
            visible: true,
            tile: None,
            shape: ObjectShape::Rectangle,
            properties: Properties::new(),
        }
    }
}

/// Objects of an `objectgroup`.
#[derive(Default)]
pub struct ObjectLayer {
    /// In document order.
    pub objects: Vec<MapObject>,
    /// The engine draws no objects by itself.
    pub draw_fn: Option<LayerDrawFn>,
}

/// A layer that only exists to give the host a slot in the draw order.
#[derive(Default)]
pub struct VirtualLayer {
    /// Called in this layer's slot each frame.
    pub draw_fn: Option<LayerDrawFn>,
}
