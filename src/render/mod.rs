//! Per-frame drawing of a [`Map`](crate::Map).

pub mod cull;

use crate::layer::{Layer, LayerData, TileLayer};
use crate::map::Map;
use crate::tileset::TileSheet;
use cull::{visible_cells, CellRange};
use macroquad::prelude::*;

/// Where tiles end up. [`MacroquadCanvas`] is the real one.
pub trait TileCanvas {
    /// Texture handle the canvas can blit from.
    type Texture;

    /// Blits `source` of `texture` into `dest`.
    ///
    /// A negative `source.w`/`source.h` means the tile is mirrored along
    /// that axis. `rotation` is in degrees about the centre of `dest`.
    fn draw_tile(
        &mut self,
        texture: &Self::Texture,
        source: Rect,
        dest: Rect,
        rotation: f32,
        tint: Color,
    );

    /// Size of the surface, used when no viewport size is given.
    fn screen_size(&self) -> Vec2;
}

/// Draws straight to the current macroquad render target.
#[derive(Debug, Default, Clone, Copy)]
pub struct MacroquadCanvas;

impl TileCanvas for MacroquadCanvas {
    type Texture = Texture2D;

    fn draw_tile(
        &mut self,
        texture: &Texture2D,
        source: Rect,
        dest: Rect,
        rotation: f32,
        tint: Color,
    ) {
        draw_texture_ex(
            texture,
            dest.x,
            dest.y,
            tint,
            DrawTextureParams {
                dest_size: Some(vec2(dest.w, dest.h)),
                source: Some(Rect::new(source.x, source.y, source.w.abs(), source.h.abs())),
                rotation: rotation.to_radians(),
                flip_x: source.w < 0.0,
                flip_y: source.h < 0.0,
                ..Default::default()
            },
        );
    }

    fn screen_size(&self) -> Vec2 {
        vec2(screen_width(), screen_height())
    }
}

/// Viewport size to cull against: the explicit one if positive, else the
/// camera's own viewport, else the whole canvas.
fn resolve_viewport<C: TileCanvas>(
    canvas: &C,
    camera: Option<&Camera2D>,
    viewport: Option<Vec2>,
) -> Vec2 {
    if let Some(v) = viewport.filter(|v| v.x > 0.0 && v.y > 0.0) {
        return v;
    }
    if let Some((_, _, w, h)) = camera.and_then(|c| c.viewport) {
        if w > 0 && h > 0 {
            return vec2(w as f32, h as f32);
        }
    }
    canvas.screen_size()
}

/// Walks the layers back to front. Returns the number of tiles blitted.
pub(crate) fn draw_map<T, C>(
    map: &Map<T>,
    canvas: &mut C,
    camera: Option<&Camera2D>,
    viewport: Option<Vec2>,
) -> usize
where
    C: TileCanvas<Texture = T>,
{
    let viewport = resolve_viewport(canvas, camera, viewport);
    // Last sheet hit; neighbouring tiles mostly share one.
    let mut last_sheet: Option<&TileSheet<T>> = None;
    let mut drawn = 0;

    for layer in map.layers.iter().filter(|l| l.visible) {
        match &layer.data {
            LayerData::Tile(tiles) => {
                let range = visible_cells(tiles, camera, viewport);
                drawn += draw_tile_layer(map, layer, tiles, range, canvas, &mut last_sheet);
            }
            LayerData::Object(objects) => {
                if let Some(draw) = &objects.draw_fn {
                    draw(layer, camera, viewport);
                }
            }
            LayerData::Virtual(host) => {
                if let Some(draw) = &host.draw_fn {
                    draw(layer, camera, viewport);
                }
            }
        }
    }
    drawn
}

fn draw_tile_layer<'m, T, C>(
    map: &'m Map<T>,
    layer: &Layer,
    tiles: &TileLayer,
    range: CellRange,
    canvas: &mut C,
    last_sheet: &mut Option<&'m TileSheet<T>>,
) -> usize
where
    C: TileCanvas<Texture = T>,
{
    let mut drawn = 0;
    let row_start_x = range.start_x as f32 * tiles.tile_size.x;
    let row_end_x = range.end_x as f32 * tiles.tile_size.x;

    for y in range.start_y..range.end_y {
        for x in range.start_x..range.end_x {
            let Some(cell) = tiles.cell(x, y).filter(|c| !c.is_empty()) else {
                continue;
            };

            if !(*last_sheet).is_some_and(|s| s.has_id(cell.index)) {
                *last_sheet = map.sheet_for(cell.index);
            }
            let Some(sheet) = *last_sheet else {
                continue;
            };

            sheet.draw_tile(canvas, cell.index, tiles.cell_rect(x, y), cell.flags, WHITE);
            drawn += 1;
        }

        if let Some(draw) = &tiles.drawable_fn {
            let band_top = y as f32 * tiles.tile_size.y;
            let band_bottom = (y + 1) as f32 * tiles.tile_size.y;
            for item in tiles.drawables() {
                let anchor = item.anchor_y();
                if anchor > band_top && anchor <= band_bottom {
                    draw(layer, &*item, row_start_x, row_end_x);
                }
            }
        }
    }
    drawn
}
