use crate::render::TileCanvas;
use crate::tile::TileFlags;
use macroquad::prelude::*;

/// A texture plus its partition into tile rectangles, covering the global
/// ids `first_id .. first_id + tiles.len()`.
#[derive(Debug, Clone)]
pub struct TileSheet<T> {
    /// Atlas texture, owned by the sheet.
    pub texture: T,
    /// Global id of `tiles[0]`.
    pub first_id: u16,
    /// Source rectangles in pixels, row-major.
    pub tiles: Vec<Rect>,
}

impl<T> TileSheet<T> {
    #[allow(missing_docs)]
    pub fn new(texture: T, first_id: u16, tiles: Vec<Rect>) -> Self {
        TileSheet {
            texture,
            first_id,
            tiles,
        }
    }

    /// Range test against this sheet's ids.
    #[inline]
    pub fn has_id(&self, id: u16) -> bool {
        let id = id as usize;
        let first = self.first_id as usize;
        id >= first && id < first + self.tiles.len()
    }

    /// Source rectangle for `id`, with mirrored axes encoded as negative
    /// extents, and the rotation (degrees) the diagonal flag asks for.
    ///
    /// `id` must belong to this sheet; callers check with [`has_id`](Self::has_id).
    pub fn source_rect(&self, id: u16, flags: TileFlags) -> (Rect, f32) {
        let mut source = self.tiles[(id - self.first_id) as usize];
        let mut rotation = 0.0;

        if flags.flip_d() {
            rotation -= 90.0;
        }
        if flags.flip_h() {
            source.w = -source.w;
        }
        if flags.flip_v() {
            source.h = -source.h;
        }
        (source, rotation)
    }

    /// Blits tile `id` into `dest`.
    pub fn draw_tile<C>(&self, canvas: &mut C, id: u16, dest: Rect, flags: TileFlags, tint: Color)
    where
        C: TileCanvas<Texture = T>,
    {
        let (source, rotation) = self.source_rect(id, flags);
        canvas.draw_tile(&self.texture, source, dest, rotation, tint);
    }
}

/// Cuts an atlas image into tile rectangles, row-major, starting at
/// `(margin, margin)` and stopping before `image - margin` on each axis.
pub fn atlas_rects(
    image_w: u32,
    image_h: u32,
    tile_w: u32,
    tile_h: u32,
    spacing: u32,
    margin: u32,
) -> Vec<Rect> {
    let mut rects = Vec::new();
    if tile_w == 0 || tile_h == 0 {
        return rects;
    }

    let step_x = (tile_w as usize).saturating_add(spacing as usize);
    let step_y = (tile_h as usize).saturating_add(spacing as usize);
    let end_x = image_w.saturating_sub(margin);
    let end_y = image_h.saturating_sub(margin);

    for y in (margin..end_y).step_by(step_y) {
        for x in (margin..end_x).step_by(step_x) {
            rects.push(Rect::new(x as f32, y as f32, tile_w as f32, tile_h as f32));
        }
    }
    rects
}
