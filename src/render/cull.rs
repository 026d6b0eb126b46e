//! Viewport culling: which cells of a layer a camera can see.

use crate::layer::TileLayer;
use macroquad::camera::Camera;
use macroquad::prelude::*;

/// Cells kept on each side of the visible span so tiles do not pop in at
/// the screen edges.
const CULL_MARGIN_CELLS: i32 = 1;

/// Half-open range of cell coordinates `[start, end)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct CellRange {
    pub start_x: i32,
    pub start_y: i32,
    pub end_x: i32,
    pub end_y: i32,
}

impl CellRange {
    /// Every cell of `layer`.
    pub fn full(layer: &TileLayer) -> Self {
        CellRange {
            start_x: 0,
            start_y: 0,
            end_x: layer.width as i32,
            end_y: layer.height as i32,
        }
    }

    /// True when there is nothing to visit.
    pub fn is_empty(&self) -> bool {
        self.start_x >= self.end_x || self.start_y >= self.end_y
    }
}

/// Maps a point on a viewport of `viewport` pixels through the inverse of
/// `camera`'s transform.
///
/// Unlike `Camera2D::screen_to_world` this does not query the window size.
pub fn screen_to_world(camera: &Camera2D, point: Vec2, viewport: Vec2) -> Vec2 {
    let ndc = vec2(
        point.x / viewport.x * 2.0 - 1.0,
        1.0 - point.y / viewport.y * 2.0,
    );
    let p = camera.matrix().inverse().transform_point3(vec3(ndc.x, ndc.y, 0.0));
    vec2(p.x, p.y)
}

/// World-space axis-aligned bounds of the viewport under `camera`.
pub fn visible_world_rect(camera: &Camera2D, viewport: Vec2) -> (Vec2, Vec2) {
    let corners = [
        vec2(0.0, 0.0),
        vec2(viewport.x, 0.0),
        vec2(0.0, viewport.y),
        viewport,
    ]
    .map(|c| screen_to_world(camera, c, viewport));

    let min = corners.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
    let max = corners.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);
    (min, max)
}

/// Cells of `layer` worth visiting for this frame.
///
/// Without a camera the whole grid is returned. With one, the visible span
/// is widened by one cell before and two after (the end is exclusive) and
/// clamped to the grid.
pub fn visible_cells(layer: &TileLayer, camera: Option<&Camera2D>, viewport: Vec2) -> CellRange {
    let full = CellRange::full(layer);
    let Some(camera) = camera else {
        return full;
    };
    if layer.tile_size.x <= 0.0
        || layer.tile_size.y <= 0.0
        || viewport.x <= 0.0
        || viewport.y <= 0.0
    {
        return full;
    }

    let (min, max) = visible_world_rect(camera, viewport);
    let cell_min_x = (min.x / layer.tile_size.x).floor() as i32;
    let cell_min_y = (min.y / layer.tile_size.y).floor() as i32;
    let cell_max_x = (max.x / layer.tile_size.x).floor() as i32;
    let cell_max_y = (max.y / layer.tile_size.y).floor() as i32;

    CellRange {
        start_x: cell_min_x.saturating_sub(CULL_MARGIN_CELLS).max(0),
        start_y: cell_min_y.saturating_sub(CULL_MARGIN_CELLS).max(0),
        end_x: cell_max_x.saturating_add(CULL_MARGIN_CELLS + 1).min(full.end_x),
        end_y: cell_max_y.saturating_add(CULL_MARGIN_CELLS + 1).min(full.end_y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shows world [100, 500] x [100, 500] on a 400x400 viewport.
    fn camera_over_100_500() -> Camera2D {
        Camera2D {
            target: vec2(300.0, 300.0),
            zoom: vec2(2.0 / 400.0, 2.0 / 400.0),
            ..Default::default()
        }
    }

    fn layer(width: u32, height: u32) -> TileLayer {
        TileLayer::new(width, height, vec2(32.0, 32.0))
    }

    #[test]
    fn no_camera_scans_whole_grid() {
        let range = visible_cells(&layer(7, 5), None, vec2(800.0, 600.0));
        assert_eq!(range, CellRange { start_x: 0, start_y: 0, end_x: 7, end_y: 5 });
    }

    #[test]
    fn screen_corners_map_to_world_span() {
        let (min, max) = visible_world_rect(&camera_over_100_500(), vec2(400.0, 400.0));
        assert!((min.x - 100.0).abs() < 1e-3 && (min.y - 100.0).abs() < 1e-3);
        assert!((max.x - 500.0).abs() < 1e-3 && (max.y - 500.0).abs() < 1e-3);
    }

    #[test]
    fn covers_visible_cells_with_one_cell_slack() {
        let camera = camera_over_100_500();
        let range = visible_cells(&layer(100, 100), Some(&camera), vec2(400.0, 400.0));

        // Cells touching [100, 500] are 3..=15 at 32 px.
        assert!(range.start_x <= 3 && range.start_y <= 3);
        assert!(range.end_x >= 16 && range.end_y >= 16);
        assert!(range.start_x >= 2 && range.start_y >= 2);
        assert!(range.end_x <= 17 && range.end_y <= 17);
    }

    #[test]
    fn clamps_to_grid() {
        let range = visible_cells(&layer(10, 8), Some(&camera_over_100_500()), vec2(400.0, 400.0));
        assert_eq!(range, CellRange { start_x: 2, start_y: 2, end_x: 10, end_y: 8 });

        let far_left = Camera2D {
            target: vec2(-1000.0, -1000.0),
            zoom: vec2(2.0 / 400.0, 2.0 / 400.0),
            ..Default::default()
        };
        let range = visible_cells(&layer(10, 8), Some(&far_left), vec2(400.0, 400.0));
        assert_eq!(range.start_x, 0);
        assert!(range.is_empty());
    }

    #[test]
    fn extreme_zoom_out_sees_whole_grid() {
        // the visible span overflows i32 cell coordinates
        let camera = Camera2D {
            zoom: vec2(1e-12, 1e-12),
            ..Default::default()
        };
        let grid = layer(10, 8);
        assert_eq!(
            visible_cells(&grid, Some(&camera), vec2(400.0, 400.0)),
            CellRange::full(&grid)
        );
    }
}
