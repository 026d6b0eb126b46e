use crate::layer::{Layer, LayerData, LayerType, ObjectLayer, ObjectShape, TileLayer};
use macroquad::prelude::*;

/// One hit between a query rectangle and a collision-flagged layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionRecord {
    /// Kind of layer the hit came from.
    pub kind: LayerType,
    /// World bounds of the cell or object hit.
    pub bounds: Rect,
    /// Tile index for cells, object id for objects.
    pub item_id: u32,
    /// Id of the layer the hit came from.
    pub layer_id: i32,
}

/// Inclusive cell span covered by `rect` along one axis.
#[inline]
fn cell_span(start: f32, len: f32, cell: f32) -> (i32, i32) {
    ((start / cell).floor() as i32, ((start + len) / cell).floor() as i32)
}

fn query_tiles(layer: &Layer, tiles: &TileLayer, rect: Rect, results: &mut Vec<CollisionRecord>) {
    if tiles.tile_size.x <= 0.0 || tiles.tile_size.y <= 0.0 {
        return;
    }
    let (x0, x1) = cell_span(rect.x, rect.w, tiles.tile_size.x);
    let (y0, y1) = cell_span(rect.y, rect.h, tiles.tile_size.y);

    for y in y0.max(0)..=y1.min(tiles.height as i32 - 1) {
        for x in x0.max(0)..=x1.min(tiles.width as i32 - 1) {
            if let Some(index) = tiles.tile_at(x, y) {
                results.push(CollisionRecord {
                    kind: LayerType::Tile,
                    bounds: tiles.cell_rect(x, y),
                    item_id: index as u32,
                    layer_id: layer.id,
                });
            }
        }
    }
}

fn query_objects(
    layer: &Layer,
    objects: &ObjectLayer,
    rect: Rect,
    results: &mut Vec<CollisionRecord>,
) {
    let hits = objects
        .objects
        .iter()
        .filter(|o| o.shape == ObjectShape::Rectangle && rect.overlaps(&o.bounds));
    for object in hits {
        results.push(CollisionRecord {
            kind: LayerType::Object,
            bounds: object.bounds,
            item_id: object.id,
            layer_id: layer.id,
        });
    }
}

/// Rebuilds `results` with every cell and rectangle object that touches
/// `rect` in layers flagged for collisions. Returns the match count.
pub fn query_collisions(layers: &[Layer], rect: Rect, results: &mut Vec<CollisionRecord>) -> usize {
    results.clear();

    for layer in layers.iter().filter(|l| l.check_for_collisions) {
        match &layer.data {
            LayerData::Tile(tiles) => query_tiles(layer, tiles, rect, results),
            LayerData::Object(objects) => query_objects(layer, objects, rect, results),
            LayerData::Virtual(_) => {}
        }
    }
    results.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::MapObject;
    use crate::tile::TileCell;

    fn solid_layer() -> Layer {
        // 4x3 grid of 10 px cells, tile index = 1 + cell number, one hole at (1,1)
        let mut tiles = TileLayer::new(4, 3, vec2(10.0, 10.0));
        tiles.cells = (1..=12).map(TileCell::from_gid).collect();
        tiles.set_cell(1, 1, TileCell::EMPTY);
        let mut layer = Layer::tile("solid", 1, tiles);
        layer.check_for_collisions = true;
        layer
    }

    #[test]
    fn fractional_edges_include_partially_covered_cells() {
        let mut hits = Vec::new();
        let n = query_collisions(&[solid_layer()], Rect::new(5.0, 5.0, 10.0, 2.0), &mut hits);

        assert_eq!(n, 2);
        let ids: Vec<u32> = hits.iter().map(|h| h.item_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(hits[1].bounds, Rect::new(10.0, 0.0, 10.0, 10.0));
        assert!(hits.iter().all(|h| h.kind == LayerType::Tile && h.layer_id == 1));
    }

    #[test]
    fn empty_cells_do_not_collide() {
        let mut hits = Vec::new();
        let n = query_collisions(&[solid_layer()], Rect::new(12.0, 12.0, 5.0, 5.0), &mut hits);
        assert_eq!(n, 0);
        assert!(hits.is_empty());
    }

    #[test]
    fn query_outside_grid_is_clamped() {
        let mut hits = Vec::new();
        let n = query_collisions(&[solid_layer()], Rect::new(-25.0, 25.0, 30.0, 30.0), &mut hits);
        // only column 0 of row 2 lies inside the grid
        assert_eq!(n, 1);
        assert_eq!(hits[0].item_id, 9);
    }

    #[test]
    fn unflagged_layers_are_ignored() {
        let mut layer = solid_layer();
        layer.check_for_collisions = false;
        let mut hits = vec![CollisionRecord {
            kind: LayerType::Tile,
            bounds: Rect::new(0.0, 0.0, 1.0, 1.0),
            item_id: 99,
            layer_id: 99,
        }];
        assert_eq!(query_collisions(&[layer], Rect::new(0.0, 0.0, 40.0, 30.0), &mut hits), 0);
        assert!(hits.is_empty(), "results are rebuilt on every call");
    }

    #[test]
    fn only_rectangle_objects_collide_and_edges_touch() {
        let mut objects = ObjectLayer::default();
        objects.objects.push(MapObject::rectangle(7, Rect::new(20.0, 0.0, 10.0, 10.0)));
        let mut point = MapObject::rectangle(8, Rect::new(5.0, 5.0, 0.0, 0.0));
        point.shape = ObjectShape::Point;
        objects.objects.push(point);
        objects.objects.push(MapObject::rectangle(9, Rect::new(100.0, 100.0, 5.0, 5.0)));

        let mut layer = Layer::object("walls", 4, objects);
        layer.check_for_collisions = true;

        let mut hits = Vec::new();
        let n = query_collisions(&[layer], Rect::new(0.0, 0.0, 20.0, 10.0), &mut hits);
        assert_eq!(n, 1);
        assert_eq!(hits[0].item_id, 7);
        assert_eq!(hits[0].kind, LayerType::Object);
        assert_eq!(hits[0].layer_id, 4);
    }
}
