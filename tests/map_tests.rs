// tests/map_tests.rs

use macroquad::prelude::*;
use macroquad_tmx::{
    Layer, LayerType, Map, MapObject, ObjectLayer, TileCell, TileLayer, TileSheet,
};

fn ids(map: &Map<()>) -> Vec<i32> {
    map.layers.iter().map(|l| l.id).collect()
}

fn three_layers() -> Map<()> {
    let mut map = Map::new();
    for id in 1..=3 {
        map.layers
            .push(Layer::tile(format!("L{id}"), id, TileLayer::new(2, 2, vec2(8.0, 8.0))));
    }
    map
}

#[test]
fn insert_before_a_middle_layer() {
    let mut map = three_layers();
    map.insert_layer(Layer::virtual_layer("v", 9), 3);
    assert_eq!(ids(&map), vec![1, 2, 9, 3]);
}

#[test]
fn insert_with_unknown_id_appends() {
    let mut map = three_layers();
    map.insert_layer(Layer::virtual_layer("v", 9), 42);
    assert_eq!(ids(&map), vec![1, 2, 3, 9]);
}

#[test]
fn insert_before_the_first_layer_appends() {
    let mut map = three_layers();
    let layer = map.insert_layer(Layer::virtual_layer("v", 9), 1);
    layer.check_for_collisions = true;
    assert_eq!(ids(&map), vec![1, 2, 3, 9]);
    assert!(map.layers[3].check_for_collisions);
}

#[test]
fn virtual_layers_get_fresh_ids() {
    let mut map: Map<()> = Map::new();
    assert_eq!(map.next_layer_id(), 1);
    assert_eq!(map.insert_virtual_layer("first", 0).id, 1);

    let mut map = three_layers();
    let id = map.insert_virtual_layer("player", 2).id;
    assert_eq!(id, 4);
    assert_eq!(ids(&map), vec![1, 4, 2, 3]);
    assert_eq!(map.layers[1].layer_type(), LayerType::Virtual);
    assert_eq!(map.next_layer_id(), 5);
}

#[test]
fn layers_are_found_by_id_or_name() {
    let mut map = three_layers();
    assert_eq!(map.find_layer(2).map(|l| l.name.as_str()), Some("L2"));
    assert_eq!(map.find_layer("L3").map(|l| l.id), Some(3));
    assert!(map.find_layer(7).is_none());
    assert!(map.find_layer("l3").is_none());

    map.find_layer_mut("L1").unwrap().visible = false;
    assert!(!map.layers[0].visible);
}

#[test]
fn remove_layer_reports_whether_it_found_one() {
    let mut map = three_layers();
    assert!(map.remove_layer(2));
    assert_eq!(ids(&map), vec![1, 3]);
    assert!(!map.remove_layer(2));
}

#[test]
fn sheet_lookup_scans_every_sheet() {
    let mut map: Map<()> = Map::new();
    map.sheets
        .insert(1, TileSheet::new((), 1, vec![Rect::new(0.0, 0.0, 8.0, 8.0); 4]));
    map.sheets
        .insert(20, TileSheet::new((), 20, vec![Rect::new(0.0, 0.0, 8.0, 8.0); 2]));

    assert_eq!(map.sheet_for(3).map(|s| s.first_id), Some(1));
    assert_eq!(map.sheet_for(21).map(|s| s.first_id), Some(20));
    assert!(map.sheet_for(10).is_none());
    assert!(map.sheet_for(0).is_none());
}

#[test]
fn collision_queries_cover_tiles_and_objects() {
    let mut map = three_layers();

    let walls = map.find_layer_mut(1).unwrap();
    walls.check_for_collisions = true;
    let cells = [5, 0, 0, 6].into_iter().map(TileCell::from_gid).collect();
    walls.as_tile_mut().unwrap().cells = cells;

    let mut objects = ObjectLayer::default();
    objects.objects.push(MapObject::rectangle(11, Rect::new(4.0, 4.0, 4.0, 4.0)));
    let mut blockers = Layer::object("blockers", 4, objects);
    blockers.check_for_collisions = true;
    map.layers.push(blockers);

    let mut hits = Vec::new();
    let n = map.query_collisions(Rect::new(0.0, 0.0, 6.0, 6.0), &mut hits);
    assert_eq!(n, 2);
    let found: Vec<(LayerType, u32, i32)> =
        hits.iter().map(|h| (h.kind, h.item_id, h.layer_id)).collect();
    assert_eq!(found, vec![(LayerType::Tile, 5, 1), (LayerType::Object, 11, 4)]);

    // hidden layers still collide
    map.find_layer_mut(1).unwrap().visible = false;
    assert_eq!(map.query_collisions(Rect::new(9.0, 9.0, 2.0, 2.0), &mut hits), 1);
    assert_eq!(hits[0].item_id, 6);
}

#[test]
fn unload_empties_the_map() {
    let mut map = three_layers();
    map.sheets.insert(1, TileSheet::new((), 1, Vec::new()));
    assert_eq!(map.unload(false).len(), 1);
    assert!(map.layers.is_empty());
    assert!(map.sheets.is_empty());
}
