use macroquad::prelude::*;
use macroquad_tmx::{Drawable, Layer, Map, ObjectShape};
use std::cell::RefCell;
use std::rc::Rc;

fn window_conf() -> Conf {
    Conf {
        window_title: "Objects Example".into(),
        window_width: 1280,
        window_height: 800,
        window_resizable: true,
        ..Default::default()
    }
}

struct Player {
    position: Vec2,
    radius: f32,
}

impl Drawable for Player {
    // sorted by the top of the circle
    fn anchor_y(&self) -> f32 {
        self.position.y - self.radius
    }
}

fn draw_collision_layer(layer: &Layer, _: Option<&Camera2D>, _: Vec2) {
    let Some(objects) = layer.as_object() else {
        return;
    };
    for object in &objects.objects {
        let b = object.bounds;
        match &object.shape {
            ObjectShape::Rectangle => draw_rectangle(b.x, b.y, b.w, b.h, BLUE.with_alpha(0.25)),
            ObjectShape::Point => draw_circle(b.x, b.y, 8.0, GRAY),
            ObjectShape::Text { text, font_size } => {
                draw_text(text, b.x, b.y + *font_size as f32, *font_size as f32, WHITE);
            }
            _ => {}
        }
    }
}

fn setup(map: &mut Map, player: &Rc<RefCell<Player>>) {
    let before = map.layers.last().map_or(0, |l| l.id);
    let host = map.insert_virtual_layer("banner", before);
    if let Some(host) = host.as_virtual_mut() {
        host.draw_fn = Some(Box::new(|_: &Layer, _: Option<&Camera2D>, _: Vec2| {
            draw_text("I AM IN A VIRTUAL LAYER", 40.0, 120.0, 32.0, DARKPURPLE);
        }));
    }

    if let Some(tiles) = map.find_layer_mut("Objects").and_then(Layer::as_tile_mut) {
        let sprite = player.clone();
        tiles.drawable_fn = Some(Box::new(move |_: &Layer, _: &dyn Drawable, _: f32, _: f32| {
            let p = sprite.borrow();
            draw_circle(p.position.x, p.position.y, p.radius, MAGENTA);
        }));
        tiles.add_drawable(player);
    }

    if let Some(layer) = map.find_layer_mut("CollisionObjects") {
        layer.check_for_collisions = true;
        if let Some(objects) = layer.as_object_mut() {
            objects.draw_fn = Some(Box::new(draw_collision_layer));
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let mut map = Map::load_file("assets/sample_map.tmx").expect("Failed to load map");
    let player = Rc::new(RefCell::new(Player {
        position: vec2(150.0, 150.0),
        radius: 8.0,
    }));
    setup(&mut map, &player);

    let mut target = vec2(screen_width(), screen_height()) / 4.0;
    let mut last_mouse = Vec2::from(mouse_position());
    let mut hits = Vec::new();

    loop {
        let mouse = Vec2::from(mouse_position());
        if is_mouse_button_down(MouseButton::Right) {
            target -= (mouse - last_mouse) / 2.0;
        }
        last_mouse = mouse;

        let speed = 100.0 * get_frame_time();
        let mut step = Vec2::ZERO;
        if is_key_down(KeyCode::W) {
            step.y -= speed;
        }
        if is_key_down(KeyCode::S) {
            step.y += speed;
        }
        if is_key_down(KeyCode::A) {
            step.x -= speed;
        }
        if is_key_down(KeyCode::D) {
            step.x += speed;
        }

        {
            let mut p = player.borrow_mut();
            let next = p.position + step;
            let size = p.radius * 2.0;
            let footprint = Rect::new(next.x - p.radius, next.y - p.radius, size, size);
            if map.query_collisions(footprint, &mut hits) == 0 {
                p.position = next;
            }
        }

        clear_background(DARKGRAY);

        // 2 screen pixels per map pixel
        let camera = Camera2D {
            target,
            zoom: vec2(4.0 / screen_width(), 4.0 / screen_height()),
            ..Default::default()
        };
        set_camera(&camera);
        map.draw(Some(&camera), None);
        draw_line(0.0, 0.0, 100.0, 0.0, 1.0, RED);
        draw_line(0.0, 0.0, 0.0, 100.0, 1.0, BLUE);

        set_default_camera();
        draw_text(&format!("FPS: {}", get_fps()), 5.0, 20.0, 20.0, WHITE);
        draw_text(&format!("Tiles drawn: {}", map.tiles_drawn()), 5.0, 40.0, 20.0, WHITE);

        next_frame().await;
    }
}
