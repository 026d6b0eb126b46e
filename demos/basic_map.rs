use macroquad::prelude::*;
use macroquad_tmx::Map;

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Map".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let map = Map::load_file("assets/sample_map.tmx").expect("Failed to load map");

    let world_size = vec2(map.width as f32, map.height as f32) * map.tile_size;
    let mut target = world_size / 2.0;

    loop {
        clear_background(DARKGRAY);

        let speed = 300.0 * get_frame_time();
        if is_key_down(KeyCode::Left) {
            target.x -= speed;
        }
        if is_key_down(KeyCode::Right) {
            target.x += speed;
        }
        if is_key_down(KeyCode::Up) {
            target.y -= speed;
        }
        if is_key_down(KeyCode::Down) {
            target.y += speed;
        }

        // 3 screen pixels per map pixel
        let camera = Camera2D {
            target,
            zoom: vec2(6.0 / screen_width(), 6.0 / screen_height()),
            ..Default::default()
        };
        set_camera(&camera);
        let drawn = map.draw(Some(&camera), None);

        set_default_camera();
        draw_text(&format!("FPS: {}", get_fps()), 5.0, 20.0, 24.0, RED);
        draw_text(&format!("Tiles drawn: {drawn}"), 5.0, 44.0, 24.0, WHITE);

        next_frame().await;
    }
}
