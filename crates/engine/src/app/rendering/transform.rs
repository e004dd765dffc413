use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Scene pixels map 1:1 to window pixels; both axes grow right and down.
pub fn world_to_screen_px(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let x = world.x - camera.position.x + viewport.width as f32 * 0.5;
    let y = world.y - camera.position.y + viewport.height as f32 * 0.5;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world_px(screen: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    Vec2::new(
        screen.x + camera.position.x - viewport.width as f32 * 0.5,
        screen.y + camera.position.y - viewport.height as f32 * 0.5,
    )
}
