use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{Camera2D, OrderState, RenderableKind, SceneWorld, Vec2};
use crate::walkability::{
    WalkableDebugOverlay, PANEL_BORDER, PANEL_HEIGHT_PX, PANEL_LEFT_PX, PANEL_TOP_PX,
    PANEL_WIDTH_PX,
};

use super::{world_to_screen_px, Viewport};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const SCENE_FLOOR_COLOR: [u8; 4] = [58, 74, 52, 255];
const ORDER_MARKER_COLOR: [u8; 4] = [255, 120, 120, 255];
const ORDER_MARKER_HALF_SIZE_PX: i32 = 6;
const PANEL_BORDER_PX: i32 = 2;

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned_missing_sprite_keys = &mut self.warned_missing_sprite_keys;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let scene_rect = world_rect_to_screen(
            Vec2::ZERO,
            world.scene_size(),
            world.camera(),
            viewport,
        );
        let backdrop = world.backdrop().and_then(|key| {
            resolve_cached_sprite(sprite_cache, warned_missing_sprite_keys, asset_root, key)
        });
        match backdrop {
            Some(image) => draw_stretched(frame, viewport, scene_rect, image),
            None => fill_rect_clipped(frame, viewport, scene_rect, SCENE_FLOOR_COLOR),
        }

        for entity in world.entities() {
            match &entity.renderable.kind {
                RenderableKind::Hidden => {}
                RenderableKind::Solid(color) => {
                    let aabb = entity.aabb();
                    let rect = world_rect_to_screen(
                        Vec2::new(aabb.min_x, aabb.min_y),
                        entity.size,
                        world.camera(),
                        viewport,
                    );
                    fill_rect_clipped(frame, viewport, rect, *color);
                }
                RenderableKind::Sprite(key) => {
                    let (cx, cy) =
                        world_to_screen_px(entity.transform.position, world.camera(), viewport);
                    if let Some(sprite) = resolve_cached_sprite(
                        sprite_cache,
                        warned_missing_sprite_keys,
                        asset_root,
                        key,
                    ) {
                        draw_sprite_centered(frame, viewport, cx, cy, sprite);
                    } else {
                        let half_w = (entity.size.x * 0.5).round() as i32;
                        let half_h = (entity.size.y * 0.5).round() as i32;
                        fill_rect_clipped(
                            frame,
                            viewport,
                            ScreenRectPx {
                                left: cx - half_w,
                                top: cy - half_h,
                                right: cx + half_w,
                                bottom: cy + half_h,
                            },
                            [220, 220, 240, 255],
                        );
                    }
                }
            }

            if let OrderState::MoveTo { point } = entity.order_state {
                let (mx, my) = world_to_screen_px(point, world.camera(), viewport);
                draw_cross(frame, viewport, mx, my, ORDER_MARKER_HALF_SIZE_PX, ORDER_MARKER_COLOR);
            }
        }

        if let Some(overlay) = world.walkable_overlay() {
            draw_walkable_overlay(frame, viewport, overlay);
        }

        self.pixels.render()
    }
}

fn world_rect_to_screen(
    top_left: Vec2,
    size: Vec2,
    camera: &Camera2D,
    viewport: Viewport,
) -> ScreenRectPx {
    let (left, top) = world_to_screen_px(top_left, camera, viewport);
    ScreenRectPx {
        left,
        top,
        right: left + size.x.round() as i32,
        bottom: top + size.y.round() as i32,
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let sprite = match resolve_asset_path(asset_root, key) {
            Ok(path) => match load_sprite_rgba(&path) {
                Ok(sprite) => Some(sprite),
                Err(reason) => {
                    warn_sprite_load_once(
                        warned_missing_sprite_keys,
                        key,
                        Some(path.as_path()),
                        reason.as_str(),
                    );
                    None
                }
            },
            Err(reason) => {
                warn_sprite_load_once(warned_missing_sprite_keys, key, None, reason.as_str());
                None
            }
        };
        cache.insert(key.to_string(), sprite);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn resolve_asset_path(asset_root: &Path, key: &str) -> Result<PathBuf, String> {
    let relative = Path::new(key);
    if key.is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(format!("invalid_key:{key}"));
    }
    Ok(asset_root.join(relative))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let x = x as usize;
    let y = y as usize;
    let Some(pixel_offset) = y.checked_mul(width).and_then(|row| row.checked_add(x)) else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

fn clip_rect(rect: ScreenRectPx, viewport: Viewport) -> Option<ScreenRectPx> {
    let clipped = ScreenRectPx {
        left: rect.left.max(0),
        top: rect.top.max(0),
        right: rect.right.min(viewport.width as i32),
        bottom: rect.bottom.min(viewport.height as i32),
    };
    (clipped.left < clipped.right && clipped.top < clipped.bottom).then_some(clipped)
}

fn fill_rect_clipped(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let Some(clipped) = clip_rect(rect, viewport) else {
        return;
    };
    for y in clipped.top..clipped.bottom {
        for x in clipped.left..clipped.right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn draw_rect_outline(
    frame: &mut [u8],
    viewport: Viewport,
    rect: ScreenRectPx,
    thickness: i32,
    color: [u8; 4],
) {
    let width = viewport.width as usize;
    for inset in 0..thickness.max(1) {
        let left = rect.left - 1 - inset;
        let right = rect.right + inset;
        let top = rect.top - 1 - inset;
        let bottom = rect.bottom + inset;
        for x in left..=right {
            write_pixel_rgba_clipped(frame, width, x, top, color);
            write_pixel_rgba_clipped(frame, width, x, bottom, color);
        }
        for y in top..=bottom {
            write_pixel_rgba_clipped(frame, width, left, y, color);
            write_pixel_rgba_clipped(frame, width, right, y, color);
        }
    }
}

fn draw_cross(
    frame: &mut [u8],
    viewport: Viewport,
    cx: i32,
    cy: i32,
    half_size: i32,
    color: [u8; 4],
) {
    let width = viewport.width as usize;
    for x in (cx - half_size)..=(cx + half_size) {
        write_pixel_rgba_clipped(frame, width, x, cy, color);
    }
    for y in (cy - half_size)..=(cy + half_size) {
        write_pixel_rgba_clipped(frame, width, cx, y, color);
    }
}

/// Source texel for destination offset `offset` when `src_len` texels span `dst_len` pixels.
fn stretched_source_index(offset: i32, dst_len: i32, src_len: u32) -> usize {
    if dst_len <= 0 || src_len == 0 {
        return 0;
    }
    let scaled = (offset.max(0) as u64 * src_len as u64) / dst_len as u64;
    (scaled as usize).min(src_len as usize - 1)
}

/// Nearest-neighbor blit of `rgba` (`src_w` x `src_h`) into `dest`. Transparent texels are skipped.
fn blit_stretched(
    frame: &mut [u8],
    viewport: Viewport,
    dest: ScreenRectPx,
    rgba: &[u8],
    src_w: u32,
    src_h: u32,
) {
    if src_w == 0 || src_h == 0 || rgba.len() < src_w as usize * src_h as usize * 4 {
        return;
    }
    let Some(clipped) = clip_rect(dest, viewport) else {
        return;
    };
    let dest_w = dest.right - dest.left;
    let dest_h = dest.bottom - dest.top;
    let frame_width = viewport.width as usize;

    for out_y in clipped.top..clipped.bottom {
        let src_y = stretched_source_index(out_y - dest.top, dest_h, src_h);
        let src_row = src_y * src_w as usize * 4;
        let dst_row = out_y as usize * frame_width * 4;
        for out_x in clipped.left..clipped.right {
            let src_x = stretched_source_index(out_x - dest.left, dest_w, src_w);
            let src = src_row + src_x * 4;
            if rgba[src + 3] == 0 {
                continue;
            }
            let dst = dst_row + out_x as usize * 4;
            if dst + 4 > frame.len() {
                continue;
            }
            frame[dst..dst + 3].copy_from_slice(&rgba[src..src + 3]);
            frame[dst + 3] = 255;
        }
    }
}

fn draw_stretched(frame: &mut [u8], viewport: Viewport, dest: ScreenRectPx, image: &LoadedSprite) {
    blit_stretched(frame, viewport, dest, &image.rgba, image.width, image.height);
}

fn draw_sprite_centered(
    frame: &mut [u8],
    viewport: Viewport,
    center_x: i32,
    center_y: i32,
    sprite: &LoadedSprite,
) {
    let left = center_x - sprite.width as i32 / 2;
    let top = center_y - sprite.height as i32 / 2;
    let dest = ScreenRectPx {
        left,
        top,
        right: left + sprite.width as i32,
        bottom: top + sprite.height as i32,
    };
    draw_stretched(frame, viewport, dest, sprite);
}

fn walkable_panel_rect() -> ScreenRectPx {
    ScreenRectPx {
        left: PANEL_LEFT_PX,
        top: PANEL_TOP_PX,
        right: PANEL_LEFT_PX + PANEL_WIDTH_PX as i32,
        bottom: PANEL_TOP_PX + PANEL_HEIGHT_PX as i32,
    }
}

fn draw_walkable_overlay(frame: &mut [u8], viewport: Viewport, overlay: &WalkableDebugOverlay) {
    let panel = walkable_panel_rect();
    blit_stretched(
        frame,
        viewport,
        panel,
        overlay.rgba(),
        overlay.width(),
        overlay.height(),
    );
    draw_rect_outline(frame, viewport, panel, PANEL_BORDER_PX, PANEL_BORDER);
}
