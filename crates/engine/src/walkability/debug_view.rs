use tracing::info;

use super::classifier::PixelClassifier;
use super::map::WalkableMapError;

pub const OVERLAY_LIFETIME_SECONDS: f32 = 10.0;
pub const WALKABLE_HIGHLIGHT: [u8; 4] = [0, 255, 0, 255];
pub const PANEL_LEFT_PX: i32 = 10;
pub const PANEL_TOP_PX: i32 = 10;
pub const PANEL_WIDTH_PX: u32 = 400;
pub const PANEL_HEIGHT_PX: u32 = 267;
pub const PANEL_BORDER: [u8; 4] = [255, 0, 0, 255];

/// Throwaway picture of what the classifier considers walkable.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkableDebugOverlay {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
    walkable_samples: u32,
    total_samples: u32,
    remaining_seconds: f32,
}

impl WalkableDebugOverlay {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn walkable_samples(&self) -> u32 {
        self.walkable_samples
    }

    pub fn total_samples(&self) -> u32 {
        self.total_samples
    }

    pub fn remaining_seconds(&self) -> f32 {
        self.remaining_seconds
    }

    /// Returns `false` once the overlay has outlived its display time.
    pub fn tick(&mut self, fixed_dt_seconds: f32) -> bool {
        self.remaining_seconds -= fixed_dt_seconds;
        self.remaining_seconds > 0.0
    }
}

/// Re-runs the classifier on the sampled grid. Walkable blocks are painted bright green;
/// every pixel of a blocked block keeps a third of its own color at full opacity.
pub fn visualize_walkable(
    pixels: &[u8],
    width: u32,
    height: u32,
    classifier: &PixelClassifier,
    sample_stride: u32,
) -> Result<WalkableDebugOverlay, WalkableMapError> {
    if width == 0 || height == 0 {
        return Err(WalkableMapError::EmptyDimensions { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if pixels.len() != expected {
        return Err(WalkableMapError::BufferLength {
            width,
            height,
            expected,
            actual: pixels.len(),
        });
    }

    let stride = sample_stride.max(1);
    let row_len = width as usize;
    let mut rgba = vec![0u8; expected];
    let mut walkable_samples = 0u32;
    let mut total_samples = 0u32;

    for sample_y in (0..height).step_by(stride as usize) {
        for sample_x in (0..width).step_by(stride as usize) {
            let offset = (sample_y as usize * row_len + sample_x as usize) * 4;
            let source = &pixels[offset..offset + 4];
            total_samples = total_samples.saturating_add(1);
            let is_walkable = classifier.classify_rgba(source);
            if is_walkable {
                walkable_samples = walkable_samples.saturating_add(1);
            }

            let block_bottom = (sample_y + stride).min(height);
            let block_right = (sample_x + stride).min(width);
            for y in sample_y..block_bottom {
                for x in sample_x..block_right {
                    let dst = (y as usize * row_len + x as usize) * 4;
                    let color = if is_walkable {
                        WALKABLE_HIGHLIGHT
                    } else {
                        let own = &pixels[dst..dst + 4];
                        [own[0] / 3, own[1] / 3, own[2] / 3, 255]
                    };
                    rgba[dst..dst + 4].copy_from_slice(&color);
                }
            }
        }
    }

    info!(
        walkable_samples,
        total_samples,
        lifetime_seconds = OVERLAY_LIFETIME_SECONDS,
        "walkable_debug_overlay_ready"
    );
    Ok(WalkableDebugOverlay {
        width,
        height,
        rgba,
        walkable_samples,
        total_samples,
        remaining_seconds: OVERLAY_LIFETIME_SECONDS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paints_walkable_green_and_dims_the_rest() {
        let mut pixels = vec![0u8; 8 * 4 * 4];
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[90, 60, 30, 128]);
        }
        pixels[0..4].copy_from_slice(&[255, 255, 255, 255]);

        let overlay =
            visualize_walkable(&pixels, 8, 4, &PixelClassifier::default(), 4).expect("overlay");

        assert_eq!(overlay.walkable_samples(), 1);
        assert_eq!(overlay.total_samples(), 2);
        let rgba = overlay.rgba();
        assert_eq!(&rgba[0..4], &WALKABLE_HIGHLIGHT);
        let last_left_block = (3 * 8 + 3) * 4;
        assert_eq!(&rgba[last_left_block..last_left_block + 4], &WALKABLE_HIGHLIGHT);
        let right_block = 4 * 4;
        assert_eq!(&rgba[right_block..right_block + 4], &[30, 20, 10, 255]);
    }

    #[test]
    fn blocked_blocks_dim_each_pixel_on_its_own() {
        let mut pixels = vec![0u8; 4 * 4 * 4];
        for (index, pixel) in pixels.chunks_exact_mut(4).enumerate() {
            let shade = 30 * (index as u8 % 4);
            pixel.copy_from_slice(&[shade, 90, 60, 255]);
        }

        let overlay =
            visualize_walkable(&pixels, 4, 4, &PixelClassifier::default(), 4).expect("overlay");

        assert_eq!(overlay.walkable_samples(), 0);
        let rgba = overlay.rgba();
        assert_eq!(&rgba[0..4], &[0, 30, 20, 255]);
        assert_eq!(&rgba[4..8], &[10, 30, 20, 255]);
        let bottom_right = (3 * 4 + 3) * 4;
        assert_eq!(&rgba[bottom_right..bottom_right + 4], &[30, 30, 20, 255]);
    }

    #[test]
    fn overlay_expires_after_ten_seconds() {
        let pixels = vec![255u8; 4 * 4 * 4];
        let mut overlay =
            visualize_walkable(&pixels, 4, 4, &PixelClassifier::default(), 4).expect("overlay");

        let mut alive_ticks = 0;
        while overlay.tick(0.5) {
            alive_ticks += 1;
        }
        assert_eq!(alive_ticks, 19);
    }

    #[test]
    fn rejects_mismatched_buffer() {
        assert!(visualize_walkable(&[0u8; 10], 2, 2, &PixelClassifier::default(), 4).is_err());
    }
}
