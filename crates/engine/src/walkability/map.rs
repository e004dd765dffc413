use thiserror::Error;
use tracing::info;

use super::classifier::PixelClassifier;
use crate::app::{Bounds, Vec2};

pub const DEFAULT_SAMPLE_STRIDE: u32 = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WalkableMapError {
    #[error("mask dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("mask buffer has {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapBuildOptions {
    pub sample_stride: u32,
}

impl Default for MapBuildOptions {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
        }
    }
}

/// Full-resolution walkability grid derived from a mask image.
///
/// Immutable once built. Cells outside the image are never walkable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkableMap {
    width: u32,
    height: u32,
    walkable: Vec<bool>,
    walkable_samples: u32,
    total_samples: u32,
}

impl WalkableMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn walkable_samples(&self) -> u32 {
        self.walkable_samples
    }

    pub fn total_samples(&self) -> u32 {
        self.total_samples
    }

    pub fn walkable_sample_ratio(&self) -> f32 {
        if self.total_samples == 0 {
            return 0.0;
        }
        self.walkable_samples as f32 / self.total_samples as f32
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn is_walkable_at(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x > u32::MAX as i64 || y > u32::MAX as i64 {
            return false;
        }
        self.index_of(x as u32, y as u32)
            .is_some_and(|index| self.walkable[index])
    }

    pub fn is_walkable_point(&self, point: Vec2) -> bool {
        if !point.is_finite() {
            return false;
        }
        self.is_walkable_at(point.x.floor() as i64, point.y.floor() as i64)
    }

    pub fn has_walkable_cells(&self) -> bool {
        self.walkable_samples > 0
    }

    /// Bounding rectangle of every walkable cell, in cell coordinates.
    pub fn walkable_bounds(&self) -> Option<Bounds> {
        let mut min_x = u32::MAX;
        let mut max_x = 0u32;
        let mut min_y = u32::MAX;
        let mut max_y = 0u32;
        let mut any = false;
        for y in 0..self.height {
            let row = y as usize * self.width as usize;
            for x in 0..self.width {
                if !self.walkable[row + x as usize] {
                    continue;
                }
                any = true;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
        any.then(|| Bounds::new(min_x as f32, max_x as f32, min_y as f32, max_y as f32))
    }

    #[cfg(test)]
    pub(crate) fn from_fn(width: u32, height: u32, walkable: impl Fn(u32, u32) -> bool) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        let mut walkable_count = 0;
        for y in 0..height {
            for x in 0..width {
                let flag = walkable(x, y);
                walkable_count += u32::from(flag);
                cells.push(flag);
            }
        }
        Self {
            width,
            height,
            walkable: cells,
            walkable_samples: walkable_count,
            total_samples: width * height,
        }
    }
}

/// Classifies every `sample_stride`-th pixel on both axes and paints the result over
/// the stride-by-stride block that sample stands for.
pub fn build_walkable_map(
    pixels: &[u8],
    width: u32,
    height: u32,
    classifier: &PixelClassifier,
    options: MapBuildOptions,
) -> Result<WalkableMap, WalkableMapError> {
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

    let stride = options.sample_stride.max(1);
    let row_len = width as usize;
    let mut walkable = vec![false; row_len * height as usize];
    let mut walkable_samples = 0u32;
    let mut total_samples = 0u32;

    for sample_y in (0..height).step_by(stride as usize) {
        for sample_x in (0..width).step_by(stride as usize) {
            let offset = (sample_y as usize * row_len + sample_x as usize) * 4;
            let is_walkable = classifier.classify_rgba(&pixels[offset..offset + 4]);
            total_samples = total_samples.saturating_add(1);
            if !is_walkable {
                continue;
            }
            walkable_samples = walkable_samples.saturating_add(1);

            let block_bottom = (sample_y + stride).min(height);
            let block_right = (sample_x + stride).min(width) as usize;
            for y in sample_y..block_bottom {
                let row = y as usize * row_len;
                walkable[row + sample_x as usize..row + block_right].fill(true);
            }
        }
    }

    let map = WalkableMap {
        width,
        height,
        walkable,
        walkable_samples,
        total_samples,
    };
    info!(
        width,
        height,
        sample_stride = stride,
        walkable_samples,
        total_samples,
        walkable_percent = map.walkable_sample_ratio() * 100.0,
        "walkable_map_built"
    );
    Ok(map)
}
