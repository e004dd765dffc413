use tracing::{debug, info};

use super::map::WalkableMap;
use crate::app::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementSource {
    DensestWindow,
    BoundingBoxCenter,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementCandidate {
    pub x: f32,
    pub y: f32,
    /// Fraction of in-bounds samples around `(x, y)` that are walkable.
    pub density: f32,
    pub source: PlacementSource,
}

impl PlacementCandidate {
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSearch {
    pub radius: u32,
    pub step: u32,
    pub sample_interval: u32,
    pub min_density: f32,
}

impl Default for PlacementSearch {
    fn default() -> Self {
        Self {
            radius: 32,
            step: 16,
            sample_interval: 4,
            min_density: 0.6,
        }
    }
}

/// Scans window centers row by row and keeps the densest window above `min_density`.
///
/// Ties keep the earlier window in scan order. Without a qualifying window the center
/// of the walkable bounding box is used. `None` means the map has no walkable cell.
pub fn find_dense_walkable_center(
    map: &WalkableMap,
    search: &PlacementSearch,
) -> Option<PlacementCandidate> {
    let bounds = map.walkable_bounds()?;

    let radius = search.radius;
    let step = search.step.max(1) as usize;
    let mut best: Option<PlacementCandidate> = None;
    let mut windows_scanned = 0u32;

    for center_y in (radius..map.height().saturating_sub(radius)).step_by(step) {
        for center_x in (radius..map.width().saturating_sub(radius)).step_by(step) {
            windows_scanned = windows_scanned.saturating_add(1);
            let density = window_density(map, center_x, center_y, search);
            let best_density = best.map_or(0.0, |candidate| candidate.density);
            if density > search.min_density && density > best_density {
                best = Some(PlacementCandidate {
                    x: center_x as f32,
                    y: center_y as f32,
                    density,
                    source: PlacementSource::DensestWindow,
                });
            }
        }
    }

    if let Some(candidate) = best {
        info!(
            x = candidate.x,
            y = candidate.y,
            density = candidate.density,
            windows_scanned,
            "placement_found"
        );
        return Some(candidate);
    }

    let center = bounds.center();
    let density = window_density(
        map,
        center.x.floor() as u32,
        center.y.floor() as u32,
        search,
    );
    debug!(
        min_density = search.min_density,
        windows_scanned, "placement_no_dense_window"
    );
    info!(
        x = center.x,
        y = center.y,
        density,
        "placement_bounding_box_center"
    );
    Some(PlacementCandidate {
        x: center.x,
        y: center.y,
        density,
        source: PlacementSource::BoundingBoxCenter,
    })
}

/// Walkable fraction of the samples taken every `sample_interval` pixels inside the
/// square window. Samples that fall outside the map are skipped, not counted.
pub fn window_density(
    map: &WalkableMap,
    center_x: u32,
    center_y: u32,
    search: &PlacementSearch,
) -> f32 {
    let radius = search.radius as i64;
    let interval = search.sample_interval.max(1) as usize;
    let mut walkable = 0u32;
    let mut total = 0u32;

    for dy in (-radius..=radius).step_by(interval) {
        let y = center_y as i64 + dy;
        if y < 0 || y >= map.height() as i64 {
            continue;
        }
        for dx in (-radius..=radius).step_by(interval) {
            let x = center_x as i64 + dx;
            if x < 0 || x >= map.width() as i64 {
                continue;
            }
            total += 1;
            if map.is_walkable_at(x, y) {
                walkable += 1;
            }
        }
    }

    if total == 0 {
        return 0.0;
    }
    walkable as f32 / total as f32
}
