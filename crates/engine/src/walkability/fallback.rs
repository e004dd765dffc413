use tracing::info;

use crate::app::{Bounds, EntityId, RenderableDesc, SceneWorld, Vec2};

pub const DEFAULT_PERIMETER_THICKNESS: f32 = 50.0;
pub const DEFAULT_WALL_PADDING: f32 = 20.0;

const BUILDING_COLOR: [u8; 4] = [118, 88, 64, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockerKind {
    /// Outside the scene rectangle; keeps bodies from leaving the play area.
    Perimeter,
    /// Inside the scene; fences off ground that is not walkable.
    Band,
    Building,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticBlocker {
    pub bounds: Bounds,
    pub kind: BlockerKind,
    pub label: &'static str,
}

impl StaticBlocker {
    pub fn band(bounds: Bounds, label: &'static str) -> Self {
        Self {
            bounds,
            kind: BlockerKind::Band,
            label,
        }
    }

    pub fn building(center: Vec2, width: f32, height: f32, label: &'static str) -> Self {
        Self {
            bounds: Bounds::from_center(center, width, height),
            kind: BlockerKind::Building,
            label,
        }
    }
}

/// Coarse collision used when no pixel mask is available.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackLayout {
    /// Hand-picked walkable rectangle; everything else in the scene is fenced off.
    pub walkable_rect: Option<Bounds>,
    pub extra_blockers: Vec<StaticBlocker>,
    pub perimeter_thickness: f32,
}

impl Default for FallbackLayout {
    fn default() -> Self {
        Self {
            walkable_rect: None,
            extra_blockers: Vec::new(),
            perimeter_thickness: DEFAULT_PERIMETER_THICKNESS,
        }
    }
}

impl FallbackLayout {
    pub fn perimeter_only() -> Self {
        Self::default()
    }

    pub fn with_walkable_rect(walkable_rect: Bounds) -> Self {
        Self {
            walkable_rect: Some(walkable_rect),
            ..Self::default()
        }
    }
}

/// Builds the layout's blockers plus four perimeter walls just outside the scene.
///
/// The perimeter is always present, so the scene is enclosed on every side even
/// when the layout declares nothing else.
pub fn create_fallback_boundaries(layout: &FallbackLayout, scene_size: Vec2) -> Vec<StaticBlocker> {
    let mut blockers = Vec::new();
    if let Some(rect) = layout.walkable_rect {
        blockers.extend(bands_around(rect, scene_size));
    }
    blockers.extend(layout.extra_blockers.iter().copied());
    blockers.extend(perimeter_walls(scene_size, layout.perimeter_thickness));
    blockers
}

/// Bands that fence in the walkable bounding box grown by `padding`.
pub fn walls_around_walkable_area(
    walkable_bounds: Bounds,
    padding: f32,
    scene_size: Vec2,
) -> Vec<StaticBlocker> {
    let scene = Bounds::new(0.0, scene_size.x, 0.0, scene_size.y);
    let grown = Bounds::new(
        (walkable_bounds.min_x - padding).max(scene.min_x),
        (walkable_bounds.max_x + padding).min(scene.max_x),
        (walkable_bounds.min_y - padding).max(scene.min_y),
        (walkable_bounds.max_y + padding).min(scene.max_y),
    );
    bands_around(grown, scene_size)
}

pub fn perimeter_walls(scene_size: Vec2, thickness: f32) -> [StaticBlocker; 4] {
    let t = if thickness > 0.0 {
        thickness
    } else {
        DEFAULT_PERIMETER_THICKNESS
    };
    let (w, h) = (scene_size.x, scene_size.y);
    [
        StaticBlocker {
            bounds: Bounds::new(-t, w + t, -t, 0.0),
            kind: BlockerKind::Perimeter,
            label: "perimeter_top",
        },
        StaticBlocker {
            bounds: Bounds::new(-t, w + t, h, h + t),
            kind: BlockerKind::Perimeter,
            label: "perimeter_bottom",
        },
        StaticBlocker {
            bounds: Bounds::new(-t, 0.0, 0.0, h),
            kind: BlockerKind::Perimeter,
            label: "perimeter_left",
        },
        StaticBlocker {
            bounds: Bounds::new(w, w + t, 0.0, h),
            kind: BlockerKind::Perimeter,
            label: "perimeter_right",
        },
    ]
}

fn bands_around(rect: Bounds, scene_size: Vec2) -> Vec<StaticBlocker> {
    let (w, h) = (scene_size.x, scene_size.y);
    let candidates = [
        StaticBlocker::band(Bounds::new(0.0, w, 0.0, rect.min_y), "band_top"),
        StaticBlocker::band(Bounds::new(0.0, w, rect.max_y, h), "band_bottom"),
        StaticBlocker::band(
            Bounds::new(0.0, rect.min_x, rect.min_y, rect.max_y),
            "band_left",
        ),
        StaticBlocker::band(
            Bounds::new(rect.max_x, w, rect.min_y, rect.max_y),
            "band_right",
        ),
    ];
    candidates
        .into_iter()
        .filter(|blocker| blocker.bounds.width() > 0.0 && blocker.bounds.height() > 0.0)
        .collect()
}

/// Spawns one fixed body per blocker. Only buildings are drawn.
pub fn spawn_static_blockers(world: &mut SceneWorld, blockers: &[StaticBlocker]) -> Vec<EntityId> {
    let ids: Vec<EntityId> = blockers
        .iter()
        .map(|blocker| {
            let renderable = match blocker.kind {
                BlockerKind::Building => RenderableDesc::solid(BUILDING_COLOR, blocker.label),
                BlockerKind::Perimeter | BlockerKind::Band => RenderableDesc::hidden(blocker.label),
            };
            world.spawn_fixed(blocker.bounds, renderable)
        })
        .collect();
    info!(blocker_count = ids.len(), "static_blockers_spawned");
    ids
}
