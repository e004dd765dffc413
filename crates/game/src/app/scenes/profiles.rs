use engine::walkability::{FallbackLayout, PixelClassifier, StaticBlocker};
use engine::{Bounds, SceneKey, Vec2};

use crate::app::dialogue::ChatMessage;

use super::{BREAZE, THE_WOODS};

pub(crate) const SCENE_WIDTH_PX: u32 = 1536;
pub(crate) const SCENE_HEIGHT_PX: u32 = 1024;
pub(crate) const SCENE_CENTER: Vec2 = Vec2::new(768.0, 512.0);

pub(crate) const BASTON_ROAD: Bounds = Bounds::new(0.0, 1536.0, 472.0, 552.0);
pub(crate) const BASTON_WALL_THICKNESS: f32 = 32.0;
const BASTON_BUILDINGS: [(f32, f32, f32, f32); 8] = [
    (150.0, 200.0, 120.0, 180.0),
    (400.0, 150.0, 100.0, 200.0),
    (650.0, 180.0, 140.0, 160.0),
    (900.0, 140.0, 110.0, 220.0),
    (150.0, 750.0, 130.0, 170.0),
    (400.0, 800.0, 120.0, 150.0),
    (650.0, 780.0, 100.0, 180.0),
    (900.0, 820.0, 140.0, 140.0),
];

/// How a scene keeps bodies on walkable ground once its mask is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum CollisionStrategy {
    /// Per-tick rollback against the pixel map.
    #[default]
    MovementValidation,
    /// Static walls around the walkable bounding box; no per-tick checks.
    BoundingWalls,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NpcVoice {
    Sally,
}

#[derive(Debug, Clone)]
pub(crate) struct OutdoorProfile {
    pub(crate) key: SceneKey,
    pub(crate) size: (u32, u32),
    pub(crate) backdrop: &'static str,
    pub(crate) mask: &'static str,
    pub(crate) metadata: Option<&'static str>,
    pub(crate) classifier: PixelClassifier,
    pub(crate) strategy: CollisionStrategy,
    pub(crate) fallback: FallbackLayout,
    pub(crate) default_spawn: Vec2,
    pub(crate) npcs: Vec<NpcVoice>,
}

impl OutdoorProfile {
    pub(crate) fn scene_size(&self) -> Vec2 {
        Vec2::new(self.size.0 as f32, self.size.1 as f32)
    }
}

pub(crate) fn breaze() -> OutdoorProfile {
    OutdoorProfile {
        key: BREAZE,
        size: (SCENE_WIDTH_PX, SCENE_HEIGHT_PX),
        backdrop: "breaze/breaze.png",
        mask: "breaze/breaze-mask.png",
        metadata: Some("breaze/breaze.json"),
        classifier: PixelClassifier::default(),
        strategy: CollisionStrategy::MovementValidation,
        fallback: FallbackLayout::with_walkable_rect(Bounds::new(200.0, 1336.0, 150.0, 874.0)),
        default_spawn: SCENE_CENTER,
        npcs: vec![NpcVoice::Sally],
    }
}

pub(crate) fn the_woods() -> OutdoorProfile {
    OutdoorProfile {
        key: THE_WOODS,
        size: (SCENE_WIDTH_PX, SCENE_HEIGHT_PX),
        backdrop: "the-woods/the-woods.png",
        mask: "the-woods/the-woods-mask.png",
        metadata: None,
        classifier: PixelClassifier::ChannelFloor { min_channel: 200 },
        strategy: CollisionStrategy::BoundingWalls,
        fallback: FallbackLayout::perimeter_only(),
        default_spawn: SCENE_CENTER,
        npcs: Vec::new(),
    }
}

pub(crate) fn baston_blockers() -> Vec<StaticBlocker> {
    let width = SCENE_WIDTH_PX as f32;
    let height = SCENE_HEIGHT_PX as f32;
    let mut blockers = vec![
        StaticBlocker::band(Bounds::new(0.0, width, 0.0, BASTON_ROAD.min_y), "road_top"),
        StaticBlocker::band(
            Bounds::new(0.0, width, BASTON_ROAD.max_y, height),
            "road_bottom",
        ),
    ];
    blockers.extend(BASTON_BUILDINGS.iter().map(|&(x, y, w, h)| {
        StaticBlocker::building(Vec2::new(x, y), w, h, "building")
    }));
    blockers
}

pub(crate) fn sally_emergency_lines() -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("Sally", "Oh my, another visitor! How delightful!", Some(3000)),
        ChatMessage::new(
            "Sally",
            "The beach is so peaceful this time of day, don't you think?",
            Some(3500),
        ),
        ChatMessage::new(
            "Sally",
            "I love collecting seashells - each one tells its own story.",
            Some(3000),
        ),
    ]
}
