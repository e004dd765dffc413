use std::path::PathBuf;

use engine::walkability::{
    build_walkable_map, create_fallback_boundaries, find_dense_walkable_center, perimeter_walls,
    spawn_static_blockers, visualize_walkable, walls_around_walkable_area, CollisionLoadOutcome,
    FallbackReason, MapBuildOptions, MaskImage, MaskLoadJob, MaskLoadRequest, MovementValidator,
    PlacementSearch, WalkArea, WalkableMap, COLLISION_LAYER_NAME, DEFAULT_PERIMETER_THICKNESS,
    DEFAULT_SAMPLE_STRIDE, DEFAULT_WALL_PADDING,
};
use engine::{Bounds, InputSnapshot, Scene, SceneCommand, SceneWorld, Vec2};
use tracing::{info, warn};

use crate::app::actors::{npc_wander_bounds, Cast};
use crate::app::dialogue::DialogueDispatcher;

use super::profiles::{CollisionStrategy, OutdoorProfile};
use super::{next_scene, npc_source, title, ScenePhase, SceneSettings};

const NPC_SEED_BASE: u64 = 0x5a11;

struct PixelCollision {
    map: WalkableMap,
    mask: MaskImage,
    /// `None` when the scene fences the walkable area with walls instead.
    validator: Option<MovementValidator>,
}

enum CollisionState {
    Unloaded,
    Loading(MaskLoadJob),
    Ready(PixelCollision),
    Fallback,
}

/// A city scene whose walkable ground comes from a painted mask image.
pub(crate) struct OutdoorScene {
    profile: OutdoorProfile,
    assets_dir: PathBuf,
    settings: SceneSettings,
    cast: Cast,
    state: CollisionState,
}

impl OutdoorScene {
    pub(crate) fn new(
        profile: OutdoorProfile,
        assets_dir: PathBuf,
        settings: SceneSettings,
        dispatcher: DialogueDispatcher,
    ) -> Self {
        Self {
            profile,
            assets_dir,
            settings,
            cast: Cast::new(dispatcher),
            state: CollisionState::Unloaded,
        }
    }

    pub(crate) fn phase(&self) -> ScenePhase {
        match self.state {
            CollisionState::Unloaded | CollisionState::Loading(_) => ScenePhase::Loading,
            CollisionState::Ready(_) => ScenePhase::Ready,
            CollisionState::Fallback => ScenePhase::Fallback,
        }
    }

    fn load_request(&self) -> MaskLoadRequest {
        MaskLoadRequest {
            scene: self.profile.key.name(),
            mask_path: self.assets_dir.join(self.profile.mask),
            metadata_path: self.profile.metadata.map(|path| self.assets_dir.join(path)),
            scene_size: self.profile.size,
            collision_layer: COLLISION_LAYER_NAME.to_string(),
        }
    }

    fn finish_loading(&mut self, world: &mut SceneWorld, outcome: CollisionLoadOutcome) {
        let mask = match outcome {
            CollisionLoadOutcome::Mask(mask) => mask,
            CollisionLoadOutcome::Fallback(reason) => {
                self.enter_fallback(world, reason);
                return;
            }
        };
        let map = match build_walkable_map(
            mask.rgba(),
            mask.width(),
            mask.height(),
            &self.profile.classifier,
            MapBuildOptions::default(),
        ) {
            Ok(map) => map,
            Err(error) => {
                self.enter_fallback(world, FallbackReason::MaskUnavailable(error.to_string()));
                return;
            }
        };

        if !map.has_walkable_cells() {
            self.enter_fallback(world, FallbackReason::NoWalkableArea);
            return;
        }

        let spawn = match find_dense_walkable_center(&map, &PlacementSearch::default()) {
            Some(candidate) => {
                info!(
                    scene = self.profile.key.name(),
                    x = candidate.x,
                    y = candidate.y,
                    density = candidate.density,
                    source = ?candidate.source,
                    "spawn_placed"
                );
                candidate.position()
            }
            None => {
                warn!(
                    scene = self.profile.key.name(),
                    "no_walkable_area_using_default_spawn"
                );
                self.profile.default_spawn
            }
        };

        let scene_size = self.profile.scene_size();
        let walkable_extent = map.walkable_bounds().unwrap_or_else(|| world.scene_bounds());
        let validator = match self.profile.strategy {
            CollisionStrategy::MovementValidation => Some(MovementValidator::new()),
            CollisionStrategy::BoundingWalls => {
                let mut walls =
                    walls_around_walkable_area(walkable_extent, DEFAULT_WALL_PADDING, scene_size);
                walls.extend(perimeter_walls(scene_size, DEFAULT_PERIMETER_THICKNESS));
                spawn_static_blockers(world, &walls);
                None
            }
        };
        self.spawn_cast(world, spawn, npc_wander_bounds(walkable_extent));

        info!(
            scene = self.profile.key.name(),
            strategy = ?self.profile.strategy,
            "pixel_collision_ready"
        );
        self.state = CollisionState::Ready(PixelCollision {
            map,
            mask,
            validator,
        });
        if self.settings.walkable_debug {
            self.show_walkable_debug(world);
        }
    }

    fn enter_fallback(&mut self, world: &mut SceneWorld, reason: FallbackReason) {
        warn!(
            scene = self.profile.key.name(),
            reason = ?reason,
            "collision_fallback"
        );
        let blockers = create_fallback_boundaries(&self.profile.fallback, self.profile.scene_size());
        spawn_static_blockers(world, &blockers);
        let walkable_extent = self
            .profile
            .fallback
            .walkable_rect
            .unwrap_or_else(|| world.scene_bounds());
        self.spawn_cast(
            world,
            self.profile.default_spawn,
            npc_wander_bounds(walkable_extent),
        );
        self.state = CollisionState::Fallback;
    }

    fn spawn_cast(&mut self, world: &mut SceneWorld, spawn: Vec2, wander_bounds: Bounds) {
        self.cast.spawn_player(world, spawn);
        for (index, voice) in self.profile.npcs.iter().enumerate() {
            self.cast.spawn_npc(
                world,
                spawn,
                wander_bounds,
                NPC_SEED_BASE + index as u64,
                npc_source(*voice, &self.settings.dialogue_base_url),
            );
        }
    }

    fn toggle_walkable_debug(&mut self, world: &mut SceneWorld) {
        if world.hide_walkable_overlay() {
            return;
        }
        self.show_walkable_debug(world);
    }

    fn show_walkable_debug(&self, world: &mut SceneWorld) {
        let CollisionState::Ready(collision) = &self.state else {
            info!(scene = self.profile.key.name(), "walkable_debug_unavailable");
            return;
        };
        match visualize_walkable(
            collision.mask.rgba(),
            collision.mask.width(),
            collision.mask.height(),
            &self.profile.classifier,
            DEFAULT_SAMPLE_STRIDE,
        ) {
            Ok(overlay) => world.show_walkable_overlay(overlay),
            Err(error) => warn!(error = %error, "walkable_debug_failed"),
        }
    }
}

impl Scene for OutdoorScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.set_scene_size(self.profile.size.0, self.profile.size.1);
        world.set_backdrop(self.profile.backdrop);
        let request = self.load_request();
        info!(
            scene = self.profile.key.name(),
            mask = %request.mask_path.display(),
            "scene_loading"
        );
        match MaskLoadJob::spawn(request) {
            Ok(job) => self.state = CollisionState::Loading(job),
            Err(error) => {
                self.enter_fallback(world, FallbackReason::MaskUnavailable(error.to_string()))
            }
        }
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.switch_scene_pressed() {
            return SceneCommand::SwitchTo(next_scene(self.profile.key));
        }

        if let CollisionState::Loading(job) = &mut self.state {
            if let Some(outcome) = job.poll() {
                self.finish_loading(world, outcome);
            }
            return SceneCommand::None;
        }

        if input.walkable_debug_pressed() {
            self.toggle_walkable_debug(world);
        }
        world.tick_walkable_overlay(fixed_dt_seconds);

        let validation = match &mut self.state {
            CollisionState::Ready(collision) => collision
                .validator
                .as_mut()
                .map(|validator| (&collision.map as &dyn WalkArea, validator)),
            _ => None,
        };
        self.cast.tick(world, input, fixed_dt_seconds, validation);
        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.state = CollisionState::Unloaded;
        self.cast.clear();
        info!(scene = self.profile.key.name(), "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(title(
            self.profile.key,
            self.phase(),
            self.cast.dialogue_line(),
        ))
    }
}
