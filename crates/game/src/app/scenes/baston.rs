use engine::walkability::{perimeter_walls, spawn_static_blockers, MovementValidator, WalkArea};
use engine::{InputSnapshot, Scene, SceneCommand, SceneWorld};
use tracing::info;

use crate::app::actors::Cast;
use crate::app::dialogue::DialogueDispatcher;

use super::profiles::{
    baston_blockers, NpcVoice, BASTON_ROAD, BASTON_WALL_THICKNESS, SCENE_CENTER, SCENE_HEIGHT_PX,
    SCENE_WIDTH_PX,
};
use super::{next_scene, npc_source, title, ScenePhase, SceneSettings, BASTON};

const BASTON_BACKDROP: &str = "baston/baston.png";
const SALLY_SEED: u64 = 0xba57;

/// Town whose walkable ground is one declared road band, with no mask to load.
pub(crate) struct BastonScene {
    settings: SceneSettings,
    cast: Cast,
    validator: MovementValidator,
}

impl BastonScene {
    pub(crate) fn new(settings: SceneSettings, dispatcher: DialogueDispatcher) -> Self {
        Self {
            settings,
            cast: Cast::new(dispatcher),
            validator: MovementValidator::new(),
        }
    }
}

impl Scene for BastonScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.set_scene_size(SCENE_WIDTH_PX, SCENE_HEIGHT_PX);
        world.set_backdrop(BASTON_BACKDROP);

        let mut blockers = baston_blockers();
        blockers.extend(perimeter_walls(world.scene_size(), BASTON_WALL_THICKNESS));
        spawn_static_blockers(world, &blockers);

        self.cast.spawn_player(world, SCENE_CENTER);
        self.cast.spawn_npc(
            world,
            SCENE_CENTER,
            BASTON_ROAD,
            SALLY_SEED,
            npc_source(NpcVoice::Sally, &self.settings.dialogue_base_url),
        );
        info!(scene = BASTON.name(), "scene_loaded");
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.switch_scene_pressed() {
            return SceneCommand::SwitchTo(next_scene(BASTON));
        }
        if input.walkable_debug_pressed() {
            info!(scene = BASTON.name(), "walkable_debug_unavailable");
        }
        let road: &dyn WalkArea = &BASTON_ROAD;
        self.cast
            .tick(world, input, fixed_dt_seconds, Some((road, &mut self.validator)));
        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, _world: &mut SceneWorld) {
        self.cast.clear();
        self.validator.clear();
        info!(scene = BASTON.name(), "scene_unloaded");
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(title(BASTON, ScenePhase::Ready, self.cast.dialogue_line()))
    }
}
