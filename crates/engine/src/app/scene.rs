use super::input::{ActionStates, InputAction};
use super::motion::WanderState;
use crate::walkability::WalkableDebugOverlay;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneKey(pub &'static str);

impl SceneKey {
    pub fn name(self) -> &'static str {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    switch_scene_pressed: bool,
    talk_pressed: bool,
    walkable_debug_pressed: bool,
    actions: ActionStates,
    cursor_position_px: Option<Vec2>,
    left_click_pressed: bool,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        quit_requested: bool,
        switch_scene_pressed: bool,
        talk_pressed: bool,
        walkable_debug_pressed: bool,
        actions: ActionStates,
        cursor_position_px: Option<Vec2>,
        left_click_pressed: bool,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            switch_scene_pressed,
            talk_pressed,
            walkable_debug_pressed,
            actions,
            cursor_position_px,
            left_click_pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn switch_scene_pressed(&self) -> bool {
        self.switch_scene_pressed
    }

    pub fn talk_pressed(&self) -> bool {
        self.talk_pressed
    }

    pub fn walkable_debug_pressed(&self) -> bool {
        self.walkable_debug_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    pub fn with_switch_scene_pressed(mut self, pressed: bool) -> Self {
        self.switch_scene_pressed = pressed;
        self
    }

    pub fn with_talk_pressed(mut self, pressed: bool) -> Self {
        self.talk_pressed = pressed;
        self
    }

    pub fn with_walkable_debug_pressed(mut self, pressed: bool) -> Self {
        self.walkable_debug_pressed = pressed;
        self
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_left_click_pressed(mut self, left_click_pressed: bool) -> Self {
        self.left_click_pressed = left_click_pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn left_click_pressed(&self) -> bool {
        self.left_click_pressed
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Scene-space point in pixels. `y` grows downward, matching image rows.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        Vec2::new(other.x - self.x, other.y - self.y).length()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in scene pixels. All edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl Bounds {
    pub const fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn from_center(center: Vec2, width: f32, height: f32) -> Self {
        let half_w = width * 0.5;
        let half_h = height * 0.5;
        Self::new(
            center.x - half_w,
            center.x + half_w,
            center.y - half_h,
            center.y + half_h,
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min_x, self.max_x.max(self.min_x)),
            point.y.clamp(self.min_y, self.max_y.max(self.min_y)),
        )
    }

    /// Shrinks every edge by `amount`. An axis that would invert collapses to its midpoint.
    pub fn inset(&self, amount: f32) -> Self {
        let (min_x, max_x) = inset_axis(self.min_x, self.max_x, amount);
        let (min_y, max_y) = inset_axis(self.min_y, self.max_y, amount);
        Self::new(min_x, max_x, min_y, max_y)
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }
}

fn inset_axis(min: f32, max: f32, amount: f32) -> (f32, f32) {
    let shrunk_min = min + amount;
    let shrunk_max = max - amount;
    if shrunk_min <= shrunk_max {
        (shrunk_min, shrunk_max)
    } else {
        let mid = (min + max) * 0.5;
        (mid, mid)
    }
}

/// `position` is the scene point shown at the viewport center.
#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub position: Vec2,
}

impl Camera2D {
    /// Centers on `target` but never shows space outside the scene rectangle.
    /// An axis where the viewport is larger than the scene stays centered on the scene.
    pub fn follow_clamped(&mut self, target: Vec2, scene_size: Vec2, viewport: (u32, u32)) {
        self.position = Vec2::new(
            clamp_camera_axis(target.x, scene_size.x, viewport.0 as f32),
            clamp_camera_axis(target.y, scene_size.y, viewport.1 as f32),
        );
    }
}

fn clamp_camera_axis(target: f32, scene_extent: f32, viewport_extent: f32) -> f32 {
    let half = viewport_extent * 0.5;
    if scene_extent <= viewport_extent {
        return scene_extent * 0.5;
    }
    target.clamp(half, scene_extent - half)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Transform {
    pub position: Vec2,
}

impl Transform {
    pub const fn at(position: Vec2) -> Self {
        Self { position }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    /// Static collision geometry: walls, buildings, fallback blockers.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Solid([u8; 4]),
    Sprite(String),
    Hidden,
}

#[derive(Debug, Clone)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub debug_name: &'static str,
}

impl RenderableDesc {
    pub fn solid(color: [u8; 4], debug_name: &'static str) -> Self {
        Self {
            kind: RenderableKind::Solid(color),
            debug_name,
        }
    }

    pub fn hidden(debug_name: &'static str) -> Self {
        Self {
            kind: RenderableKind::Hidden,
            debug_name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OrderState {
    #[default]
    Idle,
    MoveTo {
        point: Vec2,
    },
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub velocity: Vec2,
    pub size: Vec2,
    pub body: BodyKind,
    pub renderable: RenderableDesc,
    pub order_state: OrderState,
    pub wander: Option<WanderState>,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn aabb(&self) -> Bounds {
        Bounds::from_center(self.transform.position, self.size.x, self.size.y)
    }

    pub fn is_zero_sized(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    scene_size: Vec2,
    backdrop: Option<String>,
    walkable_overlay: Option<WalkableDebugOverlay>,
}

impl SceneWorld {
    pub fn spawn_actor(
        &mut self,
        transform: Transform,
        size: Vec2,
        renderable: RenderableDesc,
    ) -> EntityId {
        self.spawn_internal(transform, size, BodyKind::Dynamic, renderable, None)
    }

    pub fn spawn_wanderer(
        &mut self,
        transform: Transform,
        size: Vec2,
        renderable: RenderableDesc,
        wander: WanderState,
    ) -> EntityId {
        self.spawn_internal(
            transform,
            size,
            BodyKind::Dynamic,
            renderable,
            Some(wander),
        )
    }

    pub fn spawn_fixed(&mut self, bounds: Bounds, renderable: RenderableDesc) -> EntityId {
        self.spawn_internal(
            Transform::at(bounds.center()),
            Vec2::new(bounds.width(), bounds.height()),
            BodyKind::Fixed,
            renderable,
            None,
        )
    }

    fn spawn_internal(
        &mut self,
        transform: Transform,
        size: Vec2,
        body: BodyKind,
        renderable: RenderableDesc,
        wander: Option<WanderState>,
    ) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            transform,
            velocity: Vec2::ZERO,
            size,
            body,
            renderable,
            order_state: OrderState::Idle,
            wander,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_unstable();
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            self.entities
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_spawns
                .retain(|entity| pending.binary_search(&entity.id).is_err());
            self.pending_despawns.clear();
        }

        if !self.pending_spawns.is_empty() {
            for mut entity in self.pending_spawns.drain(..) {
                entity.applied_spawn_order = self.next_applied_spawn_order;
                self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
                self.entities.push(entity);
            }
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
        self.backdrop = None;
        self.walkable_overlay = None;
    }

    pub fn set_scene_size(&mut self, width: u32, height: u32) {
        self.scene_size = Vec2::new(width as f32, height as f32);
    }

    pub fn scene_size(&self) -> Vec2 {
        self.scene_size
    }

    pub fn scene_bounds(&self) -> Bounds {
        Bounds::new(0.0, self.scene_size.x, 0.0, self.scene_size.y)
    }

    /// Asset-relative path of the image drawn under everything else.
    pub fn set_backdrop(&mut self, asset_path: impl Into<String>) {
        self.backdrop = Some(asset_path.into());
    }

    pub fn backdrop(&self) -> Option<&str> {
        self.backdrop.as_deref()
    }

    pub fn show_walkable_overlay(&mut self, overlay: WalkableDebugOverlay) {
        self.walkable_overlay = Some(overlay);
    }

    pub fn hide_walkable_overlay(&mut self) -> bool {
        self.walkable_overlay.take().is_some()
    }

    pub fn walkable_overlay(&self) -> Option<&WalkableDebugOverlay> {
        self.walkable_overlay.as_ref()
    }

    pub fn tick_walkable_overlay(&mut self, fixed_dt_seconds: f32) {
        let expired = self
            .walkable_overlay
            .as_mut()
            .is_some_and(|overlay| !overlay.tick(fixed_dt_seconds));
        if expired {
            self.walkable_overlay = None;
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    key: SceneKey,
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

pub(crate) struct SceneMachine {
    runtimes: Vec<SceneRuntime>,
    active_index: usize,
}

impl SceneMachine {
    /// Returns `None` when `scenes` is empty. An unknown `active_scene` starts on the first scene.
    pub(crate) fn new(
        scenes: Vec<(SceneKey, Box<dyn Scene>)>,
        active_scene: SceneKey,
    ) -> Option<Self> {
        if scenes.is_empty() {
            return None;
        }
        let runtimes: Vec<SceneRuntime> = scenes
            .into_iter()
            .map(|(key, scene)| SceneRuntime {
                key,
                scene,
                world: SceneWorld::default(),
                is_loaded: false,
            })
            .collect();
        let active_index = runtimes
            .iter()
            .position(|runtime| runtime.key == active_scene)
            .unwrap_or(0);
        Some(Self {
            runtimes,
            active_index,
        })
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_runtime_ref().key
    }

    pub(crate) fn load_active(&mut self) {
        self.load_index_if_needed(self.active_index);
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.update(fixed_dt_seconds, input, world)
    }

    pub(crate) fn apply_pending_active(&mut self) {
        self.active_runtime_mut().world.apply_pending();
    }

    pub(crate) fn render_active(&mut self) {
        let runtime = self.active_runtime_mut();
        runtime.scene.render(&runtime.world);
    }

    pub(crate) fn active_world(&self) -> &SceneWorld {
        &self.active_runtime_ref().world
    }

    #[cfg(test)]
    pub(crate) fn active_world_mut(&mut self) -> &mut SceneWorld {
        &mut self.active_runtime_mut().world
    }

    pub(crate) fn debug_title_active(&self) -> Option<String> {
        let runtime = self.active_runtime_ref();
        runtime.scene.debug_title(&runtime.world)
    }

    pub(crate) fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        let Some(next_index) = self.index_of(next_scene) else {
            return false;
        };
        if self.active_index == next_index {
            return false;
        }

        self.load_index_if_needed(next_index);
        self.active_index = next_index;
        true
    }

    pub(crate) fn shutdown_all(&mut self) {
        for runtime in &mut self.runtimes {
            if runtime.is_loaded {
                let (scene, world) = (&mut runtime.scene, &mut runtime.world);
                scene.unload(world);
                runtime.world.clear();
                runtime.is_loaded = false;
            }
        }
    }

    fn load_index_if_needed(&mut self, index: usize) {
        let runtime = &mut self.runtimes[index];
        if runtime.is_loaded {
            return;
        }
        {
            let (scene, world) = (&mut runtime.scene, &mut runtime.world);
            scene.load(world);
        }
        runtime.is_loaded = true;
    }

    fn index_of(&self, key: SceneKey) -> Option<usize> {
        self.runtimes.iter().position(|runtime| runtime.key == key)
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        &mut self.runtimes[self.active_index]
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        &self.runtimes[self.active_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_A: SceneKey = SceneKey("a");
    const KEY_B: SceneKey = SceneKey("b");
    const KEY_C: SceneKey = SceneKey("c");

    struct TestScene {
        spawn_count: usize,
    }

    impl Scene for TestScene {
        fn load(&mut self, world: &mut SceneWorld) {
            for _ in 0..self.spawn_count {
                world.spawn_actor(
                    Transform::default(),
                    Vec2::new(16.0, 16.0),
                    RenderableDesc::solid([255, 255, 255, 255], "test"),
                );
            }
            world.apply_pending();
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            SceneCommand::None
        }

        fn render(&mut self, _world: &SceneWorld) {}

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    struct SteppingScene {
        spawn_count: usize,
        step_x: f32,
    }

    impl Scene for SteppingScene {
        fn load(&mut self, world: &mut SceneWorld) {
            for _ in 0..self.spawn_count {
                world.spawn_actor(
                    Transform::default(),
                    Vec2::new(16.0, 16.0),
                    RenderableDesc::solid([255, 255, 255, 255], "stepper"),
                );
            }
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            world: &mut SceneWorld,
        ) -> SceneCommand {
            for entity in world.entities_mut() {
                entity.transform.position.x += self.step_x;
            }
            SceneCommand::None
        }

        fn render(&mut self, _world: &SceneWorld) {}

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    fn machine_of(
        scenes: Vec<(SceneKey, Box<dyn Scene>)>,
        active: SceneKey,
    ) -> SceneMachine {
        SceneMachine::new(scenes, active).expect("machine")
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn scene_world_spawn_and_despawn_updates_count() {
        let mut world = SceneWorld::default();
        let id = world.spawn_actor(
            Transform::default(),
            Vec2::new(16.0, 16.0),
            RenderableDesc::solid([255, 0, 0, 255], "spawned"),
        );
        world.apply_pending();
        assert_eq!(world.entity_count(), 1);

        world.despawn(id);
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn despawn_before_apply_drops_pending_spawn() {
        let mut world = SceneWorld::default();
        let id = world.spawn_actor(
            Transform::default(),
            Vec2::new(16.0, 16.0),
            RenderableDesc::solid([255, 0, 0, 255], "short_lived"),
        );
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn duplicate_pending_despawns_are_idempotent() {
        let mut world = SceneWorld::default();
        let doomed = world.spawn_actor(
            Transform::default(),
            Vec2::new(16.0, 16.0),
            RenderableDesc::solid([255, 0, 0, 255], "doomed"),
        );
        let survivor = world.spawn_fixed(
            Bounds::new(0.0, 10.0, 0.0, 10.0),
            RenderableDesc::hidden("wall"),
        );
        world.apply_pending();

        assert!(world.despawn(doomed));
        assert!(world.despawn(doomed));
        world.apply_pending();

        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(doomed).is_none());
        assert!(world.find_entity(survivor).is_some());
    }

    #[test]
    fn spawn_fixed_centers_body_on_bounds() {
        let mut world = SceneWorld::default();
        let id = world.spawn_fixed(
            Bounds::new(-50.0, 0.0, 0.0, 1024.0),
            RenderableDesc::hidden("left_wall"),
        );
        world.apply_pending();

        let wall = world.find_entity(id).expect("wall");
        assert_eq!(wall.body, BodyKind::Fixed);
        assert_eq!(wall.transform.position, Vec2::new(-25.0, 512.0));
        assert_eq!(wall.size, Vec2::new(50.0, 1024.0));
        assert_eq!(wall.aabb(), Bounds::new(-50.0, 0.0, 0.0, 1024.0));
    }

    #[test]
    fn entities_enumerate_in_spawn_order() {
        let mut world = SceneWorld::default();
        let ids: Vec<EntityId> = (0..4)
            .map(|_| {
                world.spawn_actor(
                    Transform::default(),
                    Vec2::new(4.0, 4.0),
                    RenderableDesc::hidden("ordered"),
                )
            })
            .collect();
        world.apply_pending();

        let seen: Vec<EntityId> = world.entities().iter().map(|entity| entity.id).collect();
        assert_eq!(seen, ids);
        assert!(world
            .entities()
            .windows(2)
            .all(|pair| pair[0].applied_spawn_order() < pair[1].applied_spawn_order()));
    }

    #[test]
    fn bounds_inset_collapses_instead_of_inverting() {
        let bounds = Bounds::new(0.0, 60.0, 0.0, 200.0);
        let inset = bounds.inset(40.0);
        assert_eq!(inset.min_x, 30.0);
        assert_eq!(inset.max_x, 30.0);
        assert_eq!(inset.min_y, 40.0);
        assert_eq!(inset.max_y, 160.0);
    }

    #[test]
    fn bounds_contains_is_inclusive() {
        let road = Bounds::new(0.0, 1536.0, 472.0, 552.0);
        assert!(road.contains(Vec2::new(0.0, 472.0)));
        assert!(road.contains(Vec2::new(1536.0, 552.0)));
        assert!(!road.contains(Vec2::new(10.0, 471.9)));
    }

    #[test]
    fn camera_follow_stays_inside_scene() {
        let mut camera = Camera2D::default();
        let scene = Vec2::new(1536.0, 1024.0);

        camera.follow_clamped(Vec2::new(10.0, 10.0), scene, (800, 600));
        assert_eq!(camera.position, Vec2::new(400.0, 300.0));

        camera.follow_clamped(Vec2::new(1530.0, 1020.0), scene, (800, 600));
        assert_eq!(camera.position, Vec2::new(1136.0, 724.0));

        camera.follow_clamped(Vec2::new(10.0, 10.0), scene, (2000, 600));
        assert_eq!(camera.position.x, 768.0);
    }

    #[test]
    fn switch_away_and_back_preserves_entity_ids_and_transforms() {
        let mut machine = machine_of(
            vec![
                (KEY_A, Box::new(TestScene { spawn_count: 2 })),
                (KEY_B, Box::new(TestScene { spawn_count: 1 })),
            ],
            KEY_A,
        );
        machine.load_active();
        machine.apply_pending_active();

        machine.active_world_mut().entities_mut()[0].transform.position = Vec2::new(2.5, -1.0);
        let before: Vec<(u64, Vec2)> = machine
            .active_world()
            .entities()
            .iter()
            .map(|entity| (entity.id.0, entity.transform.position))
            .collect();

        assert!(machine.switch_to(KEY_B));
        machine.apply_pending_active();
        assert!(machine.switch_to(KEY_A));
        machine.apply_pending_active();

        let after: Vec<(u64, Vec2)> = machine
            .active_world()
            .entities()
            .iter()
            .map(|entity| (entity.id.0, entity.transform.position))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn inactive_scene_world_does_not_advance() {
        let mut machine = machine_of(
            vec![
                (
                    KEY_A,
                    Box::new(SteppingScene {
                        spawn_count: 1,
                        step_x: 1.0,
                    }),
                ),
                (
                    KEY_B,
                    Box::new(SteppingScene {
                        spawn_count: 1,
                        step_x: 3.0,
                    }),
                ),
            ],
            KEY_A,
        );
        machine.load_active();
        machine.apply_pending_active();

        let _ = machine.update_active(1.0 / 60.0, &InputSnapshot::empty());
        let before_switch = machine.active_world().entities()[0].transform.position.x;

        assert!(machine.switch_to(KEY_B));
        machine.apply_pending_active();
        for _ in 0..10 {
            let _ = machine.update_active(1.0 / 60.0, &InputSnapshot::empty());
        }

        assert!(machine.switch_to(KEY_A));
        let after_return = machine.active_world().entities()[0].transform.position.x;
        assert_eq!(before_switch, after_return);
    }

    #[test]
    fn switching_to_unknown_or_active_scene_is_rejected() {
        let mut machine = machine_of(
            vec![
                (KEY_A, Box::new(TestScene { spawn_count: 0 })),
                (KEY_B, Box::new(TestScene { spawn_count: 0 })),
            ],
            KEY_A,
        );
        machine.load_active();

        assert!(!machine.switch_to(KEY_A));
        assert!(!machine.switch_to(KEY_C));
        assert_eq!(machine.active_scene(), KEY_A);
    }

    #[test]
    fn machine_cycles_through_three_scenes() {
        let mut machine = machine_of(
            vec![
                (KEY_A, Box::new(TestScene { spawn_count: 1 })),
                (KEY_B, Box::new(TestScene { spawn_count: 2 })),
                (KEY_C, Box::new(TestScene { spawn_count: 3 })),
            ],
            KEY_A,
        );
        machine.load_active();

        for (key, expected) in [(KEY_B, 2), (KEY_C, 3), (KEY_A, 1)] {
            assert!(machine.switch_to(key));
            machine.apply_pending_active();
            assert_eq!(machine.active_world().entity_count(), expected);
        }
    }

    #[test]
    fn empty_scene_list_has_no_machine() {
        assert!(SceneMachine::new(Vec::new(), KEY_A).is_none());
    }

    #[test]
    fn unknown_initial_scene_falls_back_to_first() {
        let machine = machine_of(
            vec![(KEY_B, Box::new(TestScene { spawn_count: 0 }))],
            KEY_A,
        );
        assert_eq!(machine.active_scene(), KEY_B);
    }
}
