use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::map::WalkableMap;
use crate::app::{BodyKind, Bounds, Entity, EntityId, OrderState, SceneWorld, Vec2};

/// Anything that can answer whether a body may stand at a point.
pub trait WalkArea {
    fn is_position_walkable(&self, position: Vec2) -> bool;
}

/// Square neighborhood that must be fully clear around a tested point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborhoodSampler {
    pub radius: u32,
    pub step: u32,
}

impl Default for NeighborhoodSampler {
    fn default() -> Self {
        Self { radius: 6, step: 2 }
    }
}

impl NeighborhoodSampler {
    /// Samples are floored to cells. Samples off the map are skipped, but the center
    /// itself must lie on the map.
    pub fn is_clear(&self, map: &WalkableMap, position: Vec2) -> bool {
        if !position.is_finite() {
            return false;
        }
        let on_map = |x: i64, y: i64| {
            (0..map.width() as i64).contains(&x) && (0..map.height() as i64).contains(&y)
        };
        let center = (position.x.floor() as i64, position.y.floor() as i64);
        if !on_map(center.0, center.1) {
            return false;
        }
        let radius = self.radius as i64;
        let step = self.step.max(1) as usize;
        for dy in (-radius..=radius).step_by(step) {
            for dx in (-radius..=radius).step_by(step) {
                let x = (position.x + dx as f32).floor() as i64;
                let y = (position.y + dy as f32).floor() as i64;
                if on_map(x, y) && !map.is_walkable_at(x, y) {
                    return false;
                }
            }
        }
        true
    }
}

impl WalkArea for WalkableMap {
    fn is_position_walkable(&self, position: Vec2) -> bool {
        NeighborhoodSampler::default().is_clear(self, position)
    }
}

/// Declared geometry such as a road band. Edges are inclusive.
impl WalkArea for Bounds {
    fn is_position_walkable(&self, position: Vec2) -> bool {
        self.contains(position)
    }
}

/// Something in flight that can be told to drop its current movement intent.
pub trait Haltable {
    fn cancel_movement(&mut self);
}

/// A body the validator can observe and correct.
pub trait TrackedBody {
    fn body_id(&self) -> EntityId;
    fn position(&self) -> Vec2;
    fn place(&mut self, position: Vec2);
    fn stop(&mut self);
    /// Static collision geometry and zero-sized bodies are never validated.
    fn is_validation_exempt(&self) -> bool;
    fn as_haltable(&mut self) -> Option<&mut dyn Haltable> {
        None
    }
}

impl Haltable for Entity {
    fn cancel_movement(&mut self) {
        self.order_state = OrderState::Idle;
        if let Some(wander) = self.wander.as_mut() {
            wander.request_redirect();
        }
    }
}

impl TrackedBody for Entity {
    fn body_id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> Vec2 {
        self.transform.position
    }

    fn place(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
    }

    fn is_validation_exempt(&self) -> bool {
        self.body == BodyKind::Fixed || self.is_zero_sized()
    }

    fn as_haltable(&mut self) -> Option<&mut dyn Haltable> {
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// First observation; the current position is recorded as-is.
    Bootstrapped,
    Accepted,
    Reverted { from: Vec2, to: Vec2 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub bootstrapped: u32,
    pub accepted: u32,
    pub reverted: Vec<EntityId>,
}

impl ValidationReport {
    fn record(&mut self, id: EntityId, verdict: Verdict) {
        match verdict {
            Verdict::Bootstrapped => self.bootstrapped += 1,
            Verdict::Accepted => self.accepted += 1,
            Verdict::Reverted { .. } => self.reverted.push(id),
        }
    }
}

/// Per-tick rollback of bodies that step onto non-walkable ground.
///
/// Owns the last position at which each body was accepted. That table is written only
/// by [`MovementValidator::validate_body`], and every stored position was valid when it
/// was stored (or was the body's first observed position).
#[derive(Debug, Default)]
pub struct MovementValidator {
    last_valid: HashMap<EntityId, Vec2>,
}

impl MovementValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_valid(&self, id: EntityId) -> Option<Vec2> {
        self.last_valid.get(&id).copied()
    }

    pub fn tracked_count(&self) -> usize {
        self.last_valid.len()
    }

    pub fn forget(&mut self, id: EntityId) -> bool {
        self.last_valid.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.last_valid.clear();
    }

    /// Returns `None` for exempt bodies.
    pub fn validate_body<A, B>(&mut self, area: &A, body: &mut B) -> Option<Verdict>
    where
        A: WalkArea + ?Sized,
        B: TrackedBody + ?Sized,
    {
        if body.is_validation_exempt() {
            return None;
        }
        let id = body.body_id();
        let current = body.position();

        let Some(last_valid) = self.last_valid.get(&id).copied() else {
            self.last_valid.insert(id, current);
            return Some(Verdict::Bootstrapped);
        };

        if area.is_position_walkable(current) {
            self.last_valid.insert(id, current);
            return Some(Verdict::Accepted);
        }

        body.place(last_valid);
        body.stop();
        if let Some(haltable) = body.as_haltable() {
            haltable.cancel_movement();
        }
        debug!(
            entity = id.0,
            from_x = current.x,
            from_y = current.y,
            to_x = last_valid.x,
            to_y = last_valid.y,
            "movement_reverted"
        );
        Some(Verdict::Reverted {
            from: current,
            to: last_valid,
        })
    }

    /// Validates bodies in the given order. No body's result depends on another's.
    pub fn validate<'a, A, B, I>(&mut self, area: &A, bodies: I) -> ValidationReport
    where
        A: WalkArea + ?Sized,
        B: TrackedBody + 'a,
        I: IntoIterator<Item = &'a mut B>,
    {
        let mut report = ValidationReport::default();
        for body in bodies {
            if let Some(verdict) = self.validate_body(area, &mut *body) {
                report.record(body.body_id(), verdict);
            }
        }
        report
    }

    /// Validates every entity in enumeration order and drops shadows of despawned ones.
    pub fn validate_world<A>(&mut self, area: &A, world: &mut SceneWorld) -> ValidationReport
    where
        A: WalkArea + ?Sized,
    {
        let present: HashSet<EntityId> = world.entities().iter().map(|entity| entity.id).collect();
        self.last_valid.retain(|id, _| present.contains(id));
        self.validate(area, world.entities_mut().iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{RenderableDesc, Transform, WanderState};

    fn island_map() -> WalkableMap {
        // Walkable square from 400 to 600 on both axes inside a 1024x1024 scene.
        WalkableMap::from_fn(1024, 1024, |x, y| {
            (400..600).contains(&x) && (400..600).contains(&y)
        })
    }

    fn spawn_player(world: &mut SceneWorld, at: Vec2) -> EntityId {
        let id = world.spawn_actor(
            Transform::at(at),
            Vec2::new(16.0, 16.0),
            RenderableDesc::hidden("player"),
        );
        world.apply_pending();
        id
    }

    #[test]
    fn step_check_requires_whole_neighborhood() {
        let map = island_map();
        assert!(map.is_position_walkable(Vec2::new(500.0, 500.0)));
        assert!(map.is_position_walkable(Vec2::new(406.0, 406.0)));
        assert!(!map.is_position_walkable(Vec2::new(405.0, 500.0)));
        assert!(!map.is_position_walkable(Vec2::new(10.0, 10.0)));
    }

    #[test]
    fn step_check_skips_off_map_samples_but_not_an_off_map_center() {
        let map = WalkableMap::from_fn(64, 64, |_, _| true);
        assert!(map.is_position_walkable(Vec2::new(32.0, 32.0)));
        assert!(map.is_position_walkable(Vec2::new(2.0, 32.0)));
        assert!(map.is_position_walkable(Vec2::new(0.0, 63.5)));
        assert!(!map.is_position_walkable(Vec2::new(-1.0, 32.0)));
        assert!(!map.is_position_walkable(Vec2::new(32.0, 64.0)));
        assert!(!map.is_position_walkable(Vec2::new(f32::NAN, 32.0)));
    }

    #[test]
    fn first_observation_is_recorded_verbatim_without_rollback() {
        let map = island_map();
        let mut world = SceneWorld::default();
        let player = spawn_player(&mut world, Vec2::new(10.0, 10.0));
        let mut validator = MovementValidator::new();

        let report = validator.validate_world(&map, &mut world);

        assert_eq!(report.bootstrapped, 1);
        assert!(report.reverted.is_empty());
        assert_eq!(validator.last_valid(player), Some(Vec2::new(10.0, 10.0)));
        assert_eq!(
            world.find_entity(player).expect("player").transform.position,
            Vec2::new(10.0, 10.0)
        );
    }

    #[test]
    fn illegal_move_reverts_stops_and_clears_click_target() {
        let map = island_map();
        let mut world = SceneWorld::default();
        let player = spawn_player(&mut world, Vec2::new(500.0, 500.0));
        let mut validator = MovementValidator::new();
        validator.validate_world(&map, &mut world);
        validator.validate_world(&map, &mut world);

        {
            let entity = world.find_entity_mut(player).expect("player");
            entity.transform.position = Vec2::new(10.0, 10.0);
            entity.velocity = Vec2::new(-120.0, -120.0);
            entity.order_state = OrderState::MoveTo {
                point: Vec2::new(0.0, 0.0),
            };
        }
        let report = validator.validate_world(&map, &mut world);

        assert_eq!(report.reverted, vec![player]);
        let entity = world.find_entity(player).expect("player");
        assert_eq!(entity.transform.position, Vec2::new(500.0, 500.0));
        assert_eq!(entity.velocity, Vec2::ZERO);
        assert_eq!(entity.order_state, OrderState::Idle);
        assert_eq!(validator.last_valid(player), Some(Vec2::new(500.0, 500.0)));
    }

    #[test]
    fn rollback_target_is_last_accepted_position_not_bootstrap() {
        let map = island_map();
        let mut world = SceneWorld::default();
        let player = spawn_player(&mut world, Vec2::new(450.0, 450.0));
        let mut validator = MovementValidator::new();
        validator.validate_world(&map, &mut world);

        world.find_entity_mut(player).expect("player").transform.position =
            Vec2::new(520.0, 480.0);
        assert_eq!(validator.validate_world(&map, &mut world).accepted, 1);

        world.find_entity_mut(player).expect("player").transform.position =
            Vec2::new(700.0, 480.0);
        validator.validate_world(&map, &mut world);

        assert_eq!(
            world.find_entity(player).expect("player").transform.position,
            Vec2::new(520.0, 480.0)
        );
    }

    #[test]
    fn fixed_and_zero_sized_bodies_are_exempt() {
        let map = island_map();
        let mut world = SceneWorld::default();
        let wall = world.spawn_fixed(
            Bounds::new(0.0, 50.0, 0.0, 1024.0),
            RenderableDesc::hidden("wall"),
        );
        let marker = world.spawn_actor(
            Transform::at(Vec2::new(5.0, 5.0)),
            Vec2::ZERO,
            RenderableDesc::hidden("marker"),
        );
        world.apply_pending();
        let mut validator = MovementValidator::new();

        let report = validator.validate_world(&map, &mut world);

        assert_eq!(report, ValidationReport::default());
        assert_eq!(validator.last_valid(wall), None);
        assert_eq!(validator.last_valid(marker), None);
    }

    #[test]
    fn paused_wanderer_is_still_protected() {
        let map = island_map();
        let mut world = SceneWorld::default();
        let mut wander = WanderState::new(Bounds::new(420.0, 580.0, 420.0, 580.0), 30.0, 1);
        wander.pause();
        let sally = world.spawn_wanderer(
            Transform::at(Vec2::new(500.0, 500.0)),
            Vec2::new(16.0, 16.0),
            RenderableDesc::hidden("sally"),
            wander,
        );
        world.apply_pending();
        let mut validator = MovementValidator::new();
        validator.validate_world(&map, &mut world);

        for _ in 0..120 {
            crate::app::advance_wanderers(&mut world, 1.0 / 60.0);
            validator.validate_world(&map, &mut world);
        }
        assert_eq!(
            world.find_entity(sally).expect("sally").transform.position,
            Vec2::new(500.0, 500.0)
        );

        world.find_entity_mut(sally).expect("sally").transform.position = Vec2::new(50.0, 50.0);
        let report = validator.validate_world(&map, &mut world);

        assert_eq!(report.reverted, vec![sally]);
        let entity = world.find_entity(sally).expect("sally");
        assert_eq!(entity.transform.position, Vec2::new(500.0, 500.0));
        assert!(entity.wander.as_ref().is_some_and(WanderState::is_paused));
    }

    #[test]
    fn despawned_entities_are_forgotten() {
        let map = island_map();
        let mut world = SceneWorld::default();
        let player = spawn_player(&mut world, Vec2::new(500.0, 500.0));
        let mut validator = MovementValidator::new();
        validator.validate_world(&map, &mut world);
        assert_eq!(validator.tracked_count(), 1);

        world.despawn(player);
        world.apply_pending();
        validator.validate_world(&map, &mut world);
        assert_eq!(validator.tracked_count(), 0);
    }

    #[test]
    fn road_bounds_act_as_walk_area() {
        let road = Bounds::new(0.0, 1536.0, 472.0, 552.0);
        let mut world = SceneWorld::default();
        let player = spawn_player(&mut world, Vec2::new(768.0, 512.0));
        let mut validator = MovementValidator::new();
        validator.validate_world(&road, &mut world);

        world.find_entity_mut(player).expect("player").transform.position =
            Vec2::new(768.0, 400.0);
        let report = validator.validate_world(&road, &mut world);

        assert_eq!(report.reverted, vec![player]);
        assert_eq!(
            world.find_entity(player).expect("player").transform.position,
            Vec2::new(768.0, 512.0)
        );
    }

    struct Crate {
        id: EntityId,
        position: Vec2,
        stopped: bool,
    }

    impl TrackedBody for Crate {
        fn body_id(&self) -> EntityId {
            self.id
        }

        fn position(&self) -> Vec2 {
            self.position
        }

        fn place(&mut self, position: Vec2) {
            self.position = position;
        }

        fn stop(&mut self) {
            self.stopped = true;
        }

        fn is_validation_exempt(&self) -> bool {
            false
        }
    }

    #[test]
    fn bodies_without_halt_capability_are_still_rolled_back() {
        let area = Bounds::new(0.0, 100.0, 0.0, 100.0);
        let mut crates = vec![Crate {
            id: EntityId(9),
            position: Vec2::new(50.0, 50.0),
            stopped: false,
        }];
        let mut validator = MovementValidator::new();
        validator.validate(&area, crates.iter_mut());

        crates[0].position = Vec2::new(150.0, 50.0);
        let report = validator.validate(&area, crates.iter_mut());

        assert_eq!(report.reverted, vec![EntityId(9)]);
        assert_eq!(crates[0].position, Vec2::new(50.0, 50.0));
        assert!(crates[0].stopped);
    }
}
