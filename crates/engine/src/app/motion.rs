use std::f32::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::scene::{BodyKind, Bounds, SceneWorld, Vec2};

pub const WANDER_RETARGET_MIN_SECONDS: f32 = 2.0;
pub const WANDER_RETARGET_MAX_SECONDS: f32 = 5.0;

/// Autonomous roaming inside a fixed rectangle.
///
/// The heading is re-rolled every 2 to 5 seconds and mirrored whenever the next step
/// would leave `bounds`. While paused the retarget timer does not advance.
#[derive(Debug, Clone)]
pub struct WanderState {
    bounds: Bounds,
    speed: f32,
    heading: Vec2,
    retarget_in_seconds: f32,
    paused: bool,
    redirect_requested: bool,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WanderStep {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl WanderState {
    pub fn new(bounds: Bounds, speed_px_per_second: f32, seed: u64) -> Self {
        let mut state = Self {
            bounds,
            speed: speed_px_per_second.max(0.0),
            heading: Vec2::ZERO,
            retarget_in_seconds: 0.0,
            paused: false,
            redirect_requested: false,
            rng: StdRng::seed_from_u64(seed),
        };
        state.pick_heading();
        state
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn heading(&self) -> Vec2 {
        self.heading
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn retarget_in_seconds(&self) -> f32 {
        self.retarget_in_seconds
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Picks a fresh heading on the next unpaused step.
    pub fn request_redirect(&mut self) {
        self.redirect_requested = true;
    }

    pub fn step(&mut self, position: Vec2, fixed_dt_seconds: f32) -> WanderStep {
        if self.paused {
            return WanderStep {
                position,
                velocity: Vec2::ZERO,
            };
        }

        self.retarget_in_seconds -= fixed_dt_seconds;
        if self.redirect_requested || self.retarget_in_seconds <= 0.0 {
            self.pick_heading();
        }

        let mut next = Vec2::new(
            position.x + self.heading.x * self.speed * fixed_dt_seconds,
            position.y + self.heading.y * self.speed * fixed_dt_seconds,
        );
        if next.x <= self.bounds.min_x {
            self.heading.x = self.heading.x.abs();
        } else if next.x >= self.bounds.max_x {
            self.heading.x = -self.heading.x.abs();
        }
        if next.y <= self.bounds.min_y {
            self.heading.y = self.heading.y.abs();
        } else if next.y >= self.bounds.max_y {
            self.heading.y = -self.heading.y.abs();
        }
        next = self.bounds.clamp(next);

        WanderStep {
            position: next,
            velocity: Vec2::new(self.heading.x * self.speed, self.heading.y * self.speed),
        }
    }

    fn pick_heading(&mut self) {
        let angle = self.rng.gen_range(0.0..TAU);
        self.heading = Vec2::new(angle.cos(), angle.sin());
        self.retarget_in_seconds = self
            .rng
            .gen_range(WANDER_RETARGET_MIN_SECONDS..=WANDER_RETARGET_MAX_SECONDS);
        self.redirect_requested = false;
    }
}

/// Moves every unpaused wanderer one tick and writes back its velocity.
pub fn advance_wanderers(world: &mut SceneWorld, fixed_dt_seconds: f32) {
    for entity in world.entities_mut() {
        if entity.body != BodyKind::Dynamic {
            continue;
        }
        let Some(wander) = entity.wander.as_mut() else {
            continue;
        };
        let step = wander.step(entity.transform.position, fixed_dt_seconds);
        entity.transform.position = step.position;
        entity.velocity = step.velocity;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOrderStep {
    pub position: Vec2,
    pub arrived: bool,
}

/// One fixed-length step toward `target`. Arrival is reported, without moving,
/// once the target is closer than a single step.
pub fn step_move_order(position: Vec2, target: Vec2, step_px: f32) -> MoveOrderStep {
    let dx = target.x - position.x;
    let dy = target.y - position.y;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance < step_px || distance <= f32::EPSILON {
        return MoveOrderStep {
            position,
            arrived: true,
        };
    }
    MoveOrderStep {
        position: Vec2::new(
            position.x + dx / distance * step_px,
            position.y + dy / distance * step_px,
        ),
        arrived: false,
    }
}
