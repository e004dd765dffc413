mod input;
mod loop_runner;
mod motion;
mod physics;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use motion::{
    advance_wanderers, step_move_order, MoveOrderStep, WanderState, WanderStep,
    WANDER_RETARGET_MAX_SECONDS, WANDER_RETARGET_MIN_SECONDS,
};
pub use physics::{resolve_static_overlaps, StaticContact};
pub use rendering::{screen_to_world_px, world_to_screen_px, Renderer, Viewport};
pub use scene::{
    BodyKind, Bounds, Camera2D, Entity, EntityId, InputSnapshot, OrderState, RenderableDesc,
    RenderableKind, Scene, SceneCommand, SceneKey, SceneWorld, Transform, Vec2,
};
