use std::sync::Arc;

use engine::walkability::{MovementValidator, WalkArea};
use engine::{
    advance_wanderers, resolve_static_overlaps, screen_to_world_px, step_move_order, Bounds,
    EntityId, InputAction, InputSnapshot, OrderState, RenderableDesc, SceneWorld, Transform, Vec2,
    Viewport, WanderState,
};
use tracing::{info, warn};

use super::dialogue::{
    ChatSession, DialogueDispatcher, DialogueSource, DialogueTicket, TicketPoll,
};

pub(crate) const PLAYER_STEP_PX: f32 = 2.0;
pub(crate) const TALK_RANGE_PX: f32 = 30.0;
pub(crate) const NPC_WANDER_SPEED: f32 = 30.0;
pub(crate) const NPC_BOUNDS_INSET: f32 = 40.0;

const PLAYER_SIZE: Vec2 = Vec2::new(24.0, 32.0);
const NPC_SIZE: Vec2 = Vec2::new(24.0, 32.0);
const PLAYER_COLOR: [u8; 4] = [66, 135, 245, 255];
const NPC_COLOR: [u8; 4] = [235, 120, 190, 255];

struct Npc {
    id: EntityId,
    source: Arc<dyn DialogueSource>,
}

enum Conversation {
    Idle,
    Requesting {
        npc: EntityId,
        ticket: DialogueTicket,
    },
    Active {
        npc: EntityId,
        session: ChatSession,
    },
}

/// The player and the NPCs of one scene, plus the conversation they are having.
pub(crate) struct Cast {
    player: Option<EntityId>,
    npcs: Vec<Npc>,
    conversation: Conversation,
    dispatcher: DialogueDispatcher,
}

impl Cast {
    pub(crate) fn new(dispatcher: DialogueDispatcher) -> Self {
        Self {
            player: None,
            npcs: Vec::new(),
            conversation: Conversation::Idle,
            dispatcher,
        }
    }

    pub(crate) fn player(&self) -> Option<EntityId> {
        self.player
    }

    pub(crate) fn spawn_player(&mut self, world: &mut SceneWorld, at: Vec2) -> EntityId {
        let id = world.spawn_actor(
            Transform::at(at),
            PLAYER_SIZE,
            RenderableDesc::solid(PLAYER_COLOR, "player"),
        );
        self.player = Some(id);
        id
    }

    pub(crate) fn spawn_npc(
        &mut self,
        world: &mut SceneWorld,
        at: Vec2,
        wander_bounds: Bounds,
        seed: u64,
        source: Arc<dyn DialogueSource>,
    ) -> EntityId {
        let id = world.spawn_wanderer(
            Transform::at(at),
            NPC_SIZE,
            RenderableDesc::solid(NPC_COLOR, "npc"),
            WanderState::new(wander_bounds, NPC_WANDER_SPEED, seed),
        );
        info!(
            npc = source.npc_name(),
            x = at.x,
            y = at.y,
            min_x = wander_bounds.min_x,
            max_x = wander_bounds.max_x,
            min_y = wander_bounds.min_y,
            max_y = wander_bounds.max_y,
            "npc_spawned"
        );
        self.npcs.push(Npc { id, source });
        id
    }

    /// Forgets every actor. An in-flight dialogue request is abandoned.
    pub(crate) fn clear(&mut self) {
        self.player = None;
        self.npcs.clear();
        self.conversation = Conversation::Idle;
    }

    pub(crate) fn is_conversing(&self) -> bool {
        !matches!(self.conversation, Conversation::Idle)
    }

    pub(crate) fn dialogue_line(&self) -> Option<String> {
        match &self.conversation {
            Conversation::Idle => None,
            Conversation::Requesting { ticket, .. } => Some(format!("{} ...", ticket.npc_name())),
            Conversation::Active { session, .. } => session
                .current()
                .map(|message| format!("{}: {}", message.speaker, message.text)),
        }
    }

    /// One gameplay tick after input sampling, in a fixed order: dialogue, player intent,
    /// motion, static collision, movement validation, camera.
    pub(crate) fn tick(
        &mut self,
        world: &mut SceneWorld,
        input: &InputSnapshot,
        fixed_dt_seconds: f32,
        validation: Option<(&dyn WalkArea, &mut MovementValidator)>,
    ) {
        self.tick_dialogue(world, input, fixed_dt_seconds);
        self.apply_player_intent(world, input);
        self.advance_move_orders(world);
        advance_wanderers(world, fixed_dt_seconds);
        self.react_to_contacts(world);
        if let Some((area, validator)) = validation {
            validator.validate_world(area, world);
        }
        self.follow_player(world, input);
    }

    fn tick_dialogue(&mut self, world: &mut SceneWorld, input: &InputSnapshot, dt: f32) {
        let conversation = std::mem::replace(&mut self.conversation, Conversation::Idle);
        self.conversation = match conversation {
            Conversation::Idle if input.talk_pressed() => self.start_talking(world),
            Conversation::Idle => Conversation::Idle,
            Conversation::Requesting { npc, mut ticket } => match ticket.poll() {
                TicketPoll::Pending => Conversation::Requesting { npc, ticket },
                TicketPoll::Ready(messages) => {
                    match ChatSession::start(ticket.npc_name(), messages) {
                        Some(session) => Conversation::Active { npc, session },
                        None => self.finish(world, npc),
                    }
                }
                TicketPoll::Lost => self.finish(world, npc),
            },
            Conversation::Active { npc, mut session } => {
                let still_open = if input.talk_pressed() {
                    session.advance()
                } else {
                    session.tick(dt)
                };
                if still_open {
                    Conversation::Active { npc, session }
                } else {
                    info!(npc = session.npc_name(), "conversation_closed");
                    self.finish(world, npc)
                }
            }
        };
    }

    fn start_talking(&self, world: &mut SceneWorld) -> Conversation {
        let Some(player_position) = self
            .player
            .and_then(|id| world.find_entity(id))
            .map(|player| player.transform.position)
        else {
            return Conversation::Idle;
        };
        let Some(npc) = self.npcs.iter().find(|npc| {
            world.find_entity(npc.id).is_some_and(|entity| {
                entity.transform.position.distance(player_position) <= TALK_RANGE_PX
            })
        }) else {
            info!("no_npc_in_talk_range");
            return Conversation::Idle;
        };

        if let Some(entity) = world.find_entity_mut(npc.id) {
            entity.velocity = Vec2::ZERO;
            if let Some(wander) = entity.wander.as_mut() {
                wander.pause();
            }
        }
        Conversation::Requesting {
            npc: npc.id,
            ticket: self.dispatcher.request(Arc::clone(&npc.source)),
        }
    }

    fn finish(&self, world: &mut SceneWorld, npc: EntityId) -> Conversation {
        match world.find_entity_mut(npc) {
            Some(entity) => {
                if let Some(wander) = entity.wander.as_mut() {
                    wander.resume();
                }
            }
            None => warn!(entity = npc.0, "dialogue_npc_missing"),
        }
        info!(entity = npc.0, "dialogue_ended");
        Conversation::Idle
    }

    fn apply_player_intent(&self, world: &mut SceneWorld, input: &InputSnapshot) {
        let Some(player_id) = self.player else {
            return;
        };
        let conversing = self.is_conversing();
        let camera = *world.camera();
        let (width, height) = input.window_size();
        let Some(player) = world.find_entity_mut(player_id) else {
            return;
        };
        if conversing {
            player.velocity = Vec2::ZERO;
            player.order_state = OrderState::Idle;
            return;
        }

        let mut step = Vec2::ZERO;
        if input.is_down(InputAction::MoveUp) {
            step.y -= PLAYER_STEP_PX;
        }
        if input.is_down(InputAction::MoveDown) {
            step.y += PLAYER_STEP_PX;
        }
        if input.is_down(InputAction::MoveLeft) {
            step.x -= PLAYER_STEP_PX;
        }
        if input.is_down(InputAction::MoveRight) {
            step.x += PLAYER_STEP_PX;
        }

        if step != Vec2::ZERO {
            player.order_state = OrderState::Idle;
            player.transform.position.x += step.x;
            player.transform.position.y += step.y;
            player.velocity = step;
            return;
        }
        player.velocity = Vec2::ZERO;

        if input.left_click_pressed() {
            if let Some(cursor) = input.cursor_position_px() {
                let point = screen_to_world_px(cursor, &camera, Viewport { width, height });
                player.order_state = OrderState::MoveTo { point };
                info!(x = point.x, y = point.y, "move_order_issued");
            }
        }
    }

    fn advance_move_orders(&self, world: &mut SceneWorld) {
        let Some(player) = self.player.and_then(|id| world.find_entity_mut(id)) else {
            return;
        };
        let OrderState::MoveTo { point } = player.order_state else {
            return;
        };
        let step = step_move_order(player.transform.position, point, PLAYER_STEP_PX);
        player.velocity = Vec2::new(
            step.position.x - player.transform.position.x,
            step.position.y - player.transform.position.y,
        );
        player.transform.position = step.position;
        if step.arrived {
            player.order_state = OrderState::Idle;
            player.velocity = Vec2::ZERO;
        }
    }

    fn react_to_contacts(&self, world: &mut SceneWorld) {
        for contact in resolve_static_overlaps(world) {
            if let Some(entity) = world.find_entity_mut(contact.entity) {
                if let Some(wander) = entity.wander.as_mut() {
                    wander.request_redirect();
                }
            }
        }
    }

    fn follow_player(&self, world: &mut SceneWorld, input: &InputSnapshot) {
        let Some(target) = self
            .player
            .and_then(|id| world.find_entity(id))
            .map(|player| player.transform.position)
        else {
            return;
        };
        let scene_size = world.scene_size();
        world
            .camera_mut()
            .follow_clamped(target, scene_size, input.window_size());
    }
}

/// Wander rectangle for an NPC: the walkable extent pulled in from every edge.
pub(crate) fn npc_wander_bounds(walkable: Bounds) -> Bounds {
    walkable.inset(NPC_BOUNDS_INSET)
}
