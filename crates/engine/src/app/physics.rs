use super::scene::{BodyKind, Bounds, EntityId, SceneWorld, Vec2};

/// A dynamic body that was pushed out of a fixed body this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticContact {
    pub entity: EntityId,
    pub blocker: EntityId,
}

/// Separates every dynamic, non-zero-sized body from the fixed bodies it overlaps.
///
/// Each overlap is resolved along the axis of least penetration and the velocity
/// component on that axis is zeroed. Fixed bodies never move.
pub fn resolve_static_overlaps(world: &mut SceneWorld) -> Vec<StaticContact> {
    let blockers: Vec<(EntityId, Bounds)> = world
        .entities()
        .iter()
        .filter(|entity| entity.body == BodyKind::Fixed && !entity.is_zero_sized())
        .map(|entity| (entity.id, entity.aabb()))
        .collect();
    if blockers.is_empty() {
        return Vec::new();
    }

    let mut contacts = Vec::new();
    for entity in world.entities_mut() {
        if entity.body != BodyKind::Dynamic || entity.is_zero_sized() {
            continue;
        }
        for (blocker_id, blocker) in &blockers {
            let body = entity.aabb();
            let Some(push) = separation(&body, blocker) else {
                continue;
            };
            entity.transform.position.x += push.x;
            entity.transform.position.y += push.y;
            if push.x != 0.0 {
                entity.velocity.x = 0.0;
            }
            if push.y != 0.0 {
                entity.velocity.y = 0.0;
            }
            contacts.push(StaticContact {
                entity: entity.id,
                blocker: *blocker_id,
            });
        }
    }
    contacts
}

fn separation(body: &Bounds, blocker: &Bounds) -> Option<Vec2> {
    if !body.overlaps(blocker) {
        return None;
    }
    let push_left = blocker.min_x - body.max_x;
    let push_right = blocker.max_x - body.min_x;
    let push_up = blocker.min_y - body.max_y;
    let push_down = blocker.max_y - body.min_y;

    let push_x = if push_left.abs() < push_right.abs() {
        push_left
    } else {
        push_right
    };
    let push_y = if push_up.abs() < push_down.abs() {
        push_up
    } else {
        push_down
    };

    if push_x.abs() <= push_y.abs() {
        Some(Vec2::new(push_x, 0.0))
    } else {
        Some(Vec2::new(0.0, push_y))
    }
}
