use super::*;

/// Returns the enclosing tile when the actor is close enough to its center to
/// change heading this tick.
pub(super) fn decision_tile(actor: &Actor, speed: f64) -> Option<(i32, i32)> {
    let (tx, ty) = actor.tile();
    let (cx, cy) = center_of(tx, ty);
    let dist = (actor.x - cx).hypot(actor.y - cy);
    (dist < speed * DECISION_WINDOW_FACTOR).then_some((tx, ty))
}

pub(super) fn turn_player(
    grid: &TileGrid,
    actor: &mut Actor,
    queued: &mut Direction,
    tile: (i32, i32),
) {
    if *queued == Direction::None || *queued == actor.dir {
        return;
    }
    let (nx, ny) = offset(tile.0, tile.1, *queued);
    if grid.can_move_to(nx, ny) {
        let (cx, cy) = center_of(tile.0, tile.1);
        actor.place(cx, cy, *queued);
        *queued = Direction::None;
    }
}

pub(super) fn apply_movement(grid: &TileGrid, actor: &mut Actor, speed: f64) {
    let (tx, ty) = actor.tile();
    let (cx, cy) = center_of(tx, ty);
    let (dx, dy) = actor.dir.vector();
    let (dx, dy) = (dx as f64, dy as f64);

    let next_x = actor.x + dx * speed;
    let next_y = actor.y + dy * speed;
    let probe_col = (next_x + dx * LOOKAHEAD).floor() as i32;
    let probe_row = (next_y + dy * LOOKAHEAD).floor() as i32;

    if grid.can_move_to(probe_col, probe_row) {
        actor.x = next_x;
        actor.y = next_y;
    } else if (actor.x - cx).abs() < CENTER_SNAP_TOLERANCE
        && (actor.y - cy).abs() < CENTER_SNAP_TOLERANCE
    {
        actor.x = cx;
        actor.y = cy;
    }
    wrap_horizontal(actor, grid.width());
}

pub(super) fn wrap_horizontal(actor: &mut Actor, width: usize) {
    let width = width as f64;
    if actor.x < 0.0 {
        actor.x = width - 0.5;
    }
    if actor.x >= width {
        actor.x = 0.5;
    }
}

impl<R: RandomSource> GameSession<R> {
    pub(super) fn move_player(&mut self) {
        let speed = self.player.actor.speed();
        if let Some(tile) = decision_tile(&self.player.actor, speed) {
            turn_player(
                &self.grid,
                &mut self.player.actor,
                &mut self.player.queued,
                tile,
            );
        }
        apply_movement(&self.grid, &mut self.player.actor, speed);
    }

    pub(super) fn move_adversaries(&mut self) {
        let target = (self.player.actor.x, self.player.actor.y);
        for idx in 0..self.adversaries.len() {
            let speed = self.adversary_speed(idx);
            let adversary = &mut self.adversaries[idx];
            if let Some(tile) = decision_tile(&adversary.actor, speed) {
                let (ax, ay) = offset(tile.0, tile.1, adversary.actor.dir);
                if !self.grid.can_move_to(ax, ay) || self.rng.bool(REDECIDE_CHANCE) {
                    let (cx, cy) = center_of(tile.0, tile.1);
                    adversary.actor.x = cx;
                    adversary.actor.y = cy;
                    adversary.actor.dir = choose_direction(
                        &self.grid,
                        tile,
                        adversary.actor.dir,
                        adversary.behavior,
                        adversary.vulnerable,
                        target,
                        &mut self.rng,
                    );
                }
            }
            apply_movement(&self.grid, &mut adversary.actor, speed);
        }
    }

    pub(super) fn adversary_speed(&self, idx: usize) -> f64 {
        let adversary = &self.adversaries[idx];
        if adversary.vulnerable {
            adversary.actor.speed() * self.config.vulnerable_speed_factor
        } else {
            adversary.actor.speed()
        }
    }
}
