use super::*;

impl<R: RandomSource> GameSession<R> {
    /// Checks every adversary against the player in roster order. A lethal
    /// contact ends the session immediately; later adversaries are skipped.
    pub(super) fn resolve_collisions(&mut self) {
        for idx in 0..self.adversaries.len() {
            let dist = self.adversaries[idx]
                .actor
                .distance_to(&self.player.actor);
            if dist >= self.config.capture_distance {
                continue;
            }
            if self.adversaries[idx].vulnerable {
                self.capture_adversary(idx);
                continue;
            }
            self.events.push(GameEvent::PlayerCaught {
                adversary: idx,
                name: self.adversaries[idx].name.clone(),
            });
            self.finish(Lifecycle::Lost);
            return;
        }
    }
}
