use super::*;

impl<R: RandomSource> GameSession<R> {
    pub fn power_mode_active(&self) -> bool {
        self.state.vulnerability_timer > 0
    }

    pub(super) fn update_power_mode(&mut self) {
        if self.state.vulnerability_timer == 0 {
            return;
        }
        self.state.vulnerability_timer -= 1;
        if self.state.vulnerability_timer == 0 {
            for adversary in &mut self.adversaries {
                adversary.vulnerable = false;
            }
            self.events.push(GameEvent::PowerModeEnded);
        }
    }

    pub(super) fn collect_items(&mut self) {
        let (col, row) = self.player.actor.tile();
        match self.grid.consume(col, row) {
            Some(Collectible::Pellet) => {
                self.add_score(self.config.scoring.pellet);
                self.events.push(GameEvent::PelletEaten { col, row });
            }
            Some(Collectible::PowerPellet) => {
                self.add_score(self.config.scoring.power_pellet);
                self.events.push(GameEvent::PowerPelletEaten { col, row });
                self.activate_power_mode();
            }
            None => {}
        }
    }

    /// Also used to re-arm an already running window: the timer restarts and
    /// the combo starts over.
    pub(super) fn activate_power_mode(&mut self) {
        let ticks = self.config.power_mode_ticks;
        self.state.vulnerability_timer = ticks;
        self.state.capture_combo = 0;
        if ticks == 0 {
            return;
        }
        for adversary in &mut self.adversaries {
            adversary.vulnerable = true;
            adversary.actor.dir = adversary.actor.dir.reverse();
        }
        self.events.push(GameEvent::PowerModeStarted { ticks });
    }

    pub(super) fn capture_adversary(&mut self, idx: usize) {
        let points = capture_points(self.config.scoring.base_capture, self.state.capture_combo);
        self.add_score(points);
        self.state.capture_combo = self.state.capture_combo.saturating_add(1);

        let adversary = &mut self.adversaries[idx];
        adversary.respawn();
        self.events.push(GameEvent::AdversaryCaptured {
            adversary: idx,
            name: adversary.name.clone(),
            points,
        });
    }

    fn add_score(&mut self, points: u32) {
        self.state.score = self.state.score.saturating_add(points);
    }
}
