use super::*;

/// Picks a new heading for an adversary standing at a decision point.
///
/// Reversing is excluded unless the tile is a dead end, in which case the
/// reverse is forced if open; a fully boxed-in adversary keeps its heading and
/// retries next tick.
pub(super) fn choose_direction<R: RandomSource>(
    grid: &TileGrid,
    tile: (i32, i32),
    current: Direction,
    behavior: AdversaryBehavior,
    vulnerable: bool,
    target: (f64, f64),
    rng: &mut R,
) -> Direction {
    let back = current.reverse();
    let candidates: Vec<Direction> = Direction::CARDINALS
        .into_iter()
        .filter(|dir| *dir != back)
        .filter(|dir| {
            let (nx, ny) = offset(tile.0, tile.1, *dir);
            grid.can_move_to(nx, ny)
        })
        .collect();

    if candidates.is_empty() {
        let (bx, by) = offset(tile.0, tile.1, back);
        if back != Direction::None && grid.can_move_to(bx, by) {
            return back;
        }
        return current;
    }

    if vulnerable {
        return candidates[rng.pick_index(candidates.len())];
    }

    match behavior {
        AdversaryBehavior::Pursuit => {
            if rng.bool(PURSUIT_CHANCE) {
                nearest_to_target(&candidates, tile, target)
            } else {
                candidates[rng.pick_index(candidates.len())]
            }
        }
        AdversaryBehavior::Ambush | AdversaryBehavior::Erratic => {
            candidates[rng.pick_index(candidates.len())]
        }
    }
}

fn nearest_to_target(candidates: &[Direction], tile: (i32, i32), target: (f64, f64)) -> Direction {
    let mut best = candidates[0];
    let mut best_dist = f64::INFINITY;
    for dir in candidates {
        let (nx, ny) = offset(tile.0, tile.1, *dir);
        let (cx, cy) = center_of(nx, ny);
        let dist = (cx - target.0).hypot(cy - target.1);
        if dist < best_dist {
            best_dist = dist;
            best = *dir;
        }
    }
    best
}
