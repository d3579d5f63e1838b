use crate::types::Direction;

pub(super) fn offset(col: i32, row: i32, dir: Direction) -> (i32, i32) {
    let (dx, dy) = dir.vector();
    (col + dx, row + dy)
}

pub(super) fn center_of(col: i32, row: i32) -> (f64, f64) {
    (col as f64 + 0.5, row as f64 + 0.5)
}

pub(super) fn capture_points(base: u32, combo: u32) -> u32 {
    base.saturating_mul(2u32.saturating_pow(combo))
}
