use crate::types::{Collectible, TileKind};

#[derive(Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
}

impl TileGrid {
    pub fn from_rows(rows: &[Vec<TileKind>]) -> Self {
        let height = rows.len();
        let width = rows.first().map(|row| row.len()).unwrap_or(0);
        let tiles = rows.iter().flat_map(|row| row.iter().copied()).collect();
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Rows outside the grid read as walls; columns outside read as open
    /// floor so the side tunnels stay passable.
    pub fn tile_at(&self, col: i32, row: i32) -> TileKind {
        match self.index_of(col, row) {
            Some(idx) => self.tiles[idx],
            None if row < 0 || row >= self.height as i32 => TileKind::Wall,
            None => TileKind::Empty,
        }
    }

    pub fn can_move_to(&self, col: i32, row: i32) -> bool {
        self.tile_at(col, row) != TileKind::Wall
    }

    pub fn consume(&mut self, col: i32, row: i32) -> Option<Collectible> {
        let idx = self.index_of(col, row)?;
        let consumed = match self.tiles[idx] {
            TileKind::Pellet => Collectible::Pellet,
            TileKind::PowerPellet => Collectible::PowerPellet,
            TileKind::Wall | TileKind::Empty => return None,
        };
        self.tiles[idx] = TileKind::Empty;
        Some(consumed)
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.tiles
            .iter()
            .filter(|tile| matches!(tile, TileKind::Pellet | TileKind::PowerPellet))
            .count()
    }

    pub fn rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width.max(1))
            .map(|row| row.iter().map(|tile| tile.symbol()).collect())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, col: i32, row: i32, kind: TileKind) {
        if let Some(idx) = self.index_of(col, row) {
            self.tiles[idx] = kind;
        }
    }

    fn index_of(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 || col >= self.width as i32 || row >= self.height as i32 {
            return None;
        }
        Some(row as usize * self.width + col as usize)
    }
}
