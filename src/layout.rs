use crate::constants::MAX_GRID_SIDE;
use crate::error::ConfigError;
use crate::grid::TileGrid;
use crate::types::TileKind;

/// Validated static map: the tiles a session reloads on every reset plus the
/// spawn cells of its entities.
#[derive(Clone, Debug)]
pub struct StaticLayout {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<Vec<TileKind>>,
    pub player_spawn: (usize, usize),
    /// Indexed by adversary profile order (marker `1` is index 0).
    pub adversary_spawns: Vec<(usize, usize)>,
}

impl StaticLayout {
    pub fn parse(
        rows: &[String],
        width: usize,
        height: usize,
        adversary_count: usize,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 || width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(ConfigError::DimensionsOutOfRange {
                width,
                height,
                max: MAX_GRID_SIDE,
            });
        }
        if rows.len() != height {
            return Err(ConfigError::RowCountMismatch {
                expected: height,
                actual: rows.len(),
            });
        }
        if adversary_count == 0 {
            return Err(ConfigError::NoAdversaries);
        }

        let mut tiles = Vec::with_capacity(height);
        let mut player_spawn = None;
        let mut markers: Vec<Option<(usize, usize)>> = vec![None; 9];

        for (row_idx, raw) in rows.iter().enumerate() {
            let symbols: Vec<char> = raw.chars().collect();
            if symbols.len() != width {
                return Err(ConfigError::RowWidthMismatch {
                    row: row_idx,
                    expected: width,
                    actual: symbols.len(),
                });
            }
            let mut row = Vec::with_capacity(width);
            for (col_idx, symbol) in symbols.into_iter().enumerate() {
                let tile = match symbol {
                    '#' => TileKind::Wall,
                    '.' => TileKind::Pellet,
                    'o' => TileKind::PowerPellet,
                    ' ' => TileKind::Empty,
                    'P' => {
                        if player_spawn.replace((col_idx, row_idx)).is_some() {
                            return Err(ConfigError::DuplicatePlayerSpawn);
                        }
                        TileKind::Empty
                    }
                    '1'..='9' => {
                        let marker = symbol as usize - '0' as usize;
                        if markers[marker - 1].replace((col_idx, row_idx)).is_some() {
                            return Err(ConfigError::DuplicateAdversarySpawn { marker });
                        }
                        TileKind::Empty
                    }
                    _ => {
                        return Err(ConfigError::UnknownSymbol {
                            col: col_idx,
                            row: row_idx,
                            symbol,
                        })
                    }
                };
                row.push(tile);
            }
            tiles.push(row);
        }

        let player_spawn = player_spawn.ok_or(ConfigError::MissingPlayerSpawn)?;
        if let Some(extra) = markers
            .iter()
            .enumerate()
            .skip(adversary_count)
            .find(|(_, cell)| cell.is_some())
        {
            return Err(ConfigError::UnassignedAdversarySpawn {
                marker: extra.0 + 1,
            });
        }
        let mut adversary_spawns = Vec::with_capacity(adversary_count);
        for index in 0..adversary_count {
            let cell = markers
                .get(index)
                .copied()
                .flatten()
                .ok_or(ConfigError::MissingAdversarySpawn { index })?;
            adversary_spawns.push(cell);
        }

        Ok(Self {
            width,
            height,
            tiles,
            player_spawn,
            adversary_spawns,
        })
    }

    pub fn build_grid(&self) -> TileGrid {
        TileGrid::from_rows(&self.tiles)
    }
}

pub fn tile_center(cell: (usize, usize)) -> (f64, f64) {
    (cell.0 as f64 + 0.5, cell.1 as f64 + 0.5)
}
