use thiserror::Error;

/// Reasons a session refuses to start. Raised only at construction; a running
/// session never produces one.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid must be between 1x1 and {max}x{max}, got {width}x{height}")]
    DimensionsOutOfRange {
        width: usize,
        height: usize,
        max: usize,
    },
    #[error("layout has {actual} rows, expected {expected}")]
    RowCountMismatch { expected: usize, actual: usize },
    #[error("layout row {row} has {actual} columns, expected {expected}")]
    RowWidthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown layout symbol {symbol:?} at column {col}, row {row}")]
    UnknownSymbol { col: usize, row: usize, symbol: char },
    #[error("layout defines no player spawn")]
    MissingPlayerSpawn,
    #[error("layout defines more than one player spawn")]
    DuplicatePlayerSpawn,
    #[error("adversary marker {marker} appears more than once")]
    DuplicateAdversarySpawn { marker: usize },
    #[error("adversary {index} has no spawn marker in the layout")]
    MissingAdversarySpawn { index: usize },
    #[error("layout marker {marker} has no matching adversary profile")]
    UnassignedAdversarySpawn { marker: usize },
    #[error("session needs at least one adversary")]
    NoAdversaries,
    #[error("speed {speed} outside (0, {max}]")]
    SpeedOutOfRange { speed: f64, max: f64 },
    #[error("capture distance must be positive, got {0}")]
    InvalidCaptureDistance(f64),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}
