use thiserror::Error;

/// Pipeline-level errors using thiserror for structured error handling.
///
/// These errors represent domain-specific failures that can occur while
/// recognizing, correcting, solving and replaying a layout. They provide
/// context and can be chained with anyhow.

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template image not found: {path}")]
    Missing { path: String },

    #[error("Failed to decode template image: {path}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to enumerate displays")]
    Displays(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("No displays found")]
    NoDisplays,

    #[error("Failed to capture screen")]
    Grab(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to load capture image: {path}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("No detections to infer the pile grid from")]
    NoDetections,

    #[error("Cannot infer {axis} spacing: all {detections} detections share one {axis} coordinate")]
    DegenerateAxis {
        axis: &'static str,
        detections: usize,
    },
}

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Solver emitted an invalid move token: {0:?}")]
    InvalidToken(String),

    #[error("Invalid rank value in grid stream: {0:?}")]
    InvalidRank(String),

    #[error("Grid stream holds {lines} ranks, expected {expected}")]
    GridLength { lines: usize, expected: usize },

    #[error("Move {move_index} takes from pile {pile}, but that pile is already empty")]
    EmptyPile { pile: usize, move_index: usize },
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Failed to launch solver: {path}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write grid to solver stdin")]
    Stdin(#[source] std::io::Error),

    #[error("Solver produced no answer within {0} seconds")]
    Timeout(u64),

    #[error("Failed to collect solver output")]
    Collect(#[source] std::io::Error),

    #[error("Solver failed ({status}): {stderr}")]
    Exit {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("Solver output was not valid UTF-8")]
    OutputEncoding,
}

#[derive(Error, Debug)]
pub enum CorrectionError {
    #[error("Expected `<pile> <row> <rank>` (three integers), got: {0:?}")]
    Malformed(String),

    #[error("Pile index {0} is out of range")]
    PileOutOfRange(i64),

    #[error("Row index {0} is out of range")]
    RowOutOfRange(i64),

    #[error("Rank {0} is out of range (0 = unknown, 1-13 = ace through king)")]
    RankOutOfRange(i64),
}

/// Type alias for pipeline Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
