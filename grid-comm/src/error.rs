//! Error types for grid-comm operations.

use grid_types::{PayloadMismatch, Rank, Tag};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("rank {rank} out of range for group of size {size}")]
    RankOutOfRange { rank: Rank, size: usize },

    #[error("endpoint of world rank {0} is disconnected")]
    Disconnected(Rank),

    #[error("world aborted while waiting for tag {tag} from world rank {from}")]
    Aborted { from: Rank, tag: Tag },

    #[error("broadcast root {0} supplied no payload")]
    MissingRootPayload(Rank),

    #[error("malformed payload: {0}")]
    Payload(#[from] PayloadMismatch),

    #[error("malformed split record from rank {0}")]
    MalformedSplit(Rank),

    #[error("grid of {rows}x{cols} does not fit in {size} ranks")]
    GridTooLarge { rows: usize, cols: usize, size: usize },

    #[error("coordinates ({0}, {1}) outside the grid")]
    CoordsOutOfRange(usize, usize),

    #[error("world rank {rank} panicked")]
    RankPanicked { rank: Rank },

    #[error("world must contain at least one rank")]
    EmptyWorld,
}
