//! Two-dimensional cartesian topologies.

use grid_types::Rank;
use tracing::debug;

use crate::communicator::Communicator;
use crate::group::ProcessGroup;
use crate::Error;

/// A communicator whose ranks are laid out on a `rows x cols` grid in
/// row-major order. Ranks are never reordered: rank `r * cols + c` sits at
/// `(r, c)`.
pub struct CartComm {
    comm: Communicator,
    dims: [usize; 2],
    periods: [bool; 2],
    coords: [usize; 2],
}

impl Communicator {
    /// Builds a `dims[0] x dims[1]` grid over the first `dims[0] * dims[1]`
    /// ranks of this group.
    ///
    /// Collective over the whole group. Ranks that do not fit on the grid are
    /// moved into a separate group that nobody talks to, and get `None`.
    pub async fn cartesian(
        &self,
        dims: [usize; 2],
        periods: [bool; 2],
    ) -> Result<Option<CartComm>, Error> {
        let [rows, cols] = dims;
        let cells = rows * cols;
        let size = self.size();
        if cells == 0 || cells > size {
            return Err(Error::GridTooLarge { rows, cols, size });
        }

        let on_grid = self.rank() < cells;
        let color = if on_grid { 0 } else { 1 };
        let Some(comm) = self.split(Some(color), self.rank() as u32).await? else {
            return Ok(None);
        };

        if !on_grid {
            debug!(rank = self.rank(), cells, "left off the grid");
            comm.free();
            return Ok(None);
        }

        let rank = comm.rank();
        Ok(Some(CartComm {
            comm,
            dims,
            periods,
            coords: [rank / cols, rank % cols],
        }))
    }
}

impl CartComm {
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    pub fn periods(&self) -> [bool; 2] {
        self.periods
    }

    /// Coordinates of the calling rank.
    pub fn coords(&self) -> [usize; 2] {
        self.coords
    }

    pub fn coords_of(&self, rank: Rank) -> Result<[usize; 2], Error> {
        let size = self.comm.size();
        if rank >= size {
            return Err(Error::RankOutOfRange { rank, size });
        }
        Ok([rank / self.dims[1], rank % self.dims[1]])
    }

    pub fn rank_of(&self, coords: [usize; 2]) -> Result<Rank, Error> {
        let [row, col] = coords;
        if row >= self.dims[0] || col >= self.dims[1] {
            return Err(Error::CoordsOutOfRange(row, col));
        }
        Ok(row * self.dims[1] + col)
    }

    /// The grid as a plain group.
    pub fn comm(&self) -> &Communicator {
        &self.comm
    }

    /// Slices the grid into subgroups that keep the dimensions marked in
    /// `remain` and fix the others.
    ///
    /// `[false, true]` gives the calling rank's row, ranked by column;
    /// `[true, false]` gives its column, ranked by row.
    pub async fn sub(&self, remain: [bool; 2]) -> Result<Communicator, Error> {
        let mut color = 0;
        for dim in 0..2 {
            if !remain[dim] {
                color = color * self.dims[dim] + self.coords[dim];
            }
        }

        let rank = self.comm.rank();
        self.comm
            .split(Some(color as u32), rank as u32)
            .await?
            .ok_or(Error::RankOutOfRange {
                rank,
                size: self.comm.size(),
            })
    }

    pub fn free(self) {
        self.comm.free();
    }
}
